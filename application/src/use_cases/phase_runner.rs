//! Phase execution: the per-round, per-member turn loop and the motion
//! sub-state-machine.
//!
//! Turns are strictly sequential — a member's action is logged before the
//! next member's prompt is built, so every speaker sees the updated
//! discussion. The only concurrency is inside a motion: seconding responses
//! (all non-callers) and ballots (the full council) fan out in parallel and
//! are fully collected before any of them is emitted. Ballot events are
//! emitted in turn order, never arrival order.

use super::fan_out::{FanOutCall, call_json, collect_json};
use super::run_session::types::{ProtocolTracker, SessionError, TranscriptWindow};
use crate::ports::{CompletionOptions, CouncilModels, IdGenerator};
use crate::sequencer::EventSequencer;
use council_domain::{
    Ballot, CouncilConfig, CouncilPrompt, EventType, Member, Motion, PhaseContextPacket, PhaseEnd,
    PhaseResult, PhaseSpec, PhaseState, TurnAction, VoteTally, protocol::normalize,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Runs one phase to completion.
pub struct PhaseRunner<'a> {
    pub config: &'a CouncilConfig,
    pub phase: &'a PhaseSpec,
    pub models: &'a Arc<dyn CouncilModels>,
    pub ids: &'a Arc<dyn IdGenerator>,
    pub cancel: &'a CancellationToken,
    pub human_prompt: &'a str,
    /// Prompt-context snapshots read at session start, keyed by member id.
    pub memory_snapshots: &'a HashMap<String, String>,
}

/// How a motion resolved, from the phase's perspective.
enum MotionOutcome {
    /// The motion passed and the phase closes.
    ClosesPhase(Motion),
    /// Discussion resumes with the next speaker.
    Continues,
}

impl<'a> PhaseRunner<'a> {
    fn options_for(member: &Member) -> CompletionOptions {
        CompletionOptions {
            temperature: member.model.temperature,
            max_tokens: member.model.max_tokens,
        }
    }

    fn phase_context(&self, round: u32) -> String {
        PhaseContextPacket::new(self.phase, &self.config.phases, round)
            .render(self.config.session.phase_context_verbosity)
    }

    /// Execute the round loop. Returns when a motion passes (and the phase
    /// closes on majority votes) or when the round limit is exhausted.
    pub async fn run(
        &self,
        sequencer: &mut EventSequencer,
        window: &mut TranscriptWindow,
        tracker: &mut ProtocolTracker,
    ) -> Result<PhaseResult, SessionError> {
        let order = self.config.speaking_order();
        let max_rounds = self.phase.stop_conditions.max_rounds;

        info!(phase_id = %self.phase.id, max_rounds, "phase started");

        for round in 1..=max_rounds {
            sequencer.set_round(round);
            sequencer.set_phase_state(PhaseState::Discussion);
            sequencer.emit(
                EventType::RoundStarted,
                None,
                json!({"phaseId": self.phase.id, "round": round}),
            )?;

            for &speaker in &order {
                let turn_index = sequencer.next_turn();
                sequencer.set_phase_state(PhaseState::Discussion);

                let action = self.take_turn(speaker, round, max_rounds, window, tracker).await?;
                sequencer.emit(
                    EventType::TurnAction,
                    Some(&speaker.id),
                    json!({"action": action.kind()}),
                )?;

                match action {
                    TurnAction::Contribute { message } => {
                        sequencer.emit(
                            EventType::MessageContributed,
                            Some(&speaker.id),
                            json!({"message": message}),
                        )?;
                        window.push(format!("{}: {}", speaker.name, message));
                        tracker.note_contribution(&speaker.id, &message);
                    }
                    TurnAction::Pass { reason, note } => {
                        sequencer.emit(
                            EventType::PassRecorded,
                            Some(&speaker.id),
                            json!({"reason": reason, "note": note}),
                        )?;
                    }
                    TurnAction::CallVote {
                        title,
                        text,
                        decision_if_pass,
                    } => {
                        let motion = Motion {
                            motion_id: self.ids.motion_id(),
                            title,
                            text,
                            decision_if_pass,
                            proposer: speaker.id.clone(),
                            round,
                            turn_index,
                        };
                        sequencer.emit(
                            EventType::MotionCalled,
                            Some(&speaker.id),
                            serde_json::to_value(&motion)
                                .unwrap_or_else(|_| json!({"motionId": motion.motion_id})),
                        )?;
                        window.push(format!(
                            "{} moves \"{}\": {}",
                            speaker.name, motion.title, motion.text
                        ));

                        let outcome = self
                            .run_motion(&motion, &order, sequencer, window, tracker)
                            .await?;

                        if let MotionOutcome::ClosesPhase(winning) = outcome {
                            sequencer.emit(
                                EventType::PhaseCompleted,
                                None,
                                json!({
                                    "endedBy": PhaseEnd::MajorityVote.as_str(),
                                    "finalResolution": winning.decision_if_pass,
                                }),
                            )?;
                            return Ok(PhaseResult {
                                phase_id: self.phase.id.clone(),
                                phase_goal: self.phase.goal.clone(),
                                ended_by: PhaseEnd::MajorityVote,
                                final_resolution: winning.decision_if_pass.clone(),
                                winning_motion: Some(winning),
                                rounds_completed: round,
                            });
                        }
                    }
                }
            }
        }

        // Round limit exhausted; the phase fallback resolution applies.
        let fallback = &self.phase.fallback;
        sequencer.set_phase_state(PhaseState::Discussion);
        sequencer.emit(
            EventType::RoundLimitReached,
            None,
            json!({
                "phaseId": self.phase.id,
                "maxRounds": max_rounds,
                "fallback": fallback,
            }),
        )?;
        sequencer.emit(
            EventType::PhaseCompleted,
            None,
            json!({
                "endedBy": PhaseEnd::RoundLimit.as_str(),
                "finalResolution": fallback.resolution,
            }),
        )?;

        Ok(PhaseResult {
            phase_id: self.phase.id.clone(),
            phase_goal: self.phase.goal.clone(),
            ended_by: PhaseEnd::RoundLimit,
            final_resolution: fallback.resolution.clone(),
            winning_motion: None,
            rounds_completed: max_rounds,
        })
    }

    /// Build the speaker's turn prompt, call its model, and normalize.
    async fn take_turn(
        &self,
        speaker: &Member,
        round: u32,
        max_rounds: u32,
        window: &TranscriptWindow,
        tracker: &mut ProtocolTracker,
    ) -> Result<TurnAction, SessionError> {
        let memory_context = if self.phase.memory_policy.read_member_memory {
            self.memory_snapshots
                .get(&speaker.id)
                .cloned()
                .unwrap_or_default()
        } else {
            String::new()
        };

        let system = CouncilPrompt::member_system(self.config, speaker);
        let user = CouncilPrompt::turn(
            self.human_prompt,
            &self.phase_context(round),
            &self.phase.prompt_guidance,
            max_rounds - round + 1,
            &window.window(),
            &memory_context,
        );

        let outcome = call_json(
            self.models.client_for(speaker),
            &system,
            &user,
            &Self::options_for(speaker),
            self.cancel,
        )
        .await?;
        tracker.note_outcome(&speaker.id, &outcome);

        let action = normalize::turn_action(&outcome);
        debug!(member_id = %speaker.id, action = action.kind(), "turn action");
        Ok(action)
    }

    /// The motion sub-machine: seconding (when governance requires it),
    /// blind voting, tally.
    async fn run_motion(
        &self,
        motion: &Motion,
        order: &[&'a Member],
        sequencer: &mut EventSequencer,
        window: &mut TranscriptWindow,
        tracker: &mut ProtocolTracker,
    ) -> Result<MotionOutcome, SessionError> {
        let proposer_name = self
            .config
            .member(&motion.proposer)
            .map(|m| m.name.as_str())
            .unwrap_or(motion.proposer.as_str());

        if self.phase.governance.require_seconding {
            sequencer.set_phase_state(PhaseState::Seconding);

            let non_callers: Vec<&Member> = order
                .iter()
                .copied()
                .filter(|m| m.id != motion.proposer)
                .collect();

            let phase_context = self.phase_context(motion.round);
            let calls = non_callers
                .iter()
                .map(|member| FanOutCall {
                    member_id: member.id.clone(),
                    client: self.models.client_for(member),
                    system: CouncilPrompt::member_system(self.config, member),
                    user: CouncilPrompt::seconding(motion, proposer_name, &phase_context),
                    opts: Self::options_for(member),
                })
                .collect();

            let outcomes = collect_json(calls, self.cancel).await?;

            // All collected; emit in non-caller turn order and pick the
            // first willing seconder in that same order.
            let mut seconder: Option<&Member> = None;
            for (&member, outcome) in non_callers.iter().zip(&outcomes) {
                tracker.note_outcome(&member.id, outcome);
                let response = normalize::seconding(outcome);
                sequencer.emit(
                    EventType::SecondingResponse,
                    Some(&member.id),
                    json!({
                        "motionId": motion.motion_id,
                        "second": response.second,
                        "rationale": response.rationale,
                    }),
                )?;
                if seconder.is_none() && response.second {
                    seconder = Some(member);
                }
            }

            let Some(seconder) = seconder else {
                sequencer.emit(
                    EventType::MotionNotSeconded,
                    None,
                    json!({"motionId": motion.motion_id}),
                )?;
                window.push(format!(
                    "Motion \"{}\" found no seconder and dies.",
                    motion.title
                ));
                sequencer.set_phase_state(PhaseState::Discussion);
                return Ok(MotionOutcome::Continues);
            };

            sequencer.emit(
                EventType::MotionSeconded,
                Some(&seconder.id),
                json!({"motionId": motion.motion_id}),
            )?;
            window.push(format!("{} seconds \"{}\".", seconder.name, motion.title));
        }

        // Blind vote: every member (including the caller) votes in
        // parallel; nothing is emitted until all ballots are in.
        sequencer.set_phase_state(PhaseState::Voting);

        let phase_context = self.phase_context(motion.round);
        let calls = order
            .iter()
            .map(|member| FanOutCall {
                member_id: member.id.clone(),
                client: self.models.client_for(member),
                system: CouncilPrompt::member_system(self.config, member),
                user: CouncilPrompt::vote(motion, proposer_name, &phase_context),
                opts: Self::options_for(member),
            })
            .collect();

        let outcomes = collect_json(calls, self.cancel).await?;

        let mut ballots: Vec<Ballot> = Vec::with_capacity(outcomes.len());
        for (&member, outcome) in order.iter().zip(&outcomes) {
            tracker.note_outcome(&member.id, outcome);
            let vote = normalize::vote(outcome);
            ballots.push(vote.ballot);
            sequencer.emit(
                EventType::VoteCast,
                Some(&member.id),
                json!({
                    "motionId": motion.motion_id,
                    "ballot": vote.ballot.as_str(),
                    "rationale": vote.rationale,
                }),
            )?;
        }

        let tally = VoteTally::count(&ballots, &self.phase.governance, self.config.council_size());
        sequencer.emit(
            EventType::VoteResult,
            None,
            json!({
                "motionId": motion.motion_id,
                "passed": tally.passed,
                "yesVotes": tally.yes_votes,
                "noVotesEffective": tally.no_votes_effective,
                "totalCouncilSize": tally.total_council_size,
                "majorityThreshold": tally.majority_threshold,
            }),
        )?;
        window.push(format!(
            "Vote on \"{}\": {} ({}).",
            motion.title,
            if tally.passed { "passed" } else { "failed" },
            tally.summary(),
        ));
        info!(
            motion_id = %motion.motion_id,
            passed = tally.passed,
            summary = %tally.summary(),
            "vote result"
        );

        if tally.passed && self.phase.stop_conditions.end_on_majority_vote {
            return Ok(MotionOutcome::ClosesPhase(motion.clone()));
        }

        sequencer.set_phase_state(PhaseState::Discussion);
        Ok(MotionOutcome::Continues)
    }
}
