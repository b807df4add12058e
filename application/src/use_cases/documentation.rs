//! The bounded documentation review loop.
//!
//! draft -> approval vote -> feedback -> revise, at most
//! `max_revision_rounds` revisions (so `R + 1` draft attempts). Approval
//! votes run over the full council at a fixed 0.5 threshold with
//! abstain-counts-as-no; feedback is gathered only from members who did not
//! vote YES. Every draft, review packet, and the final artifact (approved
//! or not) is persisted.

use super::fan_out::{FanOutCall, call_text, collect_json};
use super::run_session::types::{ProtocolTracker, SessionError};
use crate::ports::{CompletionOptions, CouncilModels, SessionStore, StoreError};
use crate::sequencer::EventSequencer;
use council_domain::{
    Ballot, CouncilConfig, CouncilPrompt, DocumentationOutcome, EventType, Governance, Member,
    PhaseResult, PhaseState, ReviewFeedback, VoteResponse, VoteTally, protocol::normalize,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Governance for documentation approval votes: fixed, independent of any
/// phase's motion governance.
fn approval_governance() -> Governance {
    Governance {
        require_seconding: false,
        majority_threshold: 0.5,
        abstain_counts_as_no: true,
    }
}

pub struct DocumentationLoop<'a> {
    pub config: &'a CouncilConfig,
    pub leader: &'a Member,
    pub models: &'a Arc<dyn CouncilModels>,
    pub cancel: &'a CancellationToken,
}

impl<'a> DocumentationLoop<'a> {
    fn options_for(member: &Member) -> CompletionOptions {
        CompletionOptions {
            temperature: member.model.temperature,
            max_tokens: member.model.max_tokens,
        }
    }

    pub async fn run(
        &self,
        human_prompt: &str,
        final_resolution: &str,
        phase_results: &[PhaseResult],
        sequencer: &mut EventSequencer,
        store: &Arc<dyn SessionStore>,
        tracker: &mut ProtocolTracker,
    ) -> Result<DocumentationOutcome, SessionError> {
        let max_revisions = self.config.output.max_revision_rounds;
        let attempts = max_revisions + 1;

        let leader_system = CouncilPrompt::member_system(self.config, self.leader);
        let mut draft = call_text(
            self.models.client_for(self.leader),
            &leader_system,
            &CouncilPrompt::documentation_draft(human_prompt, final_resolution, phase_results),
            &Self::options_for(self.leader),
            self.cancel,
        )
        .await?;

        let mut last_feedback: Vec<ReviewFeedback> = Vec::new();

        for revision in 1..=attempts {
            let artifact = format!("documentation.draft.v{}.md", revision);
            store.write_artifact(&artifact, &draft)?;
            sequencer.emit(
                if revision == 1 {
                    EventType::DocumentDraftWritten
                } else {
                    EventType::DocumentRevisionWritten
                },
                Some(&self.leader.id),
                json!({"revision": revision, "artifact": artifact}),
            )?;

            let (tally, votes) = self.approval_vote(&draft, revision, sequencer, tracker).await?;

            if tally.passed {
                store.write_artifact("documentation.md", &draft)?;
                sequencer.emit(
                    EventType::DocumentApproved,
                    None,
                    json!({"revision": revision, "artifact": "documentation.md"}),
                )?;
                info!(revision, "documentation approved");
                return Ok(DocumentationOutcome {
                    approved: true,
                    final_version: revision,
                    unresolved_blockers: Vec::new(),
                });
            }

            if revision == attempts {
                break;
            }

            last_feedback = self.gather_feedback(&draft, &votes, tracker).await?;
            let feedback_json = serde_json::to_string_pretty(&last_feedback)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            store.write_artifact(&format!("documentation.review.v{}.json", revision), &feedback_json)?;

            draft = call_text(
                self.models.client_for(self.leader),
                &leader_system,
                &CouncilPrompt::documentation_revision(&draft, &feedback_json),
                &Self::options_for(self.leader),
                self.cancel,
            )
            .await?;
        }

        // Revision budget exhausted without approval.
        let unresolved: Vec<_> = last_feedback
            .iter()
            .flat_map(|f| f.critical_blockers.iter().cloned())
            .collect();
        store.write_artifact("documentation.unapproved.md", &draft)?;
        store.write_artifact(
            "documentation.unresolved-blockers.json",
            &serde_json::to_string_pretty(&unresolved)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
        )?;
        sequencer.emit(
            EventType::DocumentRejected,
            None,
            json!({
                "attempts": attempts,
                "unresolvedBlockers": unresolved.len(),
            }),
        )?;
        info!(attempts, "documentation rejected after exhausting revisions");

        Ok(DocumentationOutcome {
            approved: false,
            final_version: attempts,
            unresolved_blockers: unresolved,
        })
    }

    /// Blind approval vote over the full council.
    async fn approval_vote(
        &self,
        draft: &str,
        revision: u32,
        sequencer: &mut EventSequencer,
        tracker: &mut ProtocolTracker,
    ) -> Result<(VoteTally, Vec<(&'a Member, VoteResponse)>), SessionError> {
        let order = self.config.speaking_order();

        sequencer.set_phase_state(PhaseState::Voting);
        sequencer.emit(
            EventType::DocumentApprovalVoteCalled,
            None,
            json!({"revision": revision}),
        )?;

        let user = CouncilPrompt::documentation_approval(draft, revision);
        let calls = order
            .iter()
            .map(|member| FanOutCall {
                member_id: member.id.clone(),
                client: self.models.client_for(member),
                system: CouncilPrompt::member_system(self.config, member),
                user: user.clone(),
                opts: Self::options_for(member),
            })
            .collect();

        let outcomes = collect_json(calls, self.cancel).await?;

        let mut votes: Vec<(&Member, VoteResponse)> = Vec::with_capacity(order.len());
        let mut ballots: Vec<Ballot> = Vec::with_capacity(order.len());
        for (&member, outcome) in order.iter().zip(&outcomes) {
            tracker.note_outcome(&member.id, outcome);
            let vote = normalize::vote(outcome);
            ballots.push(vote.ballot);
            sequencer.emit(
                EventType::VoteCast,
                Some(&member.id),
                json!({
                    "vote": "documentation_approval",
                    "revision": revision,
                    "ballot": vote.ballot.as_str(),
                    "rationale": vote.rationale,
                }),
            )?;
            votes.push((member, vote));
        }

        let tally = VoteTally::count(&ballots, &approval_governance(), self.config.council_size());
        sequencer.emit(
            EventType::DocumentApprovalVoteResult,
            None,
            json!({
                "revision": revision,
                "passed": tally.passed,
                "yesVotes": tally.yes_votes,
                "noVotesEffective": tally.no_votes_effective,
                "totalCouncilSize": tally.total_council_size,
            }),
        )?;

        Ok((tally, votes))
    }

    /// Collect structured feedback from every member that did not vote YES.
    async fn gather_feedback(
        &self,
        draft: &str,
        votes: &[(&'a Member, VoteResponse)],
        tracker: &mut ProtocolTracker,
    ) -> Result<Vec<ReviewFeedback>, SessionError> {
        let reviewers: Vec<&(&Member, VoteResponse)> = votes
            .iter()
            .filter(|(_, vote)| vote.ballot != Ballot::Yes)
            .collect();

        let calls = reviewers
            .iter()
            .map(|(member, vote)| FanOutCall {
                member_id: member.id.clone(),
                client: self.models.client_for(member),
                system: CouncilPrompt::member_system(self.config, member),
                user: CouncilPrompt::documentation_feedback(draft, &vote.rationale),
                opts: Self::options_for(member),
            })
            .collect();

        let outcomes = collect_json(calls, self.cancel).await?;

        Ok(reviewers
            .iter()
            .zip(&outcomes)
            .map(|((member, _), outcome)| {
                tracker.note_outcome(&member.id, outcome);
                ReviewFeedback::from_outcome(&member.id, outcome)
            })
            .collect())
    }
}
