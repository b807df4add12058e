//! Leader election for the RunSession use case.
//!
//! One ballot per member, collected in parallel and joined before any
//! ballot event is emitted. The tally is deterministic: highest count wins,
//! ties break on lexicographic ascending member id.

use super::RunSessionUseCase;
use super::types::{ProtocolTracker, SessionError};
use crate::sequencer::EventSequencer;
use crate::use_cases::fan_out::{FanOutCall, collect_json};
use council_domain::{CouncilPrompt, EventType, protocol::normalize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

impl RunSessionUseCase {
    /// Fan out the election prompt, tally, and emit the ballot and result
    /// events. Returns the elected leader's id.
    pub(super) async fn elect_leader(
        &self,
        human_prompt: &str,
        sequencer: &mut EventSequencer,
        tracker: &mut ProtocolTracker,
    ) -> Result<String, SessionError> {
        let members = &self.config.members;
        let user = CouncilPrompt::leader_election(&self.config, human_prompt);

        let calls = members
            .iter()
            .map(|member| FanOutCall {
                member_id: member.id.clone(),
                client: self.models.client_for(member),
                system: CouncilPrompt::member_system(&self.config, member),
                user: user.clone(),
                opts: Self::options_for(member),
            })
            .collect();

        let outcomes = collect_json(calls, &self.cancel).await?;

        // Emit ballots in declaration order, counting as we go.
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for (member, outcome) in members.iter().zip(&outcomes) {
            tracker.note_outcome(&member.id, outcome);
            let ballot = normalize::leader_ballot(outcome, members);
            *counts.entry(ballot.candidate_id.clone()).or_insert(0) += 1;
            sequencer.emit(
                EventType::LeaderElectionBallot,
                Some(&member.id),
                json!({
                    "candidateId": ballot.candidate_id,
                    "rationale": ballot.rationale,
                }),
            )?;
        }

        // BTreeMap iterates candidate ids ascending, so a strict `>` keeps
        // the lexicographically smallest id on ties.
        let mut leader_id = members[0].id.clone();
        let mut best = 0usize;
        for (candidate, count) in &counts {
            if *count > best {
                best = *count;
                leader_id = candidate.clone();
            }
        }

        sequencer.emit(
            EventType::LeaderElected,
            Some(&leader_id),
            json!({"leaderId": leader_id, "tally": counts}),
        )?;
        info!(leader_id = %leader_id, "leader elected");

        Ok(leader_id)
    }
}
