//! Leader summary and execution handoff for the RunSession use case.

use super::RunSessionUseCase;
use super::types::{ProtocolTracker, SessionError, TranscriptWindow};
use crate::ports::SessionStore;
use crate::sequencer::EventSequencer;
use crate::use_cases::fan_out::call_json;
use council_domain::{
    CouncilPrompt, EventType, ExecutionHandoff, LeaderSummary, Member, PhaseResult,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

impl RunSessionUseCase {
    /// Ask the leader for the structured closing statement; synthesize the
    /// fallback when it cannot be parsed.
    pub(super) async fn build_leader_summary(
        &self,
        leader: &Member,
        human_prompt: &str,
        phase_results: &[PhaseResult],
        window: &TranscriptWindow,
        sequencer: &mut EventSequencer,
        store: &Arc<dyn SessionStore>,
        tracker: &mut ProtocolTracker,
    ) -> Result<LeaderSummary, SessionError> {
        let final_resolution = phase_results
            .last()
            .map(|r| r.final_resolution.clone())
            .unwrap_or_default();

        let system = CouncilPrompt::member_system(&self.config, leader);
        let user = CouncilPrompt::leader_summary(human_prompt, phase_results, &window.window());

        let outcome = call_json(
            self.models.client_for(leader),
            &system,
            &user,
            &Self::options_for(leader),
            &self.cancel,
        )
        .await?;
        tracker.note_outcome(&leader.id, &outcome);

        let summary = LeaderSummary::from_outcome(&outcome, &final_resolution);
        sequencer.emit(
            EventType::LeaderSummaryCreated,
            Some(&leader.id),
            serde_json::to_value(&summary).unwrap_or_else(|_| json!({})),
        )?;
        store.append_transcript(&format!("{}\n", summary.summary_markdown))?;
        store.write_artifact("leader-summary.md", &summary.summary_markdown)?;

        Ok(summary)
    }

    /// Write the execution-handoff descriptor when the leader declared the
    /// outcome executable. The approval bit is gated by config + the
    /// operator's flag; the engine never executes anything itself.
    pub(super) fn write_execution_handoff(
        &self,
        summary: &LeaderSummary,
        leader_id: &str,
        phase_results: &[PhaseResult],
        approve_execution: bool,
        sequencer: &mut EventSequencer,
        store: &Arc<dyn SessionStore>,
    ) -> Result<Option<ExecutionHandoff>, SessionError> {
        let Some(brief) = summary.execution_brief.as_ref() else {
            if summary.requires_execution {
                warn!("leader declared execution required but provided no brief; skipping handoff");
            }
            return Ok(None);
        };
        if !summary.requires_execution {
            return Ok(None);
        }

        let approval_required = self.config.execution.require_human_approval;
        let handoff = ExecutionHandoff {
            session_id: sequencer.session_id().to_string(),
            approved: !approval_required || approve_execution,
            approval_required,
            default_executor_profile: self.config.execution.default_executor_profile.clone(),
            motion_id: phase_results
                .iter()
                .rev()
                .find_map(|r| r.winning_motion.as_ref().map(|m| m.motion_id.clone())),
            leader_id: leader_id.to_string(),
            execution_brief: brief.clone(),
        };

        let contents = serde_json::to_string_pretty(&handoff)
            .map_err(|e| crate::ports::StoreError::Serialization(e.to_string()))?;
        store.write_artifact("execution-handoff.json", &contents)?;
        sequencer.emit(
            EventType::ExecutionHandoffCreated,
            Some(leader_id),
            serde_json::to_value(&handoff).unwrap_or_else(|_| json!({})),
        )?;
        info!(approved = handoff.approved, "execution handoff written");

        Ok(Some(handoff))
    }
}
