//! The RunSession use case: the top of the orchestration.
//!
//! Leader election, phase sequencing through the transition resolver,
//! leader summary, the optional documentation loop, the execution handoff,
//! and finalization. This type exclusively owns all mutable session state;
//! everything it delegates to returns values.

mod election;
mod summary;
pub mod types;

pub use types::{SessionError, SessionResult};

use super::documentation::DocumentationLoop;
use super::phase_runner::PhaseRunner;
use crate::ports::{
    Clock, CompletionOptions, CouncilModels, IdGenerator, MemoryStore, SessionMemoryInput,
    SessionStoreProvider,
};
use crate::sequencer::EventSequencer;
use council_domain::{
    CouncilConfig, EventType, Member, OutputKind, PhaseEnd, PhaseResult, PhaseState,
    SessionDocument, SessionMemoryUpdate, TransitionDecision, resolve_transition,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use types::{ProtocolTracker, TranscriptWindow};

/// Stop reasons recorded on SESSION_CLOSED.
const STOP_GRAPH_TERMINATED: &str = "GRAPH_TERMINATED";
const STOP_MAX_PHASE_TRANSITIONS: &str = "MAX_PHASE_TRANSITIONS";

pub struct RunSessionUseCase {
    pub(crate) config: Arc<CouncilConfig>,
    pub(crate) models: Arc<dyn CouncilModels>,
    stores: Arc<dyn SessionStoreProvider>,
    memory: Arc<dyn MemoryStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    pub(crate) cancel: CancellationToken,
}

impl RunSessionUseCase {
    pub fn new(
        config: Arc<CouncilConfig>,
        models: Arc<dyn CouncilModels>,
        stores: Arc<dyn SessionStoreProvider>,
        memory: Arc<dyn MemoryStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            config,
            models,
            stores,
            memory,
            clock,
            ids,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token (e.g. wired to SIGINT).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn options_for(member: &Member) -> CompletionOptions {
        CompletionOptions {
            temperature: member.model.temperature,
            max_tokens: member.model.max_tokens,
        }
    }

    /// Run one full session over `human_prompt`.
    pub async fn run(
        &self,
        human_prompt: &str,
        approve_execution: bool,
    ) -> Result<SessionResult, SessionError> {
        self.config
            .validate()
            .map_err(SessionError::InvalidConfig)?;

        let session_id = self.ids.session_id();
        let store = self.stores.open_session(&session_id)?;
        self.memory.prepare(&self.config)?;

        let mut sequencer =
            EventSequencer::new(&session_id, Arc::clone(&store), Arc::clone(&self.clock));
        let mut tracker = ProtocolTracker::default();
        let mut window = TranscriptWindow::default();

        info!(session_id = %session_id, council = %self.config.name, "session started");
        sequencer.emit(
            EventType::SessionStarted,
            None,
            json!({
                "councilName": self.config.name,
                "purpose": self.config.purpose,
                "humanPrompt": human_prompt,
                "members": self.config.members.iter().map(|m| m.id.clone()).collect::<Vec<_>>(),
                "outputType": self.config.output.kind,
            }),
        )?;

        // 1. Leader election.
        let leader_id = self
            .elect_leader(human_prompt, &mut sequencer, &mut tracker)
            .await?;
        let leader = self
            .config
            .member(&leader_id)
            .expect("elected leader is a declared member");

        // Memory snapshots were derived at the previous session's close;
        // read them once, before any turn.
        let memory_snapshots = self.load_memory_snapshots()?;

        // 2. Phase sequencing.
        let mut phase_results: Vec<PhaseResult> = Vec::new();
        let mut current_phase_id = self.config.session.entry_phase_id.clone();
        let mut stop_reason = STOP_GRAPH_TERMINATED;

        loop {
            let phase = self
                .config
                .phase(&current_phase_id)
                .expect("phase graph validated");

            sequencer.set_round(0);
            sequencer.set_phase_state(PhaseState::Discussion);
            sequencer.emit(
                EventType::PhaseStarted,
                None,
                json!({"phaseId": phase.id, "goal": phase.goal}),
            )?;

            let runner = PhaseRunner {
                config: &self.config,
                phase,
                models: &self.models,
                ids: &self.ids,
                cancel: &self.cancel,
                human_prompt,
                memory_snapshots: &memory_snapshots,
            };
            let result = runner.run(&mut sequencer, &mut window, &mut tracker).await?;
            let ended_by = result.ended_by;
            phase_results.push(result);

            match resolve_transition(phase, ended_by) {
                TransitionDecision::Terminate => break,
                TransitionDecision::Continue(next) => {
                    if phase_results.len() as u32 >= self.config.session.max_phase_transitions {
                        warn!(
                            completed = phase_results.len(),
                            "phase transition cap reached; forcing termination"
                        );
                        stop_reason = STOP_MAX_PHASE_TRANSITIONS;
                        break;
                    }
                    current_phase_id = next;
                }
            }
        }

        let forced_stop = stop_reason == STOP_MAX_PHASE_TRANSITIONS;
        let last_ended_by = if forced_stop {
            // Synthetic outcome: a cap-forced stop reads as a round limit.
            PhaseEnd::RoundLimit
        } else {
            phase_results
                .last()
                .map(|r| r.ended_by)
                .unwrap_or(PhaseEnd::RoundLimit)
        };

        // 3. Leader summary.
        let summary = self
            .build_leader_summary(
                leader,
                human_prompt,
                &phase_results,
                &window,
                &mut sequencer,
                &store,
                &mut tracker,
            )
            .await?;

        // 4. Documentation loop.
        let documentation = if self.config.output.kind == OutputKind::Documentation {
            let review = DocumentationLoop {
                config: &self.config,
                leader,
                models: &self.models,
                cancel: &self.cancel,
            };
            Some(
                review
                    .run(
                        human_prompt,
                        &summary.final_resolution,
                        &phase_results,
                        &mut sequencer,
                        &store,
                        &mut tracker,
                    )
                    .await?,
            )
        } else {
            None
        };

        // 5. Execution handoff.
        let execution_handoff = self.write_execution_handoff(
            &summary,
            &leader_id,
            &phase_results,
            approve_execution,
            &mut sequencer,
            &store,
        )?;

        // 6. Finalize.
        sequencer.emit(
            EventType::SessionClosed,
            None,
            json!({
                "phasesCompleted": phase_results.len(),
                "stopReason": stop_reason,
            }),
        )?;

        self.record_memory(
            &session_id,
            &summary,
            &phase_results,
            last_ended_by,
            execution_handoff.as_ref().map(|h| h.approved),
            &tracker,
        )?;

        let mut artifacts = vec![
            "transcript.md".to_string(),
            "events.json".to_string(),
            "session.json".to_string(),
            "leader-summary.md".to_string(),
        ];
        if let Some(doc) = &documentation {
            if doc.approved {
                artifacts.push("documentation.md".to_string());
            } else {
                artifacts.push("documentation.unapproved.md".to_string());
                artifacts.push("documentation.unresolved-blockers.json".to_string());
            }
        }
        if execution_handoff.is_some() {
            artifacts.push("execution-handoff.json".to_string());
        }

        let document = SessionDocument {
            session_id: session_id.clone(),
            council_name: self.config.name.clone(),
            human_prompt: human_prompt.to_string(),
            leader_id: leader_id.clone(),
            phase_results: phase_results.clone(),
            ended_by: last_ended_by,
            final_resolution: summary.final_resolution.clone(),
            requires_execution: summary.requires_execution,
            execution_approved: execution_handoff.as_ref().map(|h| h.approved),
            documentation_approved: documentation.as_ref().map(|d| d.approved),
            artifacts,
            closed_at: self.clock.now_iso(),
        };
        store.finalize(&document)?;
        info!(session_id = %session_id, resolution = %document.final_resolution, "session closed");

        Ok(SessionResult {
            session_id,
            leader_id,
            summary,
            phase_results,
            documentation,
            execution_handoff,
            document,
        })
    }

    fn load_memory_snapshots(&self) -> Result<HashMap<String, String>, SessionError> {
        let reads_memory = self
            .config
            .phases
            .iter()
            .any(|p| p.memory_policy.read_member_memory);
        let mut snapshots = HashMap::new();
        if reads_memory {
            for member in &self.config.members {
                snapshots.insert(member.id.clone(), self.memory.prompt_context(&member.id)?);
            }
        }
        Ok(snapshots)
    }

    /// Memory writes are all-or-nothing at session close: they happen iff
    /// at least one completed phase's policy permits them.
    fn record_memory(
        &self,
        session_id: &str,
        summary: &council_domain::LeaderSummary,
        phase_results: &[PhaseResult],
        last_ended_by: PhaseEnd,
        execution_approved: Option<bool>,
        tracker: &ProtocolTracker,
    ) -> Result<(), SessionError> {
        let policy_of = |result: &PhaseResult| self.config.phase(&result.phase_id);
        let write_member_memory = phase_results
            .iter()
            .filter_map(policy_of)
            .any(|p| p.memory_policy.write_member_memory);
        let write_council_memory = phase_results
            .iter()
            .filter_map(policy_of)
            .any(|p| p.memory_policy.write_council_memory);

        if !write_member_memory && !write_council_memory {
            return Ok(());
        }

        let input = SessionMemoryInput {
            update: SessionMemoryUpdate {
                session_id: session_id.to_string(),
                timestamp: self.clock.now_iso(),
                council_name: self.config.name.clone(),
                final_resolution: summary.final_resolution.clone(),
                ended_by_round_limit: last_ended_by == PhaseEnd::RoundLimit,
                requires_execution: summary.requires_execution,
                execution_approved: execution_approved.unwrap_or(false),
            },
            member_ids: self.config.members.iter().map(|m| m.id.clone()).collect(),
            last_contributions: tracker.last_contributions.clone(),
            parse_fallback_members: tracker.parse_fallback_members.clone(),
            write_member_memory,
            write_council_memory,
        };
        self.memory.record_session(&input)?;
        Ok(())
    }
}
