//! Test doubles: scripted model clients, in-memory stores, fixed clock and
//! sequential ids. With these pinned, a session's event stream is fully
//! deterministic.

use async_trait::async_trait;
use council_application::ports::{
    Clock, CompletionOptions, CouncilModels, IdGenerator, MemoryStore, ModelClient, ModelError,
    SessionMemoryInput, SessionStore, SessionStoreProvider, StoreError,
};
use council_domain::{
    CouncilConfig, Event, EventType, ExecutionPolicy, FallbackAction, Governance, JsonOutcome,
    Member, ModelRef, OutputKind, OutputPolicy, PhaseFallback, PhaseSpec, SessionDocument,
    SessionPolicy, StopConditions, StoragePolicy,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Scripted model clients
// ---------------------------------------------------------------------------

/// Replays a fixed queue of raw responses, one per call, in order.
pub struct ScriptedClient {
    member_id: String,
    responses: Mutex<VecDeque<String>>,
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete_text(
        &self,
        _system: &str,
        _user: &str,
        _opts: &CompletionOptions,
    ) -> Result<String, ModelError> {
        let mut queue = self.responses.lock().unwrap();
        queue.pop_front().ok_or_else(|| {
            ModelError::Other(format!(
                "script for member {} exhausted",
                self.member_id
            ))
        })
    }

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        opts: &CompletionOptions,
    ) -> Result<JsonOutcome, ModelError> {
        let raw = self.complete_text(system, user, opts).await?;
        Ok(JsonOutcome::from_raw(&raw))
    }
}

/// A client that always fails with a transport error.
pub struct FailingClient;

#[async_trait]
impl ModelClient for FailingClient {
    async fn complete_text(
        &self,
        _system: &str,
        _user: &str,
        _opts: &CompletionOptions,
    ) -> Result<String, ModelError> {
        Err(ModelError::Transport("connection refused".into()))
    }
}

/// Member-id to scripted-client router.
#[derive(Default)]
pub struct ScriptedCouncil {
    clients: HashMap<String, Arc<dyn ModelClient>>,
}

impl ScriptedCouncil {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `member_id` to answer its calls with `responses`, in order.
    pub fn member<S: Into<String>>(
        mut self,
        member_id: &str,
        responses: impl IntoIterator<Item = S>,
    ) -> Self {
        self.clients.insert(
            member_id.to_string(),
            Arc::new(ScriptedClient {
                member_id: member_id.to_string(),
                responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            }),
        );
        self
    }

    pub fn failing_member(mut self, member_id: &str) -> Self {
        self.clients
            .insert(member_id.to_string(), Arc::new(FailingClient));
        self
    }
}

impl CouncilModels for ScriptedCouncil {
    fn client_for(&self, member: &Member) -> Arc<dyn ModelClient> {
        Arc::clone(
            self.clients
                .get(&member.id)
                .unwrap_or_else(|| panic!("no script for member {}", member.id)),
        )
    }
}

// ---------------------------------------------------------------------------
// In-memory stores
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemSessionStore {
    pub events: Mutex<Vec<Event>>,
    pub transcript: Mutex<String>,
    pub artifacts: Mutex<BTreeMap<String, String>>,
    pub finalized: Mutex<Option<SessionDocument>>,
}

impl MemSessionStore {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_of(&self, event_type: EventType) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn artifact(&self, name: &str) -> Option<String> {
        self.artifacts.lock().unwrap().get(name).cloned()
    }
}

impl SessionStore for MemSessionStore {
    fn append_event(&self, event: &Event) -> Result<(), StoreError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn append_transcript(&self, section: &str) -> Result<(), StoreError> {
        self.transcript.lock().unwrap().push_str(section);
        Ok(())
    }

    fn write_artifact(&self, name: &str, contents: &str) -> Result<PathBuf, StoreError> {
        self.artifacts
            .lock()
            .unwrap()
            .insert(name.to_string(), contents.to_string());
        Ok(PathBuf::from(name))
    }

    fn finalize(&self, document: &SessionDocument) -> Result<(), StoreError> {
        *self.finalized.lock().unwrap() = Some(document.clone());
        Ok(())
    }
}

pub struct MemStoreProvider {
    pub store: Arc<MemSessionStore>,
}

impl SessionStoreProvider for MemStoreProvider {
    fn open_session(&self, _session_id: &str) -> Result<Arc<dyn SessionStore>, StoreError> {
        Ok(Arc::clone(&self.store) as Arc<dyn SessionStore>)
    }
}

#[derive(Default)]
pub struct MemMemoryStore {
    pub recorded: Mutex<Vec<SessionMemoryInput>>,
}

impl MemoryStore for MemMemoryStore {
    fn prepare(&self, _config: &CouncilConfig) -> Result<(), StoreError> {
        Ok(())
    }

    fn prompt_context(&self, _member_id: &str) -> Result<String, StoreError> {
        Ok(String::new())
    }

    fn record_session(&self, input: &SessionMemoryInput) -> Result<(), StoreError> {
        self.recorded.lock().unwrap().push(input.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixed clock / sequential ids
// ---------------------------------------------------------------------------

pub struct FixedClock;

impl Clock for FixedClock {
    fn now_iso(&self) -> String {
        "2026-01-01T00:00:00.000Z".to_string()
    }
}

#[derive(Default)]
pub struct SeqIds {
    motions: std::sync::atomic::AtomicU64,
}

impl IdGenerator for SeqIds {
    fn session_id(&self) -> String {
        "sess-test".to_string()
    }

    fn motion_id(&self) -> String {
        let n = self
            .motions
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            + 1;
        format!("motion-{}", n)
    }
}

// ---------------------------------------------------------------------------
// Config builders
// ---------------------------------------------------------------------------

pub fn member(id: &str) -> Member {
    Member {
        id: id.into(),
        name: id.to_uppercase(),
        role: "generalist".into(),
        system_prompt: "Deliberate carefully.".into(),
        traits: vec![],
        focus_weights: Default::default(),
        model: ModelRef {
            provider: "scripted".into(),
            model: "scripted".into(),
            temperature: None,
            max_tokens: None,
            base_url: None,
            api_key_env: None,
        },
    }
}

pub fn phase(id: &str, max_rounds: u32) -> PhaseSpec {
    PhaseSpec {
        id: id.into(),
        goal: format!("goal of {}", id),
        prompt_guidance: vec![],
        deliverables: vec![],
        governance: Governance {
            require_seconding: true,
            majority_threshold: 0.5,
            abstain_counts_as_no: true,
        },
        stop_conditions: StopConditions {
            max_rounds,
            end_on_majority_vote: true,
        },
        memory_policy: Default::default(),
        evidence: Default::default(),
        quality_gates: vec![],
        fallback: PhaseFallback {
            resolution: "No consensus reached; revisit next session.".into(),
            action: FallbackAction::EndSession,
        },
        transitions: vec![],
    }
}

pub fn config(member_ids: &[&str], phases: Vec<PhaseSpec>, entry: &str) -> CouncilConfig {
    CouncilConfig {
        name: "Test Council".into(),
        purpose: "Settle test questions".into(),
        members: member_ids.iter().map(|id| member(id)).collect(),
        turn_order: None,
        phases,
        session: SessionPolicy {
            entry_phase_id: entry.into(),
            max_phase_transitions: 12,
            phase_context_verbosity: Default::default(),
        },
        output: OutputPolicy {
            kind: OutputKind::None,
            max_revision_rounds: 2,
        },
        storage: StoragePolicy::default(),
        execution: ExecutionPolicy::default(),
    }
}

// ---------------------------------------------------------------------------
// Response builders (the raw JSON a member's model would return)
// ---------------------------------------------------------------------------

pub fn elect(candidate: &str) -> String {
    format!(
        r#"{{"candidateId":"{}","rationale":"steady hand"}}"#,
        candidate
    )
}

pub fn contribute(message: &str) -> String {
    format!(r#"{{"action":"CONTRIBUTE","message":"{}"}}"#, message)
}

pub fn pass() -> String {
    r#"{"action":"PASS","reason":"nothing to add"}"#.to_string()
}

pub fn call_vote(title: &str, decision: &str) -> String {
    format!(
        r#"{{"action":"CALL_VOTE","title":"{}","text":"Motion text for {}","decisionIfPass":"{}"}}"#,
        title, title, decision
    )
}

pub fn second(willing: bool) -> String {
    format!(r#"{{"second":{},"rationale":"considered"}}"#, willing)
}

pub fn vote(ballot: &str) -> String {
    format!(r#"{{"ballot":"{}","rationale":"on balance"}}"#, ballot)
}

pub fn summary(resolution: &str) -> String {
    format!(
        r###"{{"summaryMarkdown":"## Summary\n\nDone.","finalResolution":"{}","requiresExecution":false}}"###,
        resolution
    )
}

pub fn summary_with_execution(resolution: &str, brief: &str) -> String {
    format!(
        r###"{{"summaryMarkdown":"## Summary","finalResolution":"{}","requiresExecution":true,"executionBrief":"{}"}}"###,
        resolution, brief
    )
}

pub fn feedback(blocker_id: &str) -> String {
    format!(
        r#"{{"criticalBlockers":[{{"id":"{}","section":"Overview","problem":"too vague","impact":"unusable","requiredChange":"be specific","severity":"high"}}],"suggestedChanges":["tighten intro"]}}"#,
        blocker_id
    )
}
