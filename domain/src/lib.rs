//! Domain layer for the council deliberation engine
//!
//! This crate contains the protocol's core business logic: council
//! composition and validation, the phase graph and its transition rules,
//! motions and vote arithmetic, the typed event model, response
//! normalization with deterministic fallbacks, prompt templates, and the
//! bounded structured memory. It has no dependencies on infrastructure or
//! presentation concerns, performs no I/O, and never reads the clock.

pub mod council;
pub mod documentation;
pub mod event;
pub mod memory;
pub mod motion;
pub mod phase;
pub mod prompt;
pub mod protocol;
pub mod session;
pub mod vote;

// Re-export commonly used types
pub use council::{
    ConfigViolation, CouncilConfig, ExecutionPolicy, Member, ModelRef, OutputKind, OutputPolicy,
    SessionPolicy, StoragePolicy, Verbosity, ViolationCode,
};
pub use documentation::{BlockerSeverity, DocumentationOutcome, ReviewBlocker, ReviewFeedback};
pub use event::{Event, EventType, PhaseState};
pub use memory::{
    EvidenceRef, MemoryDocument, MemoryRecord, PromptContext, RecordKind, RecordStatus,
    SessionMemoryUpdate,
};
pub use motion::Motion;
pub use phase::{
    Deliverable, EvidenceRequirements, FallbackAction, Governance, MemoryPolicy,
    PhaseContextPacket, PhaseEnd, PhaseFallback, PhaseResult, PhaseSpec, StopConditions,
    TransitionDecision, TransitionRule, TransitionTrigger, resolve_transition,
};
pub use prompt::CouncilPrompt;
pub use protocol::{
    JsonOutcome, LeaderElectionBallot, SecondingResponse, TurnAction, VoteResponse, extract_json,
};
pub use session::{ExecutionHandoff, LeaderSummary, SessionDocument};
pub use vote::{Ballot, VoteTally};
