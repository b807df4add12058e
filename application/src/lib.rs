//! Application layer for the council deliberation engine
//!
//! This crate contains the port definitions and the session use cases.
//! It depends only on the domain layer. All parallelism is structured:
//! fan-outs join fully (and re-order to member turn order) before a single
//! event is emitted, and a cancellation observed anywhere fails the
//! session fast.

pub mod ports;
pub mod sequencer;
pub mod transcript;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    Clock, CompletionOptions, CouncilModels, IdGenerator, MemoryStore, ModelClient, ModelError,
    NullMemoryStore, SessionMemoryInput, SessionStore, SessionStoreProvider, StoreError,
};
pub use sequencer::EventSequencer;
pub use use_cases::{RunSessionUseCase, SessionError, SessionResult};
