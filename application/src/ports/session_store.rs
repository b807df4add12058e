//! Session storage port: the event log and its sibling artifacts.
//!
//! This is separate from `tracing`-based diagnostics: tracing carries
//! human-readable operational messages, while this port persists the
//! ordered protocol record and the session's output artifacts. Appends are
//! durable before they return, so the event stream is replayable after any
//! crash that survives the last successful write.

use council_domain::{Event, SessionDocument};
use std::path::PathBuf;
use thiserror::Error;

/// Storage failures. Fatal to the session.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Per-session storage: the event log, the running transcript, and named
/// artifacts. Written only by the orchestrator sequencer.
pub trait SessionStore: Send + Sync {
    /// Append one event and flush the structured event log.
    fn append_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Append a section to the human-readable transcript and flush it.
    fn append_transcript(&self, section: &str) -> Result<(), StoreError>;

    /// Write (or overwrite) a named artifact in the session directory.
    /// Returns the path the artifact landed at.
    fn write_artifact(&self, name: &str, contents: &str) -> Result<PathBuf, StoreError>;

    /// Persist the final session state document.
    fn finalize(&self, document: &SessionDocument) -> Result<(), StoreError>;
}

/// Opens per-session stores. The orchestrator generates the session id and
/// initializes storage through this.
pub trait SessionStoreProvider: Send + Sync {
    fn open_session(&self, session_id: &str) -> Result<std::sync::Arc<dyn SessionStore>, StoreError>;
}
