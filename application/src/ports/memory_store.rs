//! Memory storage port.
//!
//! Memory is read once per session (the prompt-context snapshot derived at
//! the previous session's close) and written once at session close. There
//! are no mid-session writes.

use super::session_store::StoreError;
use council_domain::{CouncilConfig, SessionMemoryUpdate};
use std::collections::{BTreeMap, BTreeSet};

/// Everything the memory store needs to apply the session-close upserts.
#[derive(Debug, Clone)]
pub struct SessionMemoryInput {
    pub update: SessionMemoryUpdate,
    /// Every member id in the council, in declaration order.
    pub member_ids: Vec<String>,
    /// Each member's last contributed message, if any.
    pub last_contributions: BTreeMap<String, String>,
    /// Members that hit the JSON parse-fallback path at least once.
    pub parse_fallback_members: BTreeSet<String>,
    /// Whether any completed phase permitted member memory writes.
    pub write_member_memory: bool,
    /// Whether any completed phase permitted council memory writes.
    pub write_council_memory: bool,
}

/// Port for the bounded structured memory.
pub trait MemoryStore: Send + Sync {
    /// Ensure the storage layout exists for every member: profile, empty
    /// memory documents when absent.
    fn prepare(&self, config: &CouncilConfig) -> Result<(), StoreError>;

    /// The member's rendered prompt-context snapshot, as derived at the
    /// previous session close. Empty string when the member has none.
    fn prompt_context(&self, member_id: &str) -> Result<String, StoreError>;

    /// Apply the session-close upserts, prune, recompute snapshots, and
    /// persist.
    fn record_session(&self, input: &SessionMemoryInput) -> Result<(), StoreError>;
}

/// No-op implementation for tests and memory-less runs.
pub struct NullMemoryStore;

impl MemoryStore for NullMemoryStore {
    fn prepare(&self, _config: &CouncilConfig) -> Result<(), StoreError> {
        Ok(())
    }

    fn prompt_context(&self, _member_id: &str) -> Result<String, StoreError> {
        Ok(String::new())
    }

    fn record_session(&self, _input: &SessionMemoryInput) -> Result<(), StoreError> {
        Ok(())
    }
}
