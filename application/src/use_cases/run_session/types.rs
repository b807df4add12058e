//! Shared types for the session use cases.

use crate::ports::{ModelError, StoreError};
use council_domain::{
    ConfigViolation, DocumentationOutcome, ExecutionHandoff, JsonOutcome, LeaderSummary,
    PhaseResult, SessionDocument,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that abort a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("configuration invalid: {}", format_violations(.0))]
    InvalidConfig(Vec<ConfigViolation>),

    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("session cancelled")]
    Cancelled,

    #[error("task join failure: {0}")]
    Join(String),
}

fn format_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything a completed session hands back to the caller.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub session_id: String,
    pub leader_id: String,
    pub summary: LeaderSummary,
    pub phase_results: Vec<PhaseResult>,
    pub documentation: Option<DocumentationOutcome>,
    pub execution_handoff: Option<ExecutionHandoff>,
    pub document: SessionDocument,
}

/// Facts the memory store needs at close, accumulated as the protocol runs.
#[derive(Debug, Default)]
pub struct ProtocolTracker {
    /// Each member's last contributed message.
    pub last_contributions: BTreeMap<String, String>,
    /// Members that hit the parse-fallback path at least once.
    pub parse_fallback_members: BTreeSet<String>,
}

impl ProtocolTracker {
    pub fn note_contribution(&mut self, member_id: &str, message: &str) {
        self.last_contributions
            .insert(member_id.to_string(), message.to_string());
    }

    pub fn note_outcome(&mut self, member_id: &str, outcome: &JsonOutcome) {
        if matches!(outcome, JsonOutcome::ParseError { .. }) {
            self.parse_fallback_members.insert(member_id.to_string());
        }
    }
}

/// Recent-discussion window injected into prompts. Distinct from the
/// persisted transcript: this is the bounded, in-memory view a member sees
/// on its turn.
#[derive(Debug, Default)]
pub struct TranscriptWindow {
    entries: Vec<String>,
}

/// How many recent entries a prompt sees.
const PROMPT_WINDOW: usize = 12;

impl TranscriptWindow {
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// The last [`PROMPT_WINDOW`] entries, newline-joined.
    pub fn window(&self) -> String {
        let start = self.entries.len().saturating_sub(PROMPT_WINDOW);
        self.entries[start..].join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_notes_parse_fallbacks() {
        let mut tracker = ProtocolTracker::default();
        tracker.note_outcome("ada", &JsonOutcome::Parsed(serde_json::json!({})));
        tracker.note_outcome(
            "bob",
            &JsonOutcome::ParseError {
                message: "bad".into(),
                raw: "bad".into(),
            },
        );
        assert!(!tracker.parse_fallback_members.contains("ada"));
        assert!(tracker.parse_fallback_members.contains("bob"));
    }

    #[test]
    fn test_window_is_bounded() {
        let mut window = TranscriptWindow::default();
        for i in 0..20 {
            window.push(format!("entry {}", i));
        }
        let rendered = window.window();
        assert!(!rendered.contains("entry 7"));
        assert!(rendered.contains("entry 8"));
        assert!(rendered.contains("entry 19"));
    }
}
