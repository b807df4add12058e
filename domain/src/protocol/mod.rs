//! The strict-JSON response contract between the engine and its members.
//!
//! Members answer every protocol prompt with a single-line JSON object.
//! This module defines the tagged variants those objects normalize into,
//! the tolerant JSON extraction that copes with real LLM output, and the
//! deterministic fallbacks that keep the session flowing when a member
//! returns garbage.

pub mod extract;
pub mod normalize;

pub use extract::{JsonExtractError, extract_json};

use crate::vote::Ballot;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a structured model call: either a parsed JSON value or the
/// parse-error envelope the normalizer converts into a fallback.
///
/// Transport and provider failures are *not* represented here; those are
/// fatal errors carried on the gateway's error channel.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonOutcome {
    Parsed(Value),
    ParseError { message: String, raw: String },
}

impl JsonOutcome {
    /// Run the extraction pipeline over raw model text.
    pub fn from_raw(raw: &str) -> Self {
        match extract_json(raw) {
            Ok(value) => JsonOutcome::Parsed(value),
            Err(e) => JsonOutcome::ParseError {
                message: e.to_string(),
                raw: raw.to_string(),
            },
        }
    }
}

/// What a member chose to do with its turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnAction {
    /// Speak: add a message to the transcript.
    Contribute { message: String },
    /// Decline the turn.
    Pass {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// Move a motion, triggering the seconding/voting sub-machine.
    CallVote {
        title: String,
        text: String,
        #[serde(rename = "decisionIfPass")]
        decision_if_pass: String,
    },
}

impl TurnAction {
    pub fn kind(&self) -> &'static str {
        match self {
            TurnAction::Contribute { .. } => "CONTRIBUTE",
            TurnAction::Pass { .. } => "PASS",
            TurnAction::CallVote { .. } => "CALL_VOTE",
        }
    }
}

/// A member's answer to "will you second this motion?".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondingResponse {
    pub second: bool,
    pub rationale: String,
}

/// A member's ballot on a motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub ballot: Ballot,
    pub rationale: String,
}

/// A member's ballot in the leader election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderElectionBallot {
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    pub rationale: String,
}
