//! Structured configuration violations.
//!
//! Validation reports every violation it finds, not just the first, so an
//! operator can fix a config in one pass. Each violation carries a stable
//! machine-readable code plus a human-readable message.

use serde::{Deserialize, Serialize};

/// Machine-readable violation codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViolationCode {
    EmptyField(String),
    InvalidCouncilSize(usize),
    DuplicateMemberId(String),
    DuplicatePhaseId(String),
    UnknownPhase(String),
    UnreachablePhase(String),
    InvalidTurnOrder,
    InvalidThreshold { phase: String, threshold: f64 },
    InvalidBound(String),
}

/// A single configuration violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigViolation {
    pub code: ViolationCode,
    pub message: String,
}

impl ConfigViolation {
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
