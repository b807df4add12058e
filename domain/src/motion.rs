//! Motions: proposals introduced by a CALL_VOTE turn action.
//!
//! A motion is created when a speaker calls a vote and resolves within the
//! same turn: it is either not seconded, voted down, or passed.

use serde::{Deserialize, Serialize};

/// A proposal under consideration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motion {
    pub motion_id: String,
    pub title: String,
    /// Full motion text put before the council.
    pub text: String,
    /// The resolution adopted if the motion passes.
    pub decision_if_pass: String,
    /// Member id of the caller.
    pub proposer: String,
    /// Round in which the motion was called.
    pub round: u32,
    /// Session-global turn index of the calling turn.
    pub turn_index: u64,
}
