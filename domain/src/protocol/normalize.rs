//! Response normalization with deterministic fallbacks.
//!
//! Every raw model response is coerced into exactly one of the protocol
//! variants. A response that cannot be parsed or fails validation never
//! aborts the session: it becomes the canonical fallback for its step
//! (PASS, no-second, ABSTAIN, or the first declared member), and the event
//! stream continues.

use super::{JsonOutcome, LeaderElectionBallot, SecondingResponse, TurnAction, VoteResponse};
use crate::council::Member;
use crate::vote::Ballot;
use serde_json::Value;

/// Note attached to every auto-converted PASS.
pub const FALLBACK_NOTE: &str = "Auto-converted to PASS to preserve deterministic flow.";

fn parse_error_reason(message: &str) -> String {
    format!("Model JSON parse error: {}", message)
}

fn invalid_format_reason(detail: &str) -> String {
    format!("Invalid response format: {}", detail)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize a turn response into a [`TurnAction`].
///
/// The contract is `{"action": "CONTRIBUTE"|"PASS"|"CALL_VOTE", ...}` with
/// the fields each action requires. Anything else becomes a PASS that
/// records why.
pub fn turn_action(outcome: &JsonOutcome) -> TurnAction {
    let value = match outcome {
        JsonOutcome::ParseError { message, .. } => {
            return TurnAction::Pass {
                reason: parse_error_reason(message),
                note: Some(FALLBACK_NOTE.to_string()),
            };
        }
        JsonOutcome::Parsed(value) => value,
    };

    let Some(action) = value.get("action").and_then(Value::as_str) else {
        return TurnAction::Pass {
            reason: invalid_format_reason("missing \"action\" field"),
            note: Some(FALLBACK_NOTE.to_string()),
        };
    };

    match action.trim().to_uppercase().as_str() {
        "CONTRIBUTE" => match string_field(value, "message") {
            Some(message) => TurnAction::Contribute { message },
            None => TurnAction::Pass {
                reason: invalid_format_reason("CONTRIBUTE without a non-empty \"message\""),
                note: Some(FALLBACK_NOTE.to_string()),
            },
        },
        "PASS" => TurnAction::Pass {
            reason: string_field(value, "reason").unwrap_or_else(|| "No reason given.".to_string()),
            note: string_field(value, "note"),
        },
        "CALL_VOTE" => {
            let title = string_field(value, "title");
            let text = string_field(value, "text");
            let decision = string_field(value, "decisionIfPass");
            match (title, text, decision) {
                (Some(title), Some(text), Some(decision_if_pass)) => TurnAction::CallVote {
                    title,
                    text,
                    decision_if_pass,
                },
                _ => TurnAction::Pass {
                    reason: invalid_format_reason(
                        "CALL_VOTE requires \"title\", \"text\" and \"decisionIfPass\"",
                    ),
                    note: Some(FALLBACK_NOTE.to_string()),
                },
            }
        }
        other => TurnAction::Pass {
            reason: invalid_format_reason(&format!("unknown action \"{}\"", other)),
            note: Some(FALLBACK_NOTE.to_string()),
        },
    }
}

/// Normalize a seconding response. Fallback: do not second.
pub fn seconding(outcome: &JsonOutcome) -> SecondingResponse {
    let value = match outcome {
        JsonOutcome::ParseError { message, .. } => {
            return SecondingResponse {
                second: false,
                rationale: parse_error_reason(message),
            };
        }
        JsonOutcome::Parsed(value) => value,
    };

    match value.get("second").and_then(Value::as_bool) {
        Some(second) => SecondingResponse {
            second,
            rationale: string_field(value, "rationale")
                .unwrap_or_else(|| "No rationale given.".to_string()),
        },
        None => SecondingResponse {
            second: false,
            rationale: invalid_format_reason("missing boolean \"second\" field"),
        },
    }
}

/// Normalize a vote response. Fallback: ABSTAIN (which counts as NO under
/// `abstain_counts_as_no` governance).
pub fn vote(outcome: &JsonOutcome) -> VoteResponse {
    let value = match outcome {
        JsonOutcome::ParseError { message, .. } => {
            return VoteResponse {
                ballot: Ballot::Abstain,
                rationale: parse_error_reason(message),
            };
        }
        JsonOutcome::Parsed(value) => value,
    };

    let ballot = value
        .get("ballot")
        .and_then(Value::as_str)
        .and_then(Ballot::parse);

    match ballot {
        Some(ballot) => VoteResponse {
            ballot,
            rationale: string_field(value, "rationale")
                .unwrap_or_else(|| "No rationale given.".to_string()),
        },
        None => VoteResponse {
            ballot: Ballot::Abstain,
            rationale: invalid_format_reason("\"ballot\" must be YES, NO or ABSTAIN"),
        },
    }
}

/// Normalize a leader-election ballot. The candidate must be a declared
/// member; the fallback candidate is the first member in declaration order.
pub fn leader_ballot(outcome: &JsonOutcome, members: &[Member]) -> LeaderElectionBallot {
    debug_assert!(!members.is_empty());
    let fallback_candidate = members
        .first()
        .map(|m| m.id.clone())
        .unwrap_or_default();

    let value = match outcome {
        JsonOutcome::ParseError { message, .. } => {
            return LeaderElectionBallot {
                candidate_id: fallback_candidate,
                rationale: parse_error_reason(message),
            };
        }
        JsonOutcome::Parsed(value) => value,
    };

    match string_field(value, "candidateId") {
        Some(candidate_id) if members.iter().any(|m| m.id == candidate_id) => {
            LeaderElectionBallot {
                candidate_id,
                rationale: string_field(value, "rationale")
                    .unwrap_or_else(|| "No rationale given.".to_string()),
            }
        }
        Some(unknown) => LeaderElectionBallot {
            candidate_id: fallback_candidate,
            rationale: invalid_format_reason(&format!(
                "\"{}\" is not a member of this council",
                unknown
            )),
        },
        None => LeaderElectionBallot {
            candidate_id: fallback_candidate,
            rationale: invalid_format_reason("missing \"candidateId\" field"),
        },
    }
}
