//! Documentation review artifacts: reviewer feedback and its normalization.
//!
//! Reviewer feedback arrives as structured JSON. Malformed blocker entries
//! are dropped; a reviewer whose entire response is unparseable yields a
//! single synthetic blocker (id `B0`) so the leader still observes the
//! deficit when revising.

use crate::protocol::JsonOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_CRITICAL_BLOCKERS: usize = 5;
pub const MAX_SUGGESTED_CHANGES: usize = 6;

/// Severity of a review blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockerSeverity {
    High,
    Medium,
    Low,
}

/// A defect that must be fixed before the documentation can be approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBlocker {
    pub id: String,
    pub section: String,
    pub problem: String,
    pub impact: String,
    pub required_change: String,
    pub severity: BlockerSeverity,
}

impl ReviewBlocker {
    /// The synthetic blocker inserted when a reviewer's response could not
    /// be parsed at all.
    pub fn synthetic(reviewer_id: &str, message: &str) -> Self {
        Self {
            id: "B0".to_string(),
            section: "(entire document)".to_string(),
            problem: format!(
                "Reviewer {} returned an unparseable response: {}",
                reviewer_id, message
            ),
            impact: "Review coverage is incomplete for this revision.".to_string(),
            required_change: "Re-examine the document against this reviewer's concerns."
                .to_string(),
            severity: BlockerSeverity::High,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let field = |key: &str| -> Option<String> {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let severity = match value.get("severity").and_then(Value::as_str) {
            Some(s) => match s.to_lowercase().as_str() {
                "high" => BlockerSeverity::High,
                "medium" => BlockerSeverity::Medium,
                "low" => BlockerSeverity::Low,
                _ => return None,
            },
            None => return None,
        };
        Some(Self {
            id: field("id")?,
            section: field("section")?,
            problem: field("problem")?,
            impact: field("impact")?,
            required_change: field("requiredChange")?,
            severity,
        })
    }
}

/// One reviewer's structured feedback on a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFeedback {
    pub reviewer_id: String,
    pub critical_blockers: Vec<ReviewBlocker>,
    pub suggested_changes: Vec<String>,
}

impl ReviewFeedback {
    /// Normalize a reviewer's response. Malformed blocker entries are
    /// dropped; a fully unparseable response becomes the synthetic `B0`
    /// blocker.
    pub fn from_outcome(reviewer_id: &str, outcome: &JsonOutcome) -> Self {
        let value = match outcome {
            JsonOutcome::ParseError { message, .. } => {
                return Self {
                    reviewer_id: reviewer_id.to_string(),
                    critical_blockers: vec![ReviewBlocker::synthetic(reviewer_id, message)],
                    suggested_changes: Vec::new(),
                };
            }
            JsonOutcome::Parsed(value) => value,
        };

        let critical_blockers = value
            .get("criticalBlockers")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(ReviewBlocker::from_value)
                    .take(MAX_CRITICAL_BLOCKERS)
                    .collect()
            })
            .unwrap_or_default();

        let suggested_changes = value
            .get("suggestedChanges")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .take(MAX_SUGGESTED_CHANGES)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            reviewer_id: reviewer_id.to_string(),
            critical_blockers,
            suggested_changes,
        }
    }
}

/// Result of the documentation review loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationOutcome {
    pub approved: bool,
    /// 1-based revision number of the final draft.
    pub final_version: u32,
    /// Blockers still open when the loop exhausted its revisions.
    pub unresolved_blockers: Vec<ReviewBlocker>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blocker_json(id: &str) -> Value {
        json!({
            "id": id,
            "section": "Overview",
            "problem": "Too vague",
            "impact": "Readers cannot act on it",
            "requiredChange": "Name the chosen option",
            "severity": "high"
        })
    }

    #[test]
    fn test_feedback_parses_blockers_and_changes() {
        let outcome = JsonOutcome::Parsed(json!({
            "criticalBlockers": [blocker_json("B1")],
            "suggestedChanges": ["Add a diagram", ""]
        }));
        let feedback = ReviewFeedback::from_outcome("bob", &outcome);
        assert_eq!(feedback.critical_blockers.len(), 1);
        assert_eq!(feedback.critical_blockers[0].id, "B1");
        assert_eq!(feedback.suggested_changes, vec!["Add a diagram"]);
    }

    #[test]
    fn test_malformed_blockers_dropped() {
        let outcome = JsonOutcome::Parsed(json!({
            "criticalBlockers": [
                blocker_json("B1"),
                {"id": "B2", "problem": "missing fields"},
                {"id": "B3", "section": "x", "problem": "y", "impact": "z",
                 "requiredChange": "w", "severity": "catastrophic"}
            ]
        }));
        let feedback = ReviewFeedback::from_outcome("bob", &outcome);
        let ids: Vec<&str> = feedback
            .critical_blockers
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["B1"]);
    }

    #[test]
    fn test_blocker_cap() {
        let blockers: Vec<Value> = (1..=9).map(|i| blocker_json(&format!("B{}", i))).collect();
        let outcome = JsonOutcome::Parsed(json!({ "criticalBlockers": blockers }));
        let feedback = ReviewFeedback::from_outcome("bob", &outcome);
        assert_eq!(feedback.critical_blockers.len(), MAX_CRITICAL_BLOCKERS);
    }

    #[test]
    fn test_unparseable_response_yields_b0() {
        let outcome = JsonOutcome::ParseError {
            message: "no JSON object found".into(),
            raw: "I refuse".into(),
        };
        let feedback = ReviewFeedback::from_outcome("bob", &outcome);
        assert_eq!(feedback.critical_blockers.len(), 1);
        assert_eq!(feedback.critical_blockers[0].id, "B0");
        assert_eq!(feedback.critical_blockers[0].severity, BlockerSeverity::High);
        assert!(feedback.critical_blockers[0].problem.contains("bob"));
    }
}
