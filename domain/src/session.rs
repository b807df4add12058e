//! Session-level results: the leader summary, the execution handoff, and
//! the final session state document.

use crate::phase::{PhaseEnd, PhaseResult};
use crate::protocol::JsonOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The leader's structured closing statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderSummary {
    pub summary_markdown: String,
    pub final_resolution: String,
    pub requires_execution: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_brief: Option<String>,
}

impl LeaderSummary {
    /// Parse the leader's JSON response; on failure synthesize a fallback
    /// summary pointing at the adopted resolution.
    pub fn from_outcome(outcome: &JsonOutcome, final_resolution: &str) -> Self {
        if let JsonOutcome::Parsed(value) = outcome
            && let Some(summary) = Self::from_value(value)
        {
            return summary;
        }
        Self {
            summary_markdown: format!(
                "## Session summary\n\nThe leader's closing statement could not be parsed. \
                 The council's adopted resolution stands:\n\n> {}",
                final_resolution
            ),
            final_resolution: final_resolution.to_string(),
            requires_execution: false,
            execution_brief: None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let summary_markdown = value.get("summaryMarkdown")?.as_str()?.trim().to_string();
        let final_resolution = value.get("finalResolution")?.as_str()?.trim().to_string();
        if summary_markdown.is_empty() || final_resolution.is_empty() {
            return None;
        }
        let requires_execution = value
            .get("requiresExecution")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let execution_brief = value
            .get("executionBrief")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Some(Self {
            summary_markdown,
            final_resolution,
            requires_execution,
            execution_brief,
        })
    }
}

/// Descriptor handed to an external executor when the leader declares the
/// outcome executable. The engine itself never executes anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionHandoff {
    pub session_id: String,
    /// `!approval_required || operator passed the approval flag`.
    pub approved: bool,
    pub approval_required: bool,
    pub default_executor_profile: String,
    pub motion_id: Option<String>,
    pub leader_id: String,
    pub execution_brief: String,
}

/// Final synthesis of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub session_id: String,
    pub council_name: String,
    pub human_prompt: String,
    pub leader_id: String,
    pub phase_results: Vec<PhaseResult>,
    /// How the last phase ended.
    pub ended_by: PhaseEnd,
    pub final_resolution: String,
    pub requires_execution: bool,
    pub execution_approved: Option<bool>,
    pub documentation_approved: Option<bool>,
    /// Artifact file names written under the session directory.
    pub artifacts: Vec<String>,
    pub closed_at: String,
}
