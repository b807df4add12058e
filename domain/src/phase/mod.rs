//! Phase graph: nodes of the deliberation, their governance, and results.
//!
//! A phase is a node in a directed graph (cycles permitted). Each phase has
//! its own round limit, vote governance, memory policy, and outgoing
//! transitions; the session-level transition cap bounds traversal.

mod context;
mod transition;

pub use context::PhaseContextPacket;
pub use transition::{TransitionDecision, resolve_transition};

use crate::motion::Motion;
use serde::{Deserialize, Serialize};

/// Required output of a phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: String,
    pub description: String,
    pub required: bool,
}

/// Vote governance for motions called during a phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Governance {
    /// Whether a motion needs a seconder before going to a vote.
    pub require_seconding: bool,
    /// Fraction of the full council that must vote YES, in (0, 1].
    pub majority_threshold: f64,
    /// When true, abstentions count against the motion.
    pub abstain_counts_as_no: bool,
}

impl Default for Governance {
    fn default() -> Self {
        Self {
            require_seconding: true,
            majority_threshold: 0.5,
            abstain_counts_as_no: true,
        }
    }
}

/// When a phase stops iterating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConditions {
    /// Maximum discussion rounds before the fallback applies.
    pub max_rounds: u32,
    /// Whether a passing motion closes the phase immediately.
    pub end_on_majority_vote: bool,
}

/// What memory the phase reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryPolicy {
    pub read_member_memory: bool,
    pub write_member_memory: bool,
    pub write_council_memory: bool,
    pub include_prior_phase_summary: bool,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            read_member_memory: true,
            write_member_memory: true,
            write_council_memory: true,
            include_prior_phase_summary: true,
        }
    }
}

/// Evidence obligations surfaced to members as gaps in the phase context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceRequirements {
    pub min_citations: u32,
    pub require_explicit_assumptions: bool,
    pub require_risk_register: bool,
}

/// What happens when a phase exhausts its rounds without a passing motion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackAction {
    EndSession,
    Transition {
        #[serde(rename = "transitionToPhaseId")]
        to: String,
    },
}

/// Fallback resolution for a round-limited phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseFallback {
    /// Resolution text adopted when the phase ends on its round limit.
    pub resolution: String,
    #[serde(flatten)]
    pub action: FallbackAction,
}

/// Condition under which a transition rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionTrigger {
    MajorityVote,
    RoundLimit,
    Always,
}

impl TransitionTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionTrigger::MajorityVote => "MAJORITY_VOTE",
            TransitionTrigger::RoundLimit => "ROUND_LIMIT",
            TransitionTrigger::Always => "ALWAYS",
        }
    }
}

/// An outgoing edge of the phase graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRule {
    /// Target phase id.
    pub to: String,
    /// Trigger condition.
    pub when: TransitionTrigger,
    /// Lower fires first; ties break on target id ascending.
    pub priority: u32,
}

/// A node of the deliberation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub id: String,
    pub goal: String,
    pub prompt_guidance: Vec<String>,
    pub deliverables: Vec<Deliverable>,
    pub governance: Governance,
    pub stop_conditions: StopConditions,
    pub memory_policy: MemoryPolicy,
    pub evidence: EvidenceRequirements,
    pub quality_gates: Vec<String>,
    pub fallback: PhaseFallback,
    pub transitions: Vec<TransitionRule>,
}

/// How a phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseEnd {
    /// A motion passed and the phase closes on majority votes.
    MajorityVote,
    /// The round limit was reached without a passing motion.
    RoundLimit,
}

impl PhaseEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseEnd::MajorityVote => "MAJORITY_VOTE",
            PhaseEnd::RoundLimit => "ROUND_LIMIT",
        }
    }

    /// The transition trigger this ending corresponds to.
    pub fn trigger(&self) -> TransitionTrigger {
        match self {
            PhaseEnd::MajorityVote => TransitionTrigger::MajorityVote,
            PhaseEnd::RoundLimit => TransitionTrigger::RoundLimit,
        }
    }
}

impl std::fmt::Display for PhaseEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of running one phase to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResult {
    pub phase_id: String,
    pub phase_goal: String,
    pub ended_by: PhaseEnd,
    /// The adopted resolution: the winning motion's decision, or the phase
    /// fallback text on a round limit.
    pub final_resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_motion: Option<Motion>,
    pub rounds_completed: u32,
}
