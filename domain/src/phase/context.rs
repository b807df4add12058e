//! Phase-context packet injected into member prompts.
//!
//! The packet condenses where the deliberation currently stands: phase
//! identity and counters, outstanding deliverables and quality gates, open
//! evidence gaps, and the legal next phases. Higher verbosity adds a digest
//! of the whole graph or the packet itself as JSON.

use super::{PhaseSpec, TransitionTrigger};
use crate::council::Verbosity;
use serde::Serialize;

/// Condensed view of the current phase for prompt injection.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseContextPacket {
    pub phase_id: String,
    pub goal: String,
    pub round: u32,
    pub max_rounds: u32,
    pub deliverables: Vec<String>,
    pub quality_gates: Vec<String>,
    pub evidence_gaps: Vec<String>,
    /// `(target phase id, trigger)` pairs.
    pub next_phases: Vec<(String, String)>,
    /// One line per phase: `id -> targets` over the whole graph.
    pub graph_digest: Vec<String>,
}

impl PhaseContextPacket {
    /// Build the packet for `phase` at `round`, with the full graph for the
    /// digest.
    pub fn new(phase: &PhaseSpec, all_phases: &[PhaseSpec], round: u32) -> Self {
        let deliverables = phase
            .deliverables
            .iter()
            .map(|d| {
                let marker = if d.required { "required" } else { "optional" };
                format!("{} ({}): {}", d.id, marker, d.description)
            })
            .collect();

        let mut evidence_gaps = Vec::new();
        if phase.evidence.min_citations > 0 {
            evidence_gaps.push(format!(
                "cite at least {} sources for factual claims",
                phase.evidence.min_citations
            ));
        }
        if phase.evidence.require_explicit_assumptions {
            evidence_gaps.push("state assumptions explicitly".to_string());
        }
        if phase.evidence.require_risk_register {
            evidence_gaps.push("maintain a risk register entry for open risks".to_string());
        }

        let next_phases = phase
            .transitions
            .iter()
            .map(|t| (t.to.clone(), t.when.as_str().to_string()))
            .collect();

        let graph_digest = all_phases
            .iter()
            .map(|p| {
                let targets: Vec<String> = p
                    .transitions
                    .iter()
                    .map(|t| format!("{}[{}]", t.to, short_trigger(t.when)))
                    .collect();
                if targets.is_empty() {
                    format!("{} -> (end)", p.id)
                } else {
                    format!("{} -> {}", p.id, targets.join(", "))
                }
            })
            .collect();

        Self {
            phase_id: phase.id.clone(),
            goal: phase.goal.clone(),
            round,
            max_rounds: phase.stop_conditions.max_rounds,
            deliverables,
            quality_gates: phase.quality_gates.clone(),
            evidence_gaps,
            next_phases,
            graph_digest,
        }
    }

    /// Render the packet at the configured verbosity.
    pub fn render(&self, verbosity: Verbosity) -> String {
        let mut out = format!(
            "Phase: {} (round {}/{})\nGoal: {}\n",
            self.phase_id, self.round, self.max_rounds, self.goal
        );

        if !self.deliverables.is_empty() {
            out.push_str("Pending deliverables:\n");
            for d in &self.deliverables {
                out.push_str(&format!("  - {}\n", d));
            }
        }
        if !self.quality_gates.is_empty() {
            out.push_str("Quality gates:\n");
            for g in &self.quality_gates {
                out.push_str(&format!("  - {}\n", g));
            }
        }
        if !self.evidence_gaps.is_empty() {
            out.push_str("Evidence expectations:\n");
            for gap in &self.evidence_gaps {
                out.push_str(&format!("  - {}\n", gap));
            }
        }
        if !self.next_phases.is_empty() {
            out.push_str("Possible next phases:\n");
            for (target, trigger) in &self.next_phases {
                out.push_str(&format!("  - {} (on {})\n", target, trigger));
            }
        }

        if verbosity == Verbosity::Minimal {
            return out;
        }

        out.push_str("Phase graph:\n");
        for line in &self.graph_digest {
            out.push_str(&format!("  {}\n", line));
        }

        if verbosity == Verbosity::Full
            && let Ok(json) = serde_json::to_string(self)
        {
            out.push_str("Full context packet (JSON):\n");
            out.push_str(&json);
            out.push('\n');
        }

        out
    }
}

fn short_trigger(trigger: TransitionTrigger) -> &'static str {
    match trigger {
        TransitionTrigger::MajorityVote => "vote",
        TransitionTrigger::RoundLimit => "limit",
        TransitionTrigger::Always => "always",
    }
}
