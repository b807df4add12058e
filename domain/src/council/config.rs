//! The immutable council configuration.

use super::member::Member;
use super::validation::{ConfigViolation, ViolationCode};
use crate::phase::{FallbackAction, PhaseSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::PathBuf;

/// How much phase context is injected into prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Minimal,
    #[default]
    Standard,
    Full,
}

/// Session-wide sequencing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPolicy {
    /// Phase the session starts in.
    pub entry_phase_id: String,
    /// Hard cap on completed phases. Exceeding it forces termination with a
    /// round-limit outcome so cyclic graphs cannot run forever.
    pub max_phase_transitions: u32,
    /// Verbosity of the phase-context packet injected into prompts.
    pub phase_context_verbosity: Verbosity,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            entry_phase_id: String::new(),
            max_phase_transitions: 12,
            phase_context_verbosity: Verbosity::Standard,
        }
    }
}

/// What the session produces beyond the transcript and summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    None,
    Documentation,
}

/// Output artifact policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputPolicy {
    pub kind: OutputKind,
    /// Revision rounds for the documentation review loop. Total draft
    /// attempts = this value + 1.
    pub max_revision_rounds: u32,
}

/// Where session and memory artifacts are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoragePolicy {
    pub root_dir: PathBuf,
    pub memory_dir: PathBuf,
}

/// Execution handoff gating.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// When true, the handoff descriptor is only approved if the operator
    /// passed the approval flag.
    pub require_human_approval: bool,
    /// Profile name recorded in the handoff for downstream executors.
    pub default_executor_profile: String,
}

/// Immutable input specification for a session (Entity)
///
/// Loaded once, validated once, never mutated. The orchestrator treats this
/// as the single source of truth for membership, turn order, and the phase
/// graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Council display name.
    pub name: String,
    /// What this council exists to decide.
    pub purpose: String,
    /// Ordered members. Declaration order is the default turn order.
    pub members: Vec<Member>,
    /// Explicit turn order (permutation of member ids), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_order: Option<Vec<String>>,
    /// The deliberation phase graph.
    pub phases: Vec<PhaseSpec>,
    pub session: SessionPolicy,
    pub output: OutputPolicy,
    pub storage: StoragePolicy,
    pub execution: ExecutionPolicy,
}

impl CouncilConfig {
    /// Look up a member by id.
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Look up a phase by id.
    pub fn phase(&self, id: &str) -> Option<&PhaseSpec> {
        self.phases.iter().find(|p| p.id == id)
    }

    /// Number of members. This is the denominator for every vote.
    pub fn council_size(&self) -> usize {
        self.members.len()
    }

    /// Members in speaking order: the explicit `turn_order` when present,
    /// declaration order otherwise. Applied identically to every round.
    pub fn speaking_order(&self) -> Vec<&Member> {
        match &self.turn_order {
            Some(order) => order
                .iter()
                .filter_map(|id| self.member(id))
                .collect(),
            None => self.members.iter().collect(),
        }
    }

    /// Validate every structural invariant, returning all violations.
    ///
    /// Checks membership (odd count >= 3, unique ids, turn-order
    /// permutation), phase identity (unique ids, entry phase exists,
    /// transition and fallback targets exist), governance bounds, and that
    /// every declared phase is reachable from the entry phase.
    pub fn validate(&self) -> Result<(), Vec<ConfigViolation>> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push(ConfigViolation::new(
                ViolationCode::EmptyField("councilName".into()),
                "councilName must be a non-empty string",
            ));
        }
        if self.purpose.trim().is_empty() {
            violations.push(ConfigViolation::new(
                ViolationCode::EmptyField("purpose".into()),
                "purpose must be a non-empty string",
            ));
        }

        self.validate_members(&mut violations);
        self.validate_phases(&mut violations);
        self.validate_reachability(&mut violations);

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    fn validate_members(&self, violations: &mut Vec<ConfigViolation>) {
        let count = self.members.len();
        if count < 3 || count % 2 == 0 {
            violations.push(ConfigViolation::new(
                ViolationCode::InvalidCouncilSize(count),
                format!(
                    "council size must be odd and at least 3, got {}",
                    count
                ),
            ));
        }

        let mut seen = HashSet::new();
        for member in &self.members {
            if !seen.insert(member.id.as_str()) {
                violations.push(ConfigViolation::new(
                    ViolationCode::DuplicateMemberId(member.id.clone()),
                    format!("duplicate member id: {}", member.id),
                ));
            }
        }

        if let Some(order) = &self.turn_order {
            let declared: BTreeSet<&str> = self.members.iter().map(|m| m.id.as_str()).collect();
            let ordered: BTreeSet<&str> = order.iter().map(String::as_str).collect();
            if order.len() != self.members.len() || declared != ordered {
                violations.push(ConfigViolation::new(
                    ViolationCode::InvalidTurnOrder,
                    "turnOrder must be a permutation of member ids",
                ));
            }
        }
    }

    fn validate_phases(&self, violations: &mut Vec<ConfigViolation>) {
        if self.phases.is_empty() {
            violations.push(ConfigViolation::new(
                ViolationCode::EmptyField("phases".into()),
                "at least one phase is required",
            ));
            return;
        }

        let mut seen = HashSet::new();
        for phase in &self.phases {
            if !seen.insert(phase.id.as_str()) {
                violations.push(ConfigViolation::new(
                    ViolationCode::DuplicatePhaseId(phase.id.clone()),
                    format!("duplicate phase id: {}", phase.id),
                ));
            }
        }

        let ids: HashSet<&str> = self.phases.iter().map(|p| p.id.as_str()).collect();

        if !ids.contains(self.session.entry_phase_id.as_str()) {
            violations.push(ConfigViolation::new(
                ViolationCode::UnknownPhase(self.session.entry_phase_id.clone()),
                format!(
                    "entryPhaseId references unknown phase: {}",
                    self.session.entry_phase_id
                ),
            ));
        }
        if self.session.max_phase_transitions < 1 {
            violations.push(ConfigViolation::new(
                ViolationCode::InvalidBound("maxPhaseTransitions".into()),
                "maxPhaseTransitions must be at least 1",
            ));
        }

        for phase in &self.phases {
            let threshold = phase.governance.majority_threshold;
            if !(threshold > 0.0 && threshold <= 1.0) {
                violations.push(ConfigViolation::new(
                    ViolationCode::InvalidThreshold {
                        phase: phase.id.clone(),
                        threshold,
                    },
                    format!(
                        "phase {}: majorityThreshold {} outside (0, 1]",
                        phase.id, threshold
                    ),
                ));
            }
            if phase.stop_conditions.max_rounds < 1 {
                violations.push(ConfigViolation::new(
                    ViolationCode::InvalidBound(format!("{}.maxRounds", phase.id)),
                    format!("phase {}: maxRounds must be at least 1", phase.id),
                ));
            }
            for rule in &phase.transitions {
                if !ids.contains(rule.to.as_str()) {
                    violations.push(ConfigViolation::new(
                        ViolationCode::UnknownPhase(rule.to.clone()),
                        format!(
                            "phase {}: transition targets unknown phase {}",
                            phase.id, rule.to
                        ),
                    ));
                }
            }
            if let FallbackAction::Transition { to } = &phase.fallback.action
                && !ids.contains(to.as_str())
            {
                violations.push(ConfigViolation::new(
                    ViolationCode::UnknownPhase(to.clone()),
                    format!(
                        "phase {}: fallback targets unknown phase {}",
                        phase.id, to
                    ),
                ));
            }
        }
    }

    /// BFS from the entry phase over transition edges and fallback edges.
    /// Every declared phase must be reachable.
    fn validate_reachability(&self, violations: &mut Vec<ConfigViolation>) {
        let ids: HashSet<&str> = self.phases.iter().map(|p| p.id.as_str()).collect();
        if !ids.contains(self.session.entry_phase_id.as_str()) {
            return; // already reported above
        }

        let mut reached: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(self.session.entry_phase_id.as_str());
        reached.insert(self.session.entry_phase_id.as_str());

        while let Some(current) = queue.pop_front() {
            let Some(phase) = self.phase(current) else {
                continue;
            };
            let mut targets: Vec<&str> = phase.transitions.iter().map(|t| t.to.as_str()).collect();
            if let FallbackAction::Transition { to } = &phase.fallback.action {
                targets.push(to.as_str());
            }
            for target in targets {
                if ids.contains(target) && reached.insert(target) {
                    queue.push_back(target);
                }
            }
        }

        for phase in &self.phases {
            if !reached.contains(phase.id.as_str()) {
                violations.push(ConfigViolation::new(
                    ViolationCode::UnreachablePhase(phase.id.clone()),
                    format!(
                        "phase {} is not reachable from entry phase {}",
                        phase.id, self.session.entry_phase_id
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::member::ModelRef;
    use crate::phase::{
        Governance, PhaseFallback, StopConditions, TransitionRule, TransitionTrigger,
    };

    fn member(id: &str) -> Member {
        Member {
            id: id.into(),
            name: id.to_uppercase(),
            role: "generalist".into(),
            system_prompt: "You deliberate.".into(),
            traits: vec![],
            focus_weights: Default::default(),
            model: ModelRef {
                provider: "openai-compatible".into(),
                model: "test".into(),
                temperature: None,
                max_tokens: None,
                base_url: None,
                api_key_env: None,
            },
        }
    }

    fn phase(id: &str, transitions: Vec<TransitionRule>) -> PhaseSpec {
        PhaseSpec {
            id: id.into(),
            goal: format!("goal of {}", id),
            prompt_guidance: vec![],
            deliverables: vec![],
            governance: Governance::default(),
            stop_conditions: StopConditions {
                max_rounds: 3,
                end_on_majority_vote: true,
            },
            memory_policy: Default::default(),
            evidence: Default::default(),
            quality_gates: vec![],
            fallback: PhaseFallback {
                resolution: "No consensus reached.".into(),
                action: FallbackAction::EndSession,
            },
            transitions,
        }
    }

    fn config(members: Vec<Member>, phases: Vec<PhaseSpec>, entry: &str) -> CouncilConfig {
        CouncilConfig {
            name: "Test Council".into(),
            purpose: "Decide things".into(),
            members,
            turn_order: None,
            phases,
            session: SessionPolicy {
                entry_phase_id: entry.into(),
                ..Default::default()
            },
            output: Default::default(),
            storage: Default::default(),
            execution: Default::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase("debate", vec![])],
            "debate",
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_even_council_rejected() {
        let cfg = config(
            vec![member("a"), member("b"), member("c"), member("d")],
            vec![phase("debate", vec![])],
            "debate",
        );
        let violations = cfg.validate().unwrap_err();
        assert!(violations
            .iter()
            .any(|v| matches!(v.code, ViolationCode::InvalidCouncilSize(4))));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let cfg = config(
            vec![member("a"), member("a"), member("c")],
            vec![phase("debate", vec![])],
            "debate",
        );
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_unreachable_phase_rejected() {
        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase("debate", vec![]), phase("island", vec![])],
            "debate",
        );
        let violations = cfg.validate().unwrap_err();
        assert!(violations
            .iter()
            .any(|v| matches!(&v.code, ViolationCode::UnreachablePhase(id) if id == "island")));
    }

    #[test]
    fn test_fallback_edge_counts_for_reachability() {
        let mut entry = phase("debate", vec![]);
        entry.fallback.action = FallbackAction::Transition {
            to: "retro".into(),
        };
        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![entry, phase("retro", vec![])],
            "debate",
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_transition_to_unknown_phase_rejected() {
        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase(
                "debate",
                vec![TransitionRule {
                    to: "ghost".into(),
                    when: TransitionTrigger::Always,
                    priority: 0,
                }],
            )],
            "debate",
        );
        let violations = cfg.validate().unwrap_err();
        assert!(violations
            .iter()
            .any(|v| matches!(&v.code, ViolationCode::UnknownPhase(id) if id == "ghost")));
    }

    #[test]
    fn test_turn_order_must_be_permutation() {
        let mut cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase("debate", vec![])],
            "debate",
        );
        cfg.turn_order = Some(vec!["a".into(), "b".into()]);
        assert!(cfg.validate().is_err());

        cfg.turn_order = Some(vec!["c".into(), "a".into(), "b".into()]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_speaking_order_uses_explicit_turn_order() {
        let mut cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase("debate", vec![])],
            "debate",
        );
        cfg.turn_order = Some(vec!["c".into(), "a".into(), "b".into()]);
        let order: Vec<&str> = cfg.speaking_order().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let mut p = phase("debate", vec![]);
        p.governance.majority_threshold = 1.5;
        let cfg = config(vec![member("a"), member("b"), member("c")], vec![p], "debate");
        assert!(cfg.validate().is_err());
    }
}
