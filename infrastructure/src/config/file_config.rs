//! Raw JSON configuration data types
//!
//! These structs represent the exact structure of the JSON config file.
//! They are deserialized directly and converted into validated domain
//! types by [`FileConfig::into_domain`]; every structural invariant is
//! checked by the domain's own validation so the operator sees all
//! violations in one pass, not just the first.

use council_domain::{
    ConfigViolation, CouncilConfig, Deliverable, EvidenceRequirements, ExecutionPolicy,
    FallbackAction, Governance, Member, MemoryPolicy, ModelRef, OutputKind, OutputPolicy,
    PhaseFallback, PhaseSpec, SessionPolicy, StopConditions, StoragePolicy, TransitionRule,
    TransitionTrigger, Verbosity, ViolationCode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Complete file configuration (raw JSON structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
    pub council_name: String,
    pub purpose: String,
    pub session_policy: FileSessionPolicy,
    pub phases: Vec<FilePhase>,
    pub output: FileOutput,
    pub documentation_review: FileDocumentationReview,
    pub members: Vec<FileMember>,
    pub turn_order: Option<Vec<String>>,
    pub storage: FileStorage,
    pub execution: FileExecution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSessionPolicy {
    pub entry_phase_id: String,
    pub max_phase_transitions: u32,
    pub phase_context_verbosity: Verbosity,
}

impl Default for FileSessionPolicy {
    fn default() -> Self {
        Self {
            entry_phase_id: String::new(),
            max_phase_transitions: 12,
            phase_context_verbosity: Verbosity::Standard,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileOutput {
    #[serde(rename = "type")]
    pub kind: OutputKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDocumentationReview {
    pub max_revision_rounds: u32,
}

impl Default for FileDocumentationReview {
    fn default() -> Self {
        Self {
            max_revision_rounds: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileStorage {
    pub root_dir: PathBuf,
    pub memory_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileExecution {
    pub require_human_approval: bool,
    pub default_executor_profile: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileMember {
    pub id: String,
    pub name: String,
    pub role: String,
    pub system_prompt: String,
    pub traits: Vec<String>,
    pub focus_weights: BTreeMap<String, f64>,
    pub model: FileModelRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileModelRef {
    pub provider: String,
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilePhase {
    pub id: String,
    pub goal: String,
    pub prompt_guidance: Vec<String>,
    pub deliverables: Vec<FileDeliverable>,
    pub governance: FileGovernance,
    pub stop_conditions: FileStopConditions,
    pub memory_policy: FileMemoryPolicy,
    pub evidence_requirements: FileEvidenceRequirements,
    pub quality_gates: Vec<String>,
    pub fallback: FileFallback,
    pub transitions: Vec<FileTransition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDeliverable {
    pub id: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileGovernance {
    pub require_seconding: bool,
    pub majority_threshold: f64,
    pub abstain_counts_as_no: bool,
}

impl Default for FileGovernance {
    fn default() -> Self {
        Self {
            require_seconding: true,
            majority_threshold: 0.5,
            abstain_counts_as_no: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileStopConditions {
    pub max_rounds: u32,
    pub end_on_majority_vote: bool,
}

impl Default for FileStopConditions {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            end_on_majority_vote: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileMemoryPolicy {
    pub read_member_memory: bool,
    pub write_member_memory: bool,
    pub write_council_memory: bool,
    pub include_prior_phase_summary: bool,
}

impl Default for FileMemoryPolicy {
    fn default() -> Self {
        Self {
            read_member_memory: true,
            write_member_memory: true,
            write_council_memory: true,
            include_prior_phase_summary: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileEvidenceRequirements {
    pub min_citations: u32,
    pub require_explicit_assumptions: bool,
    pub require_risk_register: bool,
}

/// Fallback in its raw wire shape; the action keyword is validated during
/// conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileFallback {
    pub resolution: String,
    pub action: String,
    pub transition_to_phase_id: Option<String>,
}

impl Default for FileFallback {
    fn default() -> Self {
        Self {
            resolution: "No consensus was reached before the round limit.".to_string(),
            action: "END_SESSION".to_string(),
            transition_to_phase_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileTransition {
    pub to: String,
    pub when: Option<TransitionTrigger>,
    pub priority: u32,
}

impl FileConfig {
    /// Convert into the validated domain configuration, accumulating every
    /// violation (conversion problems plus the domain's own invariants).
    pub fn into_domain(self) -> Result<CouncilConfig, Vec<ConfigViolation>> {
        let mut violations = Vec::new();

        let phases = self
            .phases
            .into_iter()
            .map(|phase| phase.into_domain(&mut violations))
            .collect();

        let config = CouncilConfig {
            name: self.council_name,
            purpose: self.purpose,
            members: self.members.into_iter().map(FileMember::into_domain).collect(),
            turn_order: self.turn_order,
            phases,
            session: SessionPolicy {
                entry_phase_id: self.session_policy.entry_phase_id,
                max_phase_transitions: self.session_policy.max_phase_transitions,
                phase_context_verbosity: self.session_policy.phase_context_verbosity,
            },
            output: OutputPolicy {
                kind: self.output.kind,
                max_revision_rounds: self.documentation_review.max_revision_rounds,
            },
            storage: StoragePolicy {
                root_dir: self.storage.root_dir,
                memory_dir: self.storage.memory_dir,
            },
            execution: ExecutionPolicy {
                require_human_approval: self.execution.require_human_approval,
                default_executor_profile: self.execution.default_executor_profile,
            },
        };

        if let Err(more) = config.validate() {
            violations.extend(more);
        }

        if violations.is_empty() {
            Ok(config)
        } else {
            Err(violations)
        }
    }
}

impl FileMember {
    fn into_domain(self) -> Member {
        Member {
            id: self.id,
            name: self.name,
            role: self.role,
            system_prompt: self.system_prompt,
            traits: self.traits,
            focus_weights: self.focus_weights,
            model: ModelRef {
                provider: self.model.provider,
                model: self.model.model,
                temperature: self.model.temperature,
                max_tokens: self.model.max_tokens,
                base_url: self.model.base_url,
                api_key_env: self.model.api_key_env,
            },
        }
    }
}

impl FilePhase {
    fn into_domain(self, violations: &mut Vec<ConfigViolation>) -> PhaseSpec {
        let action = match self.fallback.action.as_str() {
            "END_SESSION" => FallbackAction::EndSession,
            "TRANSITION" => match self.fallback.transition_to_phase_id {
                Some(to) => FallbackAction::Transition { to },
                None => {
                    violations.push(ConfigViolation::new(
                        ViolationCode::EmptyField(format!(
                            "{}.fallback.transitionToPhaseId",
                            self.id
                        )),
                        format!(
                            "phase {}: fallback action TRANSITION requires transitionToPhaseId",
                            self.id
                        ),
                    ));
                    FallbackAction::EndSession
                }
            },
            other => {
                violations.push(ConfigViolation::new(
                    ViolationCode::EmptyField(format!("{}.fallback.action", self.id)),
                    format!(
                        "phase {}: unknown fallback action \"{}\" (expected END_SESSION or TRANSITION)",
                        self.id, other
                    ),
                ));
                FallbackAction::EndSession
            }
        };

        let transitions = self
            .transitions
            .into_iter()
            .map(|t| TransitionRule {
                to: t.to,
                when: t.when.unwrap_or(TransitionTrigger::Always),
                priority: t.priority,
            })
            .collect();

        PhaseSpec {
            id: self.id,
            goal: self.goal,
            prompt_guidance: self.prompt_guidance,
            deliverables: self
                .deliverables
                .into_iter()
                .map(|d| Deliverable {
                    id: d.id,
                    description: d.description,
                    required: d.required,
                })
                .collect(),
            governance: Governance {
                require_seconding: self.governance.require_seconding,
                majority_threshold: self.governance.majority_threshold,
                abstain_counts_as_no: self.governance.abstain_counts_as_no,
            },
            stop_conditions: StopConditions {
                max_rounds: self.stop_conditions.max_rounds,
                end_on_majority_vote: self.stop_conditions.end_on_majority_vote,
            },
            memory_policy: MemoryPolicy {
                read_member_memory: self.memory_policy.read_member_memory,
                write_member_memory: self.memory_policy.write_member_memory,
                write_council_memory: self.memory_policy.write_council_memory,
                include_prior_phase_summary: self.memory_policy.include_prior_phase_summary,
            },
            evidence: EvidenceRequirements {
                min_citations: self.evidence_requirements.min_citations,
                require_explicit_assumptions: self
                    .evidence_requirements
                    .require_explicit_assumptions,
                require_risk_register: self.evidence_requirements.require_risk_register,
            },
            quality_gates: self.quality_gates,
            fallback: PhaseFallback {
                resolution: self.fallback.resolution,
                action,
            },
            transitions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_json() -> serde_json::Value {
        json!({
            "councilName": "Arch Council",
            "purpose": "Settle architecture questions",
            "sessionPolicy": {"entryPhaseId": "debate"},
            "phases": [{
                "id": "debate",
                "goal": "Pick a direction",
                "fallback": {"resolution": "No consensus.", "action": "END_SESSION"}
            }],
            "members": [
                {"id": "a", "name": "Ada", "role": "architect",
                 "systemPrompt": "x", "model": {"provider": "openai-compatible", "model": "m"}},
                {"id": "b", "name": "Bob", "role": "skeptic",
                 "systemPrompt": "x", "model": {"provider": "openai-compatible", "model": "m"}},
                {"id": "c", "name": "Cyd", "role": "operator",
                 "systemPrompt": "x", "model": {"provider": "openai-compatible", "model": "m"}}
            ]
        })
    }

    #[test]
    fn test_minimal_config_converts() {
        let file: FileConfig = serde_json::from_value(minimal_json()).unwrap();
        let config = file.into_domain().unwrap();
        assert_eq!(config.name, "Arch Council");
        assert_eq!(config.members.len(), 3);
        assert_eq!(config.session.max_phase_transitions, 12);
        assert_eq!(config.phases[0].stop_conditions.max_rounds, 3);
        assert!(config.phases[0].governance.require_seconding);
    }

    #[test]
    fn test_transition_fallback_requires_target() {
        let mut value = minimal_json();
        value["phases"][0]["fallback"] = json!({"resolution": "r", "action": "TRANSITION"});
        let file: FileConfig = serde_json::from_value(value).unwrap();
        let violations = file.into_domain().unwrap_err();
        assert!(violations
            .iter()
            .any(|v| v.message.contains("transitionToPhaseId")));
    }

    #[test]
    fn test_unknown_fallback_action_rejected() {
        let mut value = minimal_json();
        value["phases"][0]["fallback"] = json!({"resolution": "r", "action": "SHRUG"});
        let file: FileConfig = serde_json::from_value(value).unwrap();
        assert!(file.into_domain().is_err());
    }

    #[test]
    fn test_domain_violations_surface() {
        let mut value = minimal_json();
        value["members"].as_array_mut().unwrap().pop();
        let file: FileConfig = serde_json::from_value(value).unwrap();
        let violations = file.into_domain().unwrap_err();
        assert!(violations.iter().any(|v| v.message.contains("odd")));
    }

    #[test]
    fn test_transition_triggers_parse() {
        let mut value = minimal_json();
        value["phases"][0]["transitions"] =
            json!([{"to": "debate", "when": "MAJORITY_VOTE", "priority": 1}]);
        let file: FileConfig = serde_json::from_value(value).unwrap();
        let config = file.into_domain().unwrap();
        assert_eq!(
            config.phases[0].transitions[0].when,
            TransitionTrigger::MajorityVote
        );
    }
}
