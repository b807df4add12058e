//! Council member entity and its model reference.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque reference to the model backing a member.
///
/// The engine never interprets these fields; they are handed to whatever
/// gateway adapter resolves members to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRef {
    /// Provider identifier (e.g. "openai-compatible").
    pub provider: String,
    /// Model name as the provider knows it.
    pub model: String,
    /// Sampling temperature override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Response token cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Endpoint base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// A council participant (Entity)
///
/// Members are identified by a unique, stable id. Their role, traits, and
/// focus weights shape the prompts they receive; the model reference decides
/// which oracle answers them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique, stable identifier. Used as actor id in events and as the
    /// member's directory name in the memory store.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role within the council (e.g. "architect", "skeptic").
    pub role: String,
    /// Member-specific system prompt, prepended to every call.
    pub system_prompt: String,
    /// Behavioral traits injected into prompts.
    #[serde(default)]
    pub traits: Vec<String>,
    /// Topic emphasis weights (topic name to weight).
    #[serde(default)]
    pub focus_weights: BTreeMap<String, f64>,
    /// The model backing this member.
    pub model: ModelRef,
}

impl Member {
    /// Render the traits list for prompt injection.
    pub fn traits_line(&self) -> String {
        if self.traits.is_empty() {
            "none declared".to_string()
        } else {
            self.traits.join(", ")
        }
    }

    /// Render the focus weights for prompt injection, heaviest first.
    pub fn focus_line(&self) -> String {
        if self.focus_weights.is_empty() {
            return "balanced".to_string();
        }
        let mut entries: Vec<_> = self.focus_weights.iter().collect();
        entries.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries
            .iter()
            .map(|(topic, weight)| format!("{} ({:.1})", topic, weight))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_with_focus(focus: &[(&str, f64)]) -> Member {
        Member {
            id: "a".into(),
            name: "Ada".into(),
            role: "architect".into(),
            system_prompt: "You design systems.".into(),
            traits: vec!["rigorous".into(), "terse".into()],
            focus_weights: focus
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            model: ModelRef {
                provider: "openai-compatible".into(),
                model: "test-model".into(),
                temperature: None,
                max_tokens: None,
                base_url: None,
                api_key_env: None,
            },
        }
    }

    #[test]
    fn test_traits_line() {
        let member = member_with_focus(&[]);
        assert_eq!(member.traits_line(), "rigorous, terse");
    }

    #[test]
    fn test_focus_line_sorted_by_weight() {
        let member = member_with_focus(&[("safety", 0.2), ("cost", 0.8)]);
        assert_eq!(member.focus_line(), "cost (0.8), safety (0.2)");
    }

    #[test]
    fn test_focus_line_empty() {
        let member = member_with_focus(&[]);
        assert_eq!(member.focus_line(), "balanced");
    }
}
