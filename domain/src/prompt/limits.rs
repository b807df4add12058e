//! Hard per-field length limits quoted in every prompt.

pub const MAX_MESSAGE_CHARS: usize = 1200;
pub const MAX_REASON_CHARS: usize = 240;
pub const MAX_RATIONALE_CHARS: usize = 300;
pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_MOTION_TEXT_CHARS: usize = 800;
pub const MAX_DECISION_CHARS: usize = 400;

/// The length table injected into turn prompts.
pub fn length_table() -> String {
    format!(
        "Hard length limits (characters): message {msg}, reason {reason}, rationale {rationale}, \
         title {title}, motion text {text}, decisionIfPass {decision}.",
        msg = MAX_MESSAGE_CHARS,
        reason = MAX_REASON_CHARS,
        rationale = MAX_RATIONALE_CHARS,
        title = MAX_TITLE_CHARS,
        text = MAX_MOTION_TEXT_CHARS,
        decision = MAX_DECISION_CHARS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_table_mentions_every_field() {
        let table = length_table();
        for field in ["message", "reason", "rationale", "title", "decisionIfPass"] {
            assert!(table.contains(field), "missing {}", field);
        }
    }
}
