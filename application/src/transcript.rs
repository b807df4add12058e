//! Transcript rendering: the human-readable mirror of the event log.
//!
//! Each event maps to at most one markdown section. Bookkeeping events
//! (TURN_ACTION, the per-ballot election events) render nothing; they are
//! visible in `events.json`.

use council_domain::{Event, EventType};
use serde_json::Value;

fn payload_str<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Render an event as a transcript section, or `None` for events that do
/// not appear in the human-readable view.
pub fn render(event: &Event) -> Option<String> {
    let actor = event.actor_id.as_deref().unwrap_or("council");
    let payload = &event.payload;

    let section = match event.event_type {
        EventType::SessionStarted => format!(
            "# {}\n\n> {}\n",
            payload_str(payload, "councilName"),
            payload_str(payload, "humanPrompt"),
        ),
        EventType::LeaderElected => format!(
            "**Leader elected:** {}\n",
            payload_str(payload, "leaderId")
        ),
        EventType::PhaseStarted => format!(
            "\n## Phase: {} — {}\n",
            payload_str(payload, "phaseId"),
            payload_str(payload, "goal"),
        ),
        EventType::RoundStarted => format!("\n### Round {}\n", event.round),
        EventType::MessageContributed => format!(
            "**{}**: {}\n",
            actor,
            payload_str(payload, "message")
        ),
        EventType::PassRecorded => format!(
            "_{} passes ({})_\n",
            actor,
            payload_str(payload, "reason")
        ),
        EventType::MotionCalled => format!(
            "**Motion by {}** — {}: {}\n",
            actor,
            payload_str(payload, "title"),
            payload_str(payload, "text"),
        ),
        EventType::MotionSeconded => format!("_Seconded by {}_\n", actor),
        EventType::MotionNotSeconded => "_Motion dies for lack of a second._\n".to_string(),
        EventType::VoteCast => format!(
            "- {} votes {}: {}\n",
            actor,
            payload_str(payload, "ballot"),
            payload_str(payload, "rationale"),
        ),
        EventType::VoteResult => {
            let passed = payload
                .get("passed")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!(
                "**Vote {}** ({} yes / {} effective no of {})\n",
                if passed { "passes" } else { "fails" },
                payload.get("yesVotes").and_then(Value::as_u64).unwrap_or(0),
                payload
                    .get("noVotesEffective")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                payload
                    .get("totalCouncilSize")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
            )
        }
        EventType::RoundLimitReached => {
            "_Round limit reached; the phase fallback applies._\n".to_string()
        }
        EventType::PhaseCompleted => format!(
            "\n**Phase complete** ({}): {}\n",
            payload_str(payload, "endedBy"),
            payload_str(payload, "finalResolution"),
        ),
        EventType::LeaderSummaryCreated => "\n## Leader summary\n".to_string(),
        EventType::DocumentDraftWritten | EventType::DocumentRevisionWritten => format!(
            "_Documentation draft v{} written._\n",
            payload.get("revision").and_then(Value::as_u64).unwrap_or(0)
        ),
        EventType::DocumentApprovalVoteResult => {
            let passed = payload
                .get("passed")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!(
                "_Documentation approval vote {}._\n",
                if passed { "passes" } else { "fails" }
            )
        }
        EventType::DocumentApproved => "_Documentation approved._\n".to_string(),
        EventType::DocumentRejected => {
            "_Documentation not approved within the revision budget._\n".to_string()
        }
        EventType::SessionClosed => "\n---\n_Session closed._\n".to_string(),
        // Bookkeeping events carry no transcript section.
        EventType::TurnAction
        | EventType::LeaderElectionBallot
        | EventType::SecondingResponse
        | EventType::DocumentApprovalVoteCalled
        | EventType::ExecutionHandoffCreated => return None,
    };

    Some(section)
}
