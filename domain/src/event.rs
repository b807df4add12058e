//! The typed, append-only event model.
//!
//! Every protocol step is recorded as an [`Event`] with a strictly
//! monotonic sequence number. The event stream is the audit trail: its
//! order exactly matches the causal order of the state machine, and it is
//! the only place ballots become visible ("blind voting" means no VOTE_CAST
//! event exists until every ballot for the motion has been collected).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sub-state of the per-turn state machine an event was emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseState {
    Discussion,
    Seconding,
    Voting,
}

impl PhaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseState::Discussion => "DISCUSSION",
            PhaseState::Seconding => "SECONDING",
            PhaseState::Voting => "VOTING",
        }
    }
}

/// Closed set of protocol event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "SESSION_STARTED")]
    SessionStarted,
    #[serde(rename = "LEADER_ELECTION_BALLOT")]
    LeaderElectionBallot,
    #[serde(rename = "LEADER_ELECTED")]
    LeaderElected,
    #[serde(rename = "PHASE_STARTED")]
    PhaseStarted,
    #[serde(rename = "ROUND_STARTED")]
    RoundStarted,
    #[serde(rename = "TURN_ACTION")]
    TurnAction,
    #[serde(rename = "MESSAGE_CONTRIBUTED")]
    MessageContributed,
    #[serde(rename = "PASS_RECORDED")]
    PassRecorded,
    #[serde(rename = "MOTION_CALLED")]
    MotionCalled,
    #[serde(rename = "SECONDING_RESPONSE")]
    SecondingResponse,
    #[serde(rename = "MOTION_SECONDED")]
    MotionSeconded,
    #[serde(rename = "MOTION_NOT_SECONDED")]
    MotionNotSeconded,
    #[serde(rename = "VOTE_CAST")]
    VoteCast,
    #[serde(rename = "VOTE_RESULT")]
    VoteResult,
    #[serde(rename = "ROUND_LIMIT_REACHED")]
    RoundLimitReached,
    #[serde(rename = "PASS_COMPLETED")]
    PhaseCompleted,
    #[serde(rename = "LEADER_SUMMARY_CREATED")]
    LeaderSummaryCreated,
    #[serde(rename = "DOCUMENT_DRAFT_WRITTEN")]
    DocumentDraftWritten,
    #[serde(rename = "DOCUMENT_REVISION_WRITTEN")]
    DocumentRevisionWritten,
    #[serde(rename = "DOCUMENT_APPROVAL_VOTE_CALLED")]
    DocumentApprovalVoteCalled,
    #[serde(rename = "DOCUMENT_APPROVAL_VOTE_RESULT")]
    DocumentApprovalVoteResult,
    #[serde(rename = "DOCUMENT_APPROVED")]
    DocumentApproved,
    #[serde(rename = "DOCUMENT_REJECTED")]
    DocumentRejected,
    #[serde(rename = "EXECUTION_HANDOFF_CREATED")]
    ExecutionHandoffCreated,
    #[serde(rename = "SESSION_CLOSED")]
    SessionClosed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionStarted => "SESSION_STARTED",
            EventType::LeaderElectionBallot => "LEADER_ELECTION_BALLOT",
            EventType::LeaderElected => "LEADER_ELECTED",
            EventType::PhaseStarted => "PHASE_STARTED",
            EventType::RoundStarted => "ROUND_STARTED",
            EventType::TurnAction => "TURN_ACTION",
            EventType::MessageContributed => "MESSAGE_CONTRIBUTED",
            EventType::PassRecorded => "PASS_RECORDED",
            EventType::MotionCalled => "MOTION_CALLED",
            EventType::SecondingResponse => "SECONDING_RESPONSE",
            EventType::MotionSeconded => "MOTION_SECONDED",
            EventType::MotionNotSeconded => "MOTION_NOT_SECONDED",
            EventType::VoteCast => "VOTE_CAST",
            EventType::VoteResult => "VOTE_RESULT",
            EventType::RoundLimitReached => "ROUND_LIMIT_REACHED",
            EventType::PhaseCompleted => "PASS_COMPLETED",
            EventType::LeaderSummaryCreated => "LEADER_SUMMARY_CREATED",
            EventType::DocumentDraftWritten => "DOCUMENT_DRAFT_WRITTEN",
            EventType::DocumentRevisionWritten => "DOCUMENT_REVISION_WRITTEN",
            EventType::DocumentApprovalVoteCalled => "DOCUMENT_APPROVAL_VOTE_CALLED",
            EventType::DocumentApprovalVoteResult => "DOCUMENT_APPROVAL_VOTE_RESULT",
            EventType::DocumentApproved => "DOCUMENT_APPROVED",
            EventType::DocumentRejected => "DOCUMENT_REJECTED",
            EventType::ExecutionHandoffCreated => "EXECUTION_HANDOFF_CREATED",
            EventType::SessionClosed => "SESSION_CLOSED",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ordered protocol record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Strictly monotonic within a session.
    pub seq: u64,
    pub session_id: String,
    /// ISO-8601 timestamp, supplied by the clock port.
    pub timestamp: String,
    pub phase_state: PhaseState,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub round: u32,
    pub turn_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serialization_shape() {
        let event = Event {
            seq: 3,
            session_id: "sess-1".into(),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            phase_state: PhaseState::Voting,
            event_type: EventType::VoteCast,
            round: 1,
            turn_index: 4,
            actor_id: Some("b".into()),
            payload: json!({"ballot": "YES"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["seq"], 3);
        assert_eq!(value["type"], "VOTE_CAST");
        assert_eq!(value["phaseState"], "VOTING");
        assert_eq!(value["actorId"], "b");
        assert_eq!(value["payload"]["ballot"], "YES");
    }

    #[test]
    fn test_absent_actor_omitted() {
        let event = Event {
            seq: 1,
            session_id: "sess-1".into(),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            phase_state: PhaseState::Discussion,
            event_type: EventType::RoundStarted,
            round: 1,
            turn_index: 0,
            actor_id: None,
            payload: json!({}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("actorId").is_none());
    }

    #[test]
    fn test_phase_completed_wire_name() {
        assert_eq!(EventType::PhaseCompleted.as_str(), "PASS_COMPLETED");
        let value = serde_json::to_value(EventType::PhaseCompleted).unwrap();
        assert_eq!(value, "PASS_COMPLETED");
    }

    #[test]
    fn test_event_round_trips() {
        let event = Event {
            seq: 9,
            session_id: "s".into(),
            timestamp: "t".into(),
            phase_state: PhaseState::Seconding,
            event_type: EventType::MotionSeconded,
            round: 2,
            turn_index: 11,
            actor_id: Some("c".into()),
            payload: json!({"motionId": "m-1"}),
        };
        let text = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(back.seq, 9);
        assert_eq!(back.event_type, EventType::MotionSeconded);
    }
}
