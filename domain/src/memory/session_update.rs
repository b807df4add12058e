//! Construction of the records a closing session writes into memory.
//!
//! Pure functions: the store applies these to the loaded documents and
//! persists the result. Record ids are stable so repeat sessions upsert
//! rather than accumulate.

use super::{EvidenceRef, MemoryRecord, RecordKind, RecordStatus};

/// Facts about a finished session that memory cares about.
#[derive(Debug, Clone)]
pub struct SessionMemoryUpdate {
    pub session_id: String,
    pub timestamp: String,
    pub council_name: String,
    pub final_resolution: String,
    /// True when the last phase ended on its round limit.
    pub ended_by_round_limit: bool,
    /// True when the leader summary declared the outcome executable.
    pub requires_execution: bool,
    /// The approval bit carried on the execution handoff.
    pub execution_approved: bool,
}

impl SessionMemoryUpdate {
    fn evidence(&self) -> EvidenceRef {
        EvidenceRef::new(self.session_id.clone())
    }
}

/// Records upserted into one member's memory at session close.
pub fn member_session_records(
    update: &SessionMemoryUpdate,
    member_id: &str,
    last_contribution: Option<&str>,
    used_parse_fallback: bool,
) -> Vec<MemoryRecord> {
    let mut records = Vec::new();

    records.push(
        MemoryRecord::new(
            format!("decision:{}", update.session_id),
            RecordKind::Decision,
            format!(
                "Council \"{}\" resolved: {}",
                update.council_name, update.final_resolution
            ),
            update.timestamp.clone(),
        )
        .with_importance(5)
        .with_confidence(0.9)
        .with_evidence(update.evidence()),
    );

    let stance = match last_contribution {
        Some(message) => format!("Final stance: {}", truncate(message, 240)),
        None => "Took no speaking turns this session.".to_string(),
    };
    records.push(
        MemoryRecord::new(
            format!("outcome:{}:{}", update.session_id, member_id),
            RecordKind::Outcome,
            stance,
            update.timestamp.clone(),
        )
        .with_importance(3)
        .with_confidence(0.8)
        .with_evidence(update.evidence()),
    );

    if used_parse_fallback {
        records.push(
            MemoryRecord::new(
                format!("risk_pattern:parse_fallback:{}", member_id),
                RecordKind::RiskPattern,
                "Returned unparseable JSON at least once; responses were auto-converted to deterministic fallbacks.",
                update.timestamp.clone(),
            )
            .with_importance(4)
            .with_confidence(0.95)
            .with_evidence(update.evidence().with_detail("parse fallback")),
        );
    }

    if update.ended_by_round_limit {
        records.push(
            MemoryRecord::new(
                format!("open_loop:round_limit:{}", update.session_id),
                RecordKind::OpenLoop,
                "Session ended on a round limit without consensus; the adopted resolution is the phase fallback.",
                update.timestamp.clone(),
            )
            .with_importance(4)
            .with_confidence(0.85)
            .with_evidence(update.evidence()),
        );
    }

    if update.requires_execution {
        records.push(execution_record(update));
    }

    records
}

/// Records upserted into the council-wide memory at session close.
pub fn council_session_records(
    update: &SessionMemoryUpdate,
    parse_fallback_members: &[String],
) -> Vec<MemoryRecord> {
    let mut records = Vec::new();

    records.push(
        MemoryRecord::new(
            format!("decision:{}", update.session_id),
            RecordKind::Decision,
            format!("Resolved: {}", update.final_resolution),
            update.timestamp.clone(),
        )
        .with_importance(5)
        .with_confidence(0.9)
        .with_evidence(update.evidence()),
    );

    if !parse_fallback_members.is_empty() {
        records.push(
            MemoryRecord::new(
                "lesson:cross_agent:parse_fallback",
                RecordKind::Lesson,
                format!(
                    "Members produced unparseable JSON and fell back to deterministic defaults: {}. Tighten their response contracts.",
                    parse_fallback_members.join(", ")
                ),
                update.timestamp.clone(),
            )
            .with_importance(4)
            .with_confidence(0.9)
            .with_evidence(update.evidence()),
        );
    }

    if update.ended_by_round_limit {
        records.push(
            MemoryRecord::new(
                format!("open_loop:round_limit:{}", update.session_id),
                RecordKind::OpenLoop,
                "No consensus before the round limit; revisit the question or loosen governance.",
                update.timestamp.clone(),
            )
            .with_importance(4)
            .with_confidence(0.85)
            .with_evidence(update.evidence()),
        );
    }

    if update.requires_execution {
        records.push(execution_record(update));
    }

    records
}

fn execution_record(update: &SessionMemoryUpdate) -> MemoryRecord {
    if update.execution_approved {
        MemoryRecord::new(
            format!("outcome:execution:{}", update.session_id),
            RecordKind::Outcome,
            "Execution of the resolution was approved and handed off.",
            update.timestamp.clone(),
        )
        .with_status(RecordStatus::Resolved)
        .with_importance(4)
        .with_confidence(0.9)
        .with_evidence(update.evidence())
    } else {
        MemoryRecord::new(
            format!("open_loop:execution:{}", update.session_id),
            RecordKind::OpenLoop,
            "The resolution requires execution but approval is outstanding.",
            update.timestamp.clone(),
        )
        .with_importance(4)
        .with_confidence(0.9)
        .with_evidence(update.evidence())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}…", truncated)
    }
}
