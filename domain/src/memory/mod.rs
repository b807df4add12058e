//! Durable, bounded member and council memory.
//!
//! Memory is a flat set of structured records keyed by stable id, written
//! once at session close and read (as a derived prompt-context snapshot) on
//! turn entry. The on-disk record count is bounded by the prune policy;
//! records whose evidence falls outside the recent-session window stay on
//! disk but fade from prompts.

mod context;
mod session_update;

pub use context::{BUCKET_CAPS, EVIDENCE_FADE_WINDOW, PromptContext, derive_prompt_context};
pub use session_update::{SessionMemoryUpdate, council_session_records, member_session_records};

use serde::{Deserialize, Serialize};

/// Per-member and council record caps.
pub const MEMBER_RECORD_CAP: usize = 80;
pub const COUNCIL_RECORD_CAP: usize = 80;
/// Recent-session digest caps.
pub const MEMBER_DIGEST_CAP: usize = 40;
pub const COUNCIL_DIGEST_CAP: usize = 50;
/// Evidence refs kept per record after an upsert merge.
pub const EVIDENCE_CAP: usize = 8;

/// Kind of knowledge a record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Preference,
    Constraint,
    Decision,
    Assumption,
    RiskPattern,
    Lesson,
    OpenLoop,
    Outcome,
}

/// Lifecycle status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Resolved,
    Superseded,
    Stale,
}

/// Pointer from a record to the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EvidenceRef {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A durable knowledge item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stable id; upserts are keyed on it (e.g. `decision:<sessionId>`).
    pub id: String,
    pub kind: RecordKind,
    pub status: RecordStatus,
    pub summary: String,
    /// 1 (trivia) to 5 (load-bearing).
    pub importance: u8,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub evidence: Vec<EvidenceRef>,
    pub created_at: String,
    pub updated_at: String,
}

impl MemoryRecord {
    pub fn new(
        id: impl Into<String>,
        kind: RecordKind,
        summary: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let timestamp = timestamp.into();
        Self {
            id: id.into(),
            kind,
            status: RecordStatus::Active,
            summary: summary.into(),
            importance: 3,
            confidence: 0.7,
            evidence: Vec::new(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance.clamp(1, 5);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_evidence(mut self, evidence: EvidenceRef) -> Self {
        self.evidence.push(evidence);
        self
    }
}

/// A member's (or the council's) complete memory document.
///
/// `recent_sessions` is ordered most recent first. `prompt_context` is the
/// rendered snapshot derived at the close of the last session; turn entry
/// reads it verbatim, so mid-session turns never observe partial writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub records: Vec<MemoryRecord>,
    #[serde(default)]
    pub recent_sessions: Vec<String>,
    #[serde(default)]
    pub prompt_context: String,
}

impl MemoryDocument {
    /// Insert or replace a record by id. On replacement the original
    /// `created_at` survives and evidence refs are merged (newest first,
    /// deduplicated, capped).
    pub fn upsert(&mut self, mut record: MemoryRecord) {
        if let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) {
            record.created_at = existing.created_at.clone();
            for old in existing.evidence.drain(..) {
                if !record.evidence.contains(&old) {
                    record.evidence.push(old);
                }
            }
            record.evidence.truncate(EVIDENCE_CAP);
            *existing = record;
        } else {
            self.records.push(record);
        }
    }

    /// Record that a session touched this memory. Most recent first.
    pub fn note_session(&mut self, session_id: &str, digest_cap: usize) {
        self.recent_sessions.retain(|s| s != session_id);
        self.recent_sessions.insert(0, session_id.to_string());
        self.recent_sessions.truncate(digest_cap);
    }

    /// Keep the top `cap` records by `(importance desc, updated_at desc)`.
    pub fn prune(&mut self, cap: usize) {
        self.records.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        self.records.truncate(cap);
    }

    /// Recompute and store the prompt-context snapshot.
    pub fn refresh_prompt_context(&mut self) {
        self.prompt_context = derive_prompt_context(self).render();
    }

    /// Render a human-readable view of the whole document.
    pub fn render_markdown(&self, title: &str) -> String {
        let mut out = format!("# {}\n\n", title);
        if self.records.is_empty() {
            out.push_str("_No records yet._\n");
            return out;
        }
        out.push_str(&format!(
            "{} records; recent sessions: {}\n\n",
            self.records.len(),
            if self.recent_sessions.is_empty() {
                "none".to_string()
            } else {
                self.recent_sessions.join(", ")
            }
        ));
        out.push_str("| id | kind | status | imp | conf | summary |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for record in &self.records {
            out.push_str(&format!(
                "| {} | {:?} | {:?} | {} | {:.2} | {} |\n",
                record.id,
                record.kind,
                record.status,
                record.importance,
                record.confidence,
                record.summary.replace('|', "\\|")
            ));
        }
        out
    }
}
