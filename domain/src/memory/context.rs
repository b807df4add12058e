//! Prompt-context derivation over a memory document.
//!
//! The prompt context is a bounded view: active records only, partitioned
//! into six buckets with fixed caps, and faded by recency — a record
//! contributes only if at least one of its evidence refs belongs to the
//! most recent sessions this memory has seen.

use super::{MemoryDocument, MemoryRecord, RecordKind, RecordStatus};
use std::collections::HashSet;

/// How many of the most recent sessions keep a record visible in prompts.
pub const EVIDENCE_FADE_WINDOW: usize = 25;

/// Per-bucket caps: constraints, decisions, risks, open loops, preferences,
/// anti-patterns.
pub const BUCKET_CAPS: [usize; 6] = [4, 5, 4, 4, 3, 3];

/// The six-bucket prompt view of a memory document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptContext {
    pub constraints: Vec<String>,
    pub decisions: Vec<String>,
    pub risks: Vec<String>,
    pub open_loops: Vec<String>,
    pub preferences: Vec<String>,
    pub anti_patterns: Vec<String>,
}

impl PromptContext {
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
            && self.decisions.is_empty()
            && self.risks.is_empty()
            && self.open_loops.is_empty()
            && self.preferences.is_empty()
            && self.anti_patterns.is_empty()
    }

    /// Render for prompt injection. Empty buckets are omitted.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        let sections: [(&str, &Vec<String>); 6] = [
            ("Known constraints", &self.constraints),
            ("Prior decisions", &self.decisions),
            ("Risks and assumptions", &self.risks),
            ("Open loops", &self.open_loops),
            ("Preferences", &self.preferences),
            ("Anti-patterns to avoid", &self.anti_patterns),
        ];
        for (heading, items) in sections {
            if items.is_empty() {
                continue;
            }
            out.push_str(heading);
            out.push_str(":\n");
            for item in items {
                out.push_str(&format!("  - {}\n", item));
            }
        }
        out
    }
}

fn bucket_index(kind: RecordKind) -> usize {
    match kind {
        RecordKind::Constraint => 0,
        RecordKind::Decision | RecordKind::Outcome => 1,
        RecordKind::RiskPattern | RecordKind::Assumption => 2,
        RecordKind::OpenLoop => 3,
        RecordKind::Preference => 4,
        RecordKind::Lesson => 5,
    }
}

fn in_window(record: &MemoryRecord, window: &HashSet<&str>) -> bool {
    record
        .evidence
        .iter()
        .any(|e| window.contains(e.session_id.as_str()))
}

/// Derive the bounded prompt context from a memory document.
pub fn derive_prompt_context(doc: &MemoryDocument) -> PromptContext {
    let window: HashSet<&str> = doc
        .recent_sessions
        .iter()
        .take(EVIDENCE_FADE_WINDOW)
        .map(String::as_str)
        .collect();

    let mut buckets: [Vec<&MemoryRecord>; 6] = Default::default();
    for record in &doc.records {
        if record.status != RecordStatus::Active || !in_window(record, &window) {
            continue;
        }
        buckets[bucket_index(record.kind)].push(record);
    }

    for (bucket, cap) in buckets.iter_mut().zip(BUCKET_CAPS) {
        bucket.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        bucket.truncate(cap);
    }

    let summaries = |bucket: &[&MemoryRecord]| -> Vec<String> {
        bucket.iter().map(|r| r.summary.clone()).collect()
    };

    PromptContext {
        constraints: summaries(&buckets[0]),
        decisions: summaries(&buckets[1]),
        risks: summaries(&buckets[2]),
        open_loops: summaries(&buckets[3]),
        preferences: summaries(&buckets[4]),
        anti_patterns: summaries(&buckets[5]),
    }
}
