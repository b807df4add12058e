//! Production clock and id generation.

use council_application::ports::{Clock, IdGenerator};
use std::sync::atomic::{AtomicU64, Ordering};

/// UTC wall clock, millisecond precision.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_iso(&self) -> String {
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

/// Timestamp-plus-pid session ids and counter-based motion ids.
pub struct SessionIdGenerator {
    motion_counter: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self {
            motion_counter: AtomicU64::new(0),
        }
    }
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SessionIdGenerator {
    /// A prefix like `session-2026-02-17T14-30-00-12345`, shared shape with
    /// the log file naming so a session's artifacts are greppable together.
    fn session_id(&self) -> String {
        let now = chrono::Utc::now();
        format!(
            "session-{}-{}",
            now.format("%Y-%m-%dT%H-%M-%S"),
            std::process::id()
        )
    }

    fn motion_id(&self) -> String {
        let n = self.motion_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("motion-{:03}", n)
    }
}
