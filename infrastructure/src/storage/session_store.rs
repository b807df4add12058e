//! Filesystem session store.
//!
//! Lays out `sessions/<sessionId>/` with the running transcript, the
//! structured event log, and the session's named artifacts. The event log
//! is rewritten whole (write-temp-then-rename) on every append so a crash
//! never leaves a torn file; the transcript is append-only and flushed per
//! section.

use council_application::ports::{SessionStore, SessionStoreProvider, StoreError};
use council_domain::{Event, SessionDocument};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

fn io_error(path: &Path, error: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

/// Atomic whole-file write: temp file in the same directory, then rename.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents).map_err(|e| io_error(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_error(path, e))?;
    Ok(())
}

/// Opens per-session directories under `<root>/sessions/`.
pub struct FsSessionStoreProvider {
    sessions_root: PathBuf,
}

impl FsSessionStoreProvider {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_root: root_dir.into().join("sessions"),
        }
    }
}

impl SessionStoreProvider for FsSessionStoreProvider {
    fn open_session(&self, session_id: &str) -> Result<Arc<dyn SessionStore>, StoreError> {
        let dir = self.sessions_root.join(session_id);
        Ok(Arc::new(FsSessionStore::create(dir)?))
    }
}

/// One session's on-disk artifacts.
pub struct FsSessionStore {
    dir: PathBuf,
    /// In-memory mirror of the event log; the file is rewritten from it.
    events: Mutex<Vec<Event>>,
    transcript: Mutex<BufWriter<File>>,
}

impl FsSessionStore {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        let transcript_path = dir.join("transcript.md");
        let transcript = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&transcript_path)
            .map_err(|e| io_error(&transcript_path, e))?;

        debug!(dir = %dir.display(), "session store opened");
        Ok(Self {
            dir,
            events: Mutex::new(Vec::new()),
            transcript: Mutex::new(BufWriter::new(transcript)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionStore for FsSessionStore {
    fn append_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut events = self
            .events
            .lock()
            .expect("event log mutex poisoned");
        events.push(event.clone());
        let contents = serde_json::to_string_pretty(&*events)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.dir.join("events.json"), &contents)
    }

    fn append_transcript(&self, section: &str) -> Result<(), StoreError> {
        let path = self.dir.join("transcript.md");
        let mut writer = self
            .transcript
            .lock()
            .expect("transcript mutex poisoned");
        writer
            .write_all(section.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| io_error(&path, e))
    }

    fn write_artifact(&self, name: &str, contents: &str) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(name);
        write_atomic(&path, contents)?;
        Ok(path)
    }

    fn finalize(&self, document: &SessionDocument) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.dir.join("session.json"), &contents)
    }
}

impl Drop for FsSessionStore {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.transcript.lock() {
            let _ = writer.flush();
        }
    }
}
