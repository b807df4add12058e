//! Filesystem memory store.
//!
//! Layout under the configured memory directory:
//!
//! ```text
//! COUNCIL.json          canonical council memory
//! COUNCIL.md            rendered view
//! <memberId>/AGENT.md   member profile
//! <memberId>/MEMORY.json
//! <memberId>/MEMORY.md
//! ```
//!
//! Written only at session close; the prompt-context snapshot each turn
//! reads is the one derived at the previous close.

use council_application::ports::{MemoryStore, SessionMemoryInput, StoreError};
use council_domain::memory::{
    COUNCIL_DIGEST_CAP, COUNCIL_RECORD_CAP, MEMBER_DIGEST_CAP, MEMBER_RECORD_CAP,
    council_session_records, member_session_records,
};
use council_domain::{CouncilConfig, Member, MemoryDocument};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn io_error(path: &Path, error: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

pub struct FsMemoryStore {
    dir: PathBuf,
}

impl FsMemoryStore {
    pub fn new(memory_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: memory_dir.into(),
        }
    }

    fn council_path(&self) -> PathBuf {
        self.dir.join("COUNCIL.json")
    }

    fn member_dir(&self, member_id: &str) -> PathBuf {
        self.dir.join(member_id)
    }

    fn load_document(&self, path: &Path) -> Result<MemoryDocument, StoreError> {
        if !path.exists() {
            return Ok(MemoryDocument::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn save_document(
        &self,
        json_path: &Path,
        md_path: &Path,
        title: &str,
        doc: &MemoryDocument,
    ) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(json_path, contents).map_err(|e| io_error(json_path, e))?;
        std::fs::write(md_path, doc.render_markdown(title)).map_err(|e| io_error(md_path, e))?;
        Ok(())
    }

    fn render_profile(member: &Member) -> String {
        format!(
            "# {name}\n\n- id: `{id}`\n- role: {role}\n- traits: {traits}\n- focus: {focus}\n\n\
             ## System prompt\n\n{system_prompt}\n",
            name = member.name,
            id = member.id,
            role = member.role,
            traits = member.traits_line(),
            focus = member.focus_line(),
            system_prompt = member.system_prompt,
        )
    }
}

impl MemoryStore for FsMemoryStore {
    fn prepare(&self, config: &CouncilConfig) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        if !self.council_path().exists() {
            self.save_document(
                &self.council_path(),
                &self.dir.join("COUNCIL.md"),
                &format!("Council memory: {}", config.name),
                &MemoryDocument::default(),
            )?;
        }

        for member in &config.members {
            let member_dir = self.member_dir(&member.id);
            std::fs::create_dir_all(&member_dir).map_err(|e| io_error(&member_dir, e))?;

            let profile = member_dir.join("AGENT.md");
            std::fs::write(&profile, Self::render_profile(member))
                .map_err(|e| io_error(&profile, e))?;

            let memory_json = member_dir.join("MEMORY.json");
            if !memory_json.exists() {
                self.save_document(
                    &memory_json,
                    &member_dir.join("MEMORY.md"),
                    &format!("Memory: {}", member.name),
                    &MemoryDocument::default(),
                )?;
            }
        }

        debug!(dir = %self.dir.display(), "memory store prepared");
        Ok(())
    }

    fn prompt_context(&self, member_id: &str) -> Result<String, StoreError> {
        let doc = self.load_document(&self.member_dir(member_id).join("MEMORY.json"))?;
        Ok(doc.prompt_context)
    }

    fn record_session(&self, input: &SessionMemoryInput) -> Result<(), StoreError> {
        if input.write_member_memory {
            for member_id in &input.member_ids {
                let member_dir = self.member_dir(member_id);
                std::fs::create_dir_all(&member_dir).map_err(|e| io_error(&member_dir, e))?;

                let json_path = member_dir.join("MEMORY.json");
                let mut doc = self.load_document(&json_path)?;

                let records = member_session_records(
                    &input.update,
                    member_id,
                    input.last_contributions.get(member_id).map(String::as_str),
                    input.parse_fallback_members.contains(member_id),
                );
                for record in records {
                    doc.upsert(record);
                }
                doc.note_session(&input.update.session_id, MEMBER_DIGEST_CAP);
                doc.prune(MEMBER_RECORD_CAP);
                doc.refresh_prompt_context();

                self.save_document(
                    &json_path,
                    &member_dir.join("MEMORY.md"),
                    &format!("Memory: {}", member_id),
                    &doc,
                )?;
            }
        }

        if input.write_council_memory {
            let fallback_members: Vec<String> =
                input.parse_fallback_members.iter().cloned().collect();
            let mut doc = self.load_document(&self.council_path())?;
            for record in council_session_records(&input.update, &fallback_members) {
                doc.upsert(record);
            }
            doc.note_session(&input.update.session_id, COUNCIL_DIGEST_CAP);
            doc.prune(COUNCIL_RECORD_CAP);
            doc.refresh_prompt_context();

            self.save_document(
                &self.council_path(),
                &self.dir.join("COUNCIL.md"),
                &format!("Council memory: {}", input.update.council_name),
                &doc,
            )?;
        }

        info!(session_id = %input.update.session_id, "session memory recorded");
        Ok(())
    }
}
