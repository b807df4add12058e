//! Model client port
//!
//! Defines the interface for the opaque request/response oracles backing
//! each member. Implementations (adapters) live in the infrastructure
//! layer.
//!
//! Two failure channels exist and they are deliberately distinct:
//! transport/auth/provider failures are [`ModelError`]s and fatal to the
//! session, while JSON that cannot be parsed is a *value*
//! ([`JsonOutcome::ParseError`]) that the domain normalizer converts into a
//! deterministic fallback. One call per prompt; the engine never retries.

use async_trait::async_trait;
use council_domain::{JsonOutcome, Member};
use std::sync::Arc;
use thiserror::Error;

/// Errors that end the session.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("model call cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Per-call sampling options.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// An opaque per-member oracle.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete a free-text prompt.
    async fn complete_text(
        &self,
        system: &str,
        user: &str,
        opts: &CompletionOptions,
    ) -> Result<String, ModelError>;

    /// Complete a prompt whose contract is a single JSON object. The
    /// default implementation runs the domain extraction pipeline over
    /// `complete_text` output.
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        opts: &CompletionOptions,
    ) -> Result<JsonOutcome, ModelError> {
        let raw = self.complete_text(system, user, opts).await?;
        Ok(JsonOutcome::from_raw(&raw))
    }
}

/// Resolves a member to its model client.
pub trait CouncilModels: Send + Sync {
    fn client_for(&self, member: &Member) -> Arc<dyn ModelClient>;
}
