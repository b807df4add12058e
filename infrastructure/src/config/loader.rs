//! Configuration file loader.
//!
//! Merges built-in defaults with the operator's JSON config file and
//! converts into the validated domain configuration. Any violation fails
//! loading before a session can start.

use super::file_config::FileConfig;
use council_domain::{ConfigViolation, CouncilConfig};
use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use std::path::Path;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Read(#[from] Box<figment::Error>),

    #[error("invalid configuration:\n{}", format_violations(.0))]
    Invalid(Vec<ConfigViolation>),
}

fn format_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {}", v.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Loads and validates council configurations.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config at `path`, merged over built-in defaults.
    pub fn load(path: &Path) -> Result<CouncilConfig, ConfigError> {
        // `file_exact` (unlike `file`) treats a missing config as an error.
        let file: FileConfig = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Json::file_exact(path))
            .extract()
            .map_err(Box::new)?;

        file.into_domain().map_err(ConfigError::Invalid)
    }
}
