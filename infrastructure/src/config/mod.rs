//! JSON configuration loading and conversion.

mod file_config;
mod loader;

pub use file_config::{FileConfig, FileMember, FilePhase};
pub use loader::{ConfigError, ConfigLoader};
