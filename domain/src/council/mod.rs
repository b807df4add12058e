//! Council composition: members and the immutable session configuration.
//!
//! A council is a fixed, odd-sized set of members deliberating under a
//! phase graph. The configuration is loaded once per invocation and never
//! mutated; every invariant the orchestrator relies on (odd size, unique
//! ids, phase reachability) is checked up front by [`CouncilConfig::validate`].

mod config;
mod member;
mod validation;

pub use config::{
    CouncilConfig, ExecutionPolicy, OutputKind, OutputPolicy, SessionPolicy, StoragePolicy,
    Verbosity,
};
pub use member::{Member, ModelRef};
pub use validation::{ConfigViolation, ViolationCode};
