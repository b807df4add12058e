//! Filesystem storage adapters.

mod memory_store;
mod session_store;

pub use memory_store::FsMemoryStore;
pub use session_store::{FsSessionStore, FsSessionStoreProvider};
