//! Model client adapters.

mod gateway;
mod router;

pub use gateway::HttpModelClient;
pub use router::ModelRouter;
