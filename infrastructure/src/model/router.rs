//! Per-member model routing.

use super::gateway::HttpModelClient;
use council_application::ports::{CouncilModels, ModelClient, ModelError};
use council_domain::{CouncilConfig, Member};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves members to clients, one client per member, built once from the
/// validated configuration.
pub struct ModelRouter {
    clients: HashMap<String, Arc<dyn ModelClient>>,
}

impl ModelRouter {
    pub fn from_config(config: &CouncilConfig) -> Result<Self, ModelError> {
        let mut clients: HashMap<String, Arc<dyn ModelClient>> = HashMap::new();
        for member in &config.members {
            let client = HttpModelClient::from_ref(&member.model)?;
            clients.insert(member.id.clone(), Arc::new(client));
        }
        Ok(Self { clients })
    }
}

impl CouncilModels for ModelRouter {
    fn client_for(&self, member: &Member) -> Arc<dyn ModelClient> {
        Arc::clone(
            self.clients
                .get(&member.id)
                .expect("router built from the same validated config"),
        )
    }
}
