use std::sync::Arc;

use super::registry::ConnectionRegistry;
use super::seen::SeenMessages;
use crate::settings::NodeSettings;

/// Shared state handed to every task a node runs
#[derive(Clone, Debug)]
pub struct NodeContext {
    pub registry: ConnectionRegistry,
    pub seen: SeenMessages,
    pub settings: Arc<NodeSettings>,
}

impl NodeContext {
    pub fn new(settings: NodeSettings) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            seen: SeenMessages::new(),
            settings: Arc::new(settings),
        }
    }
}
