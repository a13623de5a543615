use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::Adapter;

/// Registry of adapters keyed by provider id, mirroring a module registry
/// that dispatches by domain name rather than by concrete type.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.provider_id().to_string(), adapter);
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(provider_id).cloned()
    }

    pub fn provider_ids(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }
}
