//! Extension catalog - Identifier to constructor mapping

use std::sync::Arc;

use super::trait_def::Extension;

/// Constructor for an extension instance
pub type ExtensionFactory = fn() -> Arc<dyn Extension>;

/// Extensions that can be named in the load list
#[derive(Default, Clone)]
pub struct ExtensionCatalog {
    entries: Vec<(String, ExtensionFactory)>,
}

impl ExtensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, factory: ExtensionFactory) -> Self {
        self.register(id, factory);
        self
    }

    /// Register a factory; a later registration under the same id replaces the earlier one
    pub fn register(&mut self, id: impl Into<String>, factory: ExtensionFactory) {
        let id = id.into();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.push((id, factory));
    }

    /// Build the extension registered under `id`
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn Extension>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, factory)| factory())
    }

    /// Registered identifiers, in registration order
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }
}
