//! Extension loader - Loads the configured extensions in order

use serde::{Deserialize, Serialize};

use super::catalog::ExtensionCatalog;
use super::short_name;
use super::trait_def::ExtensionContext;
use crate::application::errors::ExtensionError;
use crate::domain::entities::CommandRegistry;

/// What to do when one extension fails to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure and keep loading the rest
    #[default]
    Continue,
    /// Stop at the first failure
    Abort,
}

/// Per-identifier outcome of a load pass, in attempt order
#[derive(Debug, Default)]
pub struct LoadReport {
    pub attempted: Vec<String>,
    pub loaded: Vec<String>,
    pub failed: Vec<(String, ExtensionError)>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Extension loader
pub struct ExtensionLoader {
    catalog: ExtensionCatalog,
    policy: FailurePolicy,
}

impl ExtensionLoader {
    pub fn new(catalog: ExtensionCatalog) -> Self {
        Self {
            catalog,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Load a single extension into the registry
    pub fn load_extension(&self, id: &str, registry: &mut CommandRegistry) -> Result<usize, ExtensionError> {
        if registry.is_loaded(id) {
            return Err(ExtensionError::AlreadyLoaded(id.to_string()));
        }

        let Some(extension) = self.catalog.resolve(id) else {
            tracing::debug!("Known extensions: {}", self.catalog.ids().join(", "));
            return Err(ExtensionError::NotFound(id.to_string()));
        };

        let mut ctx = ExtensionContext::new(short_name(id));
        extension.setup(&mut ctx)?;
        let commands = ctx.commit(registry)?;

        registry.mark_loaded(id, extension.description());
        tracing::debug!("Extension '{}' ({}) registered {} commands", id, extension.name(), commands);
        Ok(commands)
    }

    /// Attempt every identifier once, in order
    pub fn load_all(&self, ids: &[String], registry: &mut CommandRegistry) -> LoadReport {
        let mut report = LoadReport::default();

        for id in ids {
            report.attempted.push(id.clone());
            match self.load_extension(id, registry) {
                Ok(_) => {
                    tracing::info!("Extension '{}' loaded successfully.", short_name(id));
                    report.loaded.push(id.clone());
                }
                Err(e) => {
                    tracing::error!("Failed to load extension '{}': {}", id, e);
                    report.failed.push((id.clone(), e));
                    if self.policy == FailurePolicy::Abort {
                        tracing::warn!("Aborting extension loading after failure");
                        break;
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Command;
    use crate::extensions::Extension;
    use std::sync::Arc;

    struct Alpha;
    struct Beta;
    struct Broken;

    impl Extension for Alpha {
        fn name(&self) -> &str {
            "alpha"
        }

        fn description(&self) -> &str {
            "First in line"
        }

        fn setup(&self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
            ctx.add_command(Command::new("one"));
            Ok(())
        }
    }

    impl Extension for Beta {
        fn name(&self) -> &str {
            "beta"
        }

        fn setup(&self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
            ctx.add_command(Command::new("two"));
            Ok(())
        }
    }

    impl Extension for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn setup(&self, _ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
            Err(ExtensionError::Setup("boom".to_string()))
        }
    }

    fn catalog() -> ExtensionCatalog {
        ExtensionCatalog::new()
            .with("cogs.alpha", || Arc::new(Alpha) as Arc<dyn Extension>)
            .with("cogs.beta", || Arc::new(Beta) as Arc<dyn Extension>)
            .with("cogs.broken", || Arc::new(Broken) as Arc<dyn Extension>)
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_each_extension_attempted_once_in_order() {
        let loader = ExtensionLoader::new(catalog());
        let mut registry = CommandRegistry::default();

        let report = loader.load_all(&ids(&["cogs.beta", "cogs.broken", "cogs.alpha"]), &mut registry);

        assert_eq!(report.attempted, ids(&["cogs.beta", "cogs.broken", "cogs.alpha"]));
        assert_eq!(report.loaded, ids(&["cogs.beta", "cogs.alpha"]));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "cogs.broken");
        assert!(registry.is_loaded("cogs.beta") && registry.is_loaded("cogs.alpha"));
        assert!(!registry.is_loaded("cogs.broken"));
        assert_eq!(registry.extension_description("alpha"), Some("First in line"));
        assert_eq!(registry.extension_description("beta"), Some(""));
        assert!(registry.find_prefix("one").is_some());
        assert!(registry.find_prefix("two").is_some());
    }

    #[test]
    fn test_abort_policy_stops_at_first_failure() {
        let loader = ExtensionLoader::new(catalog()).with_policy(FailurePolicy::Abort);
        let mut registry = CommandRegistry::default();

        let report = loader.load_all(&ids(&["cogs.missing", "cogs.alpha"]), &mut registry);

        assert_eq!(report.attempted, ids(&["cogs.missing"]));
        assert!(report.loaded.is_empty());
        assert!(matches!(report.failed[0].1, ExtensionError::NotFound(_)));
        assert!(!report.is_success());
        assert_eq!(registry.all().count(), 0);
    }

    #[test]
    fn test_duplicate_entry_is_attempted_and_rejected() {
        let loader = ExtensionLoader::new(catalog());
        let mut registry = CommandRegistry::default();

        let report = loader.load_all(&ids(&["cogs.alpha", "cogs.alpha"]), &mut registry);

        assert_eq!(report.attempted.len(), 2);
        assert_eq!(report.loaded, ids(&["cogs.alpha"]));
        assert!(matches!(report.failed[0].1, ExtensionError::AlreadyLoaded(_)));
        assert_eq!(registry.all().count(), 1);
    }

    #[test]
    fn test_failed_setup_leaves_registry_untouched() {
        let loader = ExtensionLoader::new(catalog());
        let mut registry = CommandRegistry::default();

        assert!(loader.load_extension("cogs.broken", &mut registry).is_err());
        assert!(!registry.is_loaded("cogs.broken"));
        assert_eq!(registry.all().count(), 0);
    }
}
