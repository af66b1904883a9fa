//! Extension trait definitions

use std::sync::Arc;

use crate::application::errors::ExtensionError;
use crate::domain::entities::{Command, CommandRegistry};
use crate::domain::traits::{ComponentHandler, EventListener};

/// Core trait that every extension implements
pub trait Extension: Send + Sync {
    /// Short name, used for logging and `<name> <command>` invocation
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Register commands, component handlers and listeners
    fn setup(&self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError>;
}

/// Staging area for one extension's registrations.
///
/// Nothing reaches the registry unless `setup` succeeds and every command
/// name is free.
pub struct ExtensionContext {
    name: String,
    commands: Vec<Command>,
    components: Vec<(String, Arc<dyn ComponentHandler>)>,
    listeners: Vec<Arc<dyn EventListener>>,
}

impl ExtensionContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            components: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn add_command(&mut self, command: Command) {
        self.commands.push(command.owned_by(self.name.clone()));
    }

    pub fn add_component(&mut self, custom_id_prefix: impl Into<String>, handler: Arc<dyn ComponentHandler>) {
        self.components.push((custom_id_prefix.into(), handler));
    }

    pub fn add_listener(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Move the staged registrations into `registry`, all or nothing
    pub fn commit(self, registry: &mut CommandRegistry) -> Result<usize, ExtensionError> {
        let mut staged = CommandRegistry::new(registry.is_case_insensitive());
        for command in &self.commands {
            registry.check_available(command)?;
            staged.register(Command::new(command.name.clone()).with_aliases(command.aliases.clone()))?;
        }

        let count = self.commands.len();
        for command in self.commands {
            registry.register(command)?;
        }
        for (prefix, handler) in self.components {
            registry.register_component(prefix, handler);
        }
        for listener in self.listeners {
            registry.register_listener(listener);
        }
        Ok(count)
    }
}
