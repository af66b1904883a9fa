use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::User;
use crate::application::errors::{CommandError, ExtensionError};
use crate::domain::traits::{CommandContext, CommandHandler, ComponentHandler, EventListener};
use crate::domain::entities::Reply;

/// How a command may be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Text command behind the `>` or mention prefix
    Prefix,
    /// Platform-native slash command
    Slash,
    /// Both of the above
    Hybrid,
}

impl CommandKind {
    pub fn accepts_prefix(&self) -> bool {
        matches!(self, CommandKind::Prefix | CommandKind::Hybrid)
    }

    pub fn accepts_slash(&self) -> bool {
        matches!(self, CommandKind::Slash | CommandKind::Hybrid)
    }
}

/// Type of a slash command option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
}

/// Declared slash command option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    /// Inclusive bounds for integer options
    pub range: Option<(u64, u64)>,
}

impl CommandOption {
    pub fn new(kind: OptionKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            range: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_range(mut self, min: u64, max: u64) -> Self {
        self.range = Some((min, max));
        self
    }
}

/// Value supplied for a slash command option
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    User(User),
}

/// Represents a bot command
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub kind: CommandKind,
    pub options: Vec<CommandOption>,
    pub handler: Option<Arc<dyn CommandHandler>>,
    /// Short name of the extension that registered this command
    pub extension: Option<String>,
}

/// Adapts a plain closure into a [`CommandHandler`] that replies with its result
pub struct FnHandler<F>(F);

#[async_trait::async_trait]
impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&CommandContext) -> Result<Reply, CommandError> + Send + Sync,
{
    async fn invoke(&self, ctx: CommandContext) -> Result<(), CommandError> {
        let reply = (self.0)(&ctx)?;
        ctx.reply(reply).await?;
        Ok(())
    }
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            usage: None,
            kind: CommandKind::Prefix,
            options: Vec::new(),
            handler: None,
            extension: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandContext) -> Result<Reply, CommandError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(FnHandler(handler)));
        self
    }

    pub fn with_command_handler(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn owned_by(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn matches(&self, input: &str, case_insensitive: bool) -> bool {
        let same = |candidate: &str| {
            if case_insensitive {
                candidate.eq_ignore_ascii_case(input)
            } else {
                candidate == input
            }
        };
        same(&self.name) || self.aliases.iter().any(|a| same(a))
    }

    /// Name and aliases, folded to lowercase when lookups ignore case
    fn keys(&self, case_insensitive: bool) -> impl Iterator<Item = String> + '_ {
        std::iter::once(&self.name).chain(self.aliases.iter()).map(move |k| {
            if case_insensitive {
                k.to_lowercase()
            } else {
                k.clone()
            }
        })
    }
}

/// A loaded extension as the registry remembers it
#[derive(Debug, Clone)]
struct LoadedExtension {
    id: String,
    description: String,
}

/// Handler table shared by every adapter: commands, button handlers and listeners.
///
/// Built once during startup and read-only afterwards.
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
    components: Vec<(String, Arc<dyn ComponentHandler>)>,
    listeners: Vec<Arc<dyn EventListener>>,
    extensions: Vec<LoadedExtension>,
    case_insensitive: bool,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CommandRegistry {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            commands: BTreeMap::new(),
            components: Vec::new(),
            listeners: Vec::new(),
            extensions: Vec::new(),
            case_insensitive,
        }
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    fn key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Register a command, rejecting name or alias collisions
    pub fn register(&mut self, command: Command) -> Result<(), ExtensionError> {
        self.check_available(&command)?;
        self.commands.insert(self.key(&command.name), command);
        Ok(())
    }

    /// Fails if any name or alias of `command` is already taken
    pub fn check_available(&self, command: &Command) -> Result<(), ExtensionError> {
        let taken: HashMap<String, &str> = self
            .commands
            .values()
            .flat_map(|c| c.keys(self.case_insensitive).map(move |k| (k, c.name.as_str())))
            .collect();

        match command.keys(self.case_insensitive).find(|k| taken.contains_key(k)) {
            Some(key) => Err(ExtensionError::DuplicateCommand(key)),
            None => Ok(()),
        }
    }

    pub fn register_component(
        &mut self,
        custom_id_prefix: impl Into<String>,
        handler: Arc<dyn ComponentHandler>,
    ) {
        self.components.push((custom_id_prefix.into(), handler));
    }

    pub fn register_listener(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Record an extension as loaded
    pub fn mark_loaded(&mut self, extension_id: impl Into<String>, description: impl Into<String>) {
        self.extensions.push(LoadedExtension {
            id: extension_id.into(),
            description: description.into(),
        });
    }

    pub fn is_loaded(&self, extension_id: &str) -> bool {
        self.extensions.iter().any(|e| e.id == extension_id)
    }

    /// Find a command invocable with a text prefix
    pub fn find_prefix(&self, input: &str) -> Option<&Command> {
        self.commands
            .values()
            .find(|c| c.kind.accepts_prefix() && c.matches(input, self.case_insensitive))
    }

    /// Find a command invocable as a slash command
    pub fn find_slash(&self, name: &str) -> Option<&Command> {
        self.commands
            .values()
            .find(|c| c.kind.accepts_slash() && c.name == name)
    }

    /// Prefix commands registered by the extension with the given short name
    pub fn prefix_commands_in<'a, 'e>(&'a self, extension: &'e str) -> impl Iterator<Item = &'a Command> + 'e
    where
        'a: 'e,
    {
        self.commands.values().filter(move |c| {
            let owner = c.extension.as_deref();
            c.kind.accepts_prefix() && owner.is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
    }

    /// Find a prefix command registered by the extension with the given short name
    pub fn find_in_extension(&self, extension: &str, input: &str) -> Option<&Command> {
        self.prefix_commands_in(extension)
            .find(|c| c.matches(input, self.case_insensitive))
    }

    /// Description of the loaded extension with this short name
    pub fn extension_description(&self, short_name: &str) -> Option<&str> {
        self.extensions
            .iter()
            .find(|e| e.id.rsplit('.').next().is_some_and(|s| s.eq_ignore_ascii_case(short_name)))
            .map(|e| e.description.as_str())
    }

    /// Whether a loaded extension has this short name
    pub fn has_extension_named(&self, short_name: &str) -> bool {
        self.extension_description(short_name).is_some()
    }

    pub fn find_component(&self, custom_id: &str) -> Option<&Arc<dyn ComponentHandler>> {
        self.components
            .iter()
            .find(|(prefix, _)| custom_id.starts_with(prefix.as_str()))
            .map(|(_, handler)| handler)
    }

    pub fn listeners(&self) -> &[Arc<dyn EventListener>] {
        &self.listeners
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn slash_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values().filter(|c| c.kind.accepts_slash())
    }
}
