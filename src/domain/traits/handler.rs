use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Bot, Responder};
use crate::application::errors::{BotError, CommandError};
use crate::domain::entities::{CommandRegistry, MemberJoin, OptionValue, Reply, SentMessage, User};

/// How the current command was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    Prefix,
    Slash,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Prefix => write!(f, "prefix"),
            Invocation::Slash => write!(f, "slash"),
        }
    }
}

/// Everything a command handler gets to see about one invocation
pub struct CommandContext {
    pub command: String,
    pub invocation: Invocation,
    /// Positional arguments (prefix invocations)
    pub args: Vec<String>,
    /// Named options (slash invocations)
    pub options: HashMap<String, OptionValue>,
    pub author: User,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub mentions: Vec<User>,
    /// Literal text prefix, for rendering usage hints
    pub prefix: String,
    pub registry: Arc<CommandRegistry>,
    pub bot: Arc<dyn Bot>,
    pub responder: Arc<dyn Responder>,
}

impl CommandContext {
    pub async fn reply(&self, reply: Reply) -> Result<SentMessage, CommandError> {
        Ok(self.responder.respond(reply).await?)
    }

    /// `guild/channel`, or only the channel outside a guild
    pub fn location(&self) -> String {
        match self.guild_id {
            Some(guild) => format!("{}/{}", guild, self.channel_id),
            None => self.channel_id.to_string(),
        }
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn option_i64(&self, name: &str) -> Option<i64> {
        match self.options.get(name) {
            Some(OptionValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn option_bool(&self, name: &str) -> Option<bool> {
        match self.options.get(name) {
            Some(OptionValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn option_user(&self, name: &str) -> Option<&User> {
        match self.options.get(name) {
            Some(OptionValue::User(u)) => Some(u),
            _ => None,
        }
    }
}

/// A command implementation registered by an extension
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn invoke(&self, ctx: CommandContext) -> Result<(), CommandError>;
}

/// Context of a button press
pub struct ComponentContext {
    pub custom_id: String,
    pub message_id: u64,
    pub channel_id: u64,
    pub user: User,
    pub bot: Arc<dyn Bot>,
    pub responder: Arc<dyn Responder>,
}

impl ComponentContext {
    pub async fn reply(&self, reply: Reply) -> Result<SentMessage, CommandError> {
        Ok(self.responder.respond(reply).await?)
    }
}

/// Handles button presses whose custom id starts with a registered prefix
#[async_trait]
pub trait ComponentHandler: Send + Sync {
    async fn handle(&self, ctx: ComponentContext) -> Result<(), CommandError>;
}

/// Gateway event listener
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_member_join(&self, _member: &MemberJoin, _bot: Arc<dyn Bot>) -> Result<(), BotError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBot;

    fn context(invocation: Invocation, guild_id: Option<u64>) -> CommandContext {
        let bot = RecordingBot::new();
        CommandContext {
            command: "ping".to_string(),
            invocation,
            args: Vec::new(),
            options: [("count".to_string(), OptionValue::Integer(3))].into_iter().collect(),
            author: User::new(7, "alice"),
            channel_id: 10,
            guild_id,
            mentions: Vec::new(),
            prefix: ">".to_string(),
            registry: Arc::new(CommandRegistry::default()),
            bot: bot.clone(),
            responder: bot,
        }
    }

    #[test]
    fn test_location_and_invocation_labels() {
        let in_guild = context(Invocation::Slash, Some(3));
        assert_eq!(in_guild.location(), "3/10");
        assert_eq!(in_guild.invocation.to_string(), "slash");

        let direct = context(Invocation::Prefix, None);
        assert_eq!(direct.location(), "10");
        assert_eq!(direct.invocation.to_string(), "prefix");
    }

    #[test]
    fn test_typed_option_access() {
        let ctx = context(Invocation::Slash, None);
        assert_eq!(ctx.option_i64("count"), Some(3));
        assert_eq!(ctx.option_str("count"), None);
        assert_eq!(ctx.option_bool("missing"), None);
    }
}
