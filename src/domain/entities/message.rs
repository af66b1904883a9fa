use super::User;

/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Chat not addressed to the bot
    Text,
    Command { name: String, args: Vec<String> },
    /// A prefix with nothing after it
    Empty,
}

/// Represents an incoming chat message
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub author: User,
    pub text: String,
    pub mentions: Vec<User>,
}

impl Message {
    pub fn new(channel_id: u64, author: User, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            channel_id,
            guild_id: None,
            author,
            text: text.into(),
            mentions: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn with_guild(mut self, guild_id: Option<u64>) -> Self {
        self.guild_id = guild_id;
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<User>) -> Self {
        self.mentions = mentions;
        self
    }
}

/// A member joining a guild
#[derive(Debug, Clone)]
pub struct MemberJoin {
    pub guild_id: u64,
    /// System channel of the guild, where welcome messages go
    pub system_channel_id: Option<u64>,
    pub user: User,
}

/// A slash command interaction
#[derive(Debug, Clone)]
pub struct SlashCommand {
    pub name: String,
    pub options: std::collections::HashMap<String, super::OptionValue>,
    pub user: User,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
}
