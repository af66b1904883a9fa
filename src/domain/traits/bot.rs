use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::{Reply, SentMessage};

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Send a message to a channel
    async fn send(&self, channel_id: u64, reply: Reply) -> Result<SentMessage, BotError>;

    /// Replace the content of a message previously sent by the bot
    async fn edit(&self, channel_id: u64, message_id: u64, reply: Reply) -> Result<(), BotError>;

    /// Gateway heartbeat latency, if known yet
    async fn latency(&self) -> Option<Duration>;
}

/// Answers the event that triggered a handler.
///
/// Prefix commands answer in the channel; interactions answer through the
/// interaction so that ephemeral replies work.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, reply: Reply) -> Result<SentMessage, BotError>;
}

/// Responder that posts into a channel through a [`Bot`]
pub struct ChannelResponder {
    bot: Arc<dyn Bot>,
    channel_id: u64,
}

impl ChannelResponder {
    pub fn new(bot: Arc<dyn Bot>, channel_id: u64) -> Self {
        Self { bot, channel_id }
    }
}

#[async_trait]
impl Responder for ChannelResponder {
    async fn respond(&self, reply: Reply) -> Result<SentMessage, BotError> {
        self.bot.send(self.channel_id, reply).await
    }
}
