//! In-memory doubles for adapter traits

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::{Reply, SentMessage};
use crate::domain::traits::{Bot, Responder};

pub const BOT_ID: u64 = 1000;
pub const RESPONSE_CHANNEL: u64 = 1;

/// Records every outbound message instead of talking to a platform
#[derive(Default)]
pub struct RecordingBot {
    pub sent: Mutex<Vec<(u64, Reply)>>,
    pub edits: Mutex<Vec<(u64, u64, Reply)>>,
    pub responses: Mutex<Vec<Reply>>,
    next_id: AtomicU64,
}

impl RecordingBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn responses(&self) -> Vec<Reply> {
        self.responses.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(u64, Reply)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(u64, u64, Reply)> {
        self.edits.lock().unwrap().clone()
    }

    fn next_message_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 500
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn send(&self, channel_id: u64, reply: Reply) -> Result<SentMessage, BotError> {
        self.sent.lock().unwrap().push((channel_id, reply));
        Ok(SentMessage {
            channel_id,
            message_id: self.next_message_id(),
        })
    }

    async fn edit(&self, channel_id: u64, message_id: u64, reply: Reply) -> Result<(), BotError> {
        self.edits.lock().unwrap().push((channel_id, message_id, reply));
        Ok(())
    }

    async fn latency(&self) -> Option<Duration> {
        Some(Duration::from_millis(42))
    }
}

#[async_trait]
impl Responder for RecordingBot {
    async fn respond(&self, reply: Reply) -> Result<SentMessage, BotError> {
        self.responses.lock().unwrap().push(reply);
        Ok(SentMessage {
            channel_id: RESPONSE_CHANNEL,
            message_id: self.next_message_id(),
        })
    }
}

/// Text of every response, in order
pub fn response_texts(bot: &RecordingBot) -> Vec<String> {
    bot.responses()
        .into_iter()
        .filter_map(|r| r.content)
        .collect()
}
