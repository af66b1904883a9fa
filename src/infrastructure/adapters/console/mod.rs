//! Console adapter for development/testing
//!
//! Reads lines from stdin and routes them like chat messages:
//! - `>ping`, `>help` ... prefix commands
//! - `/poll title=Lunch options="pizza, sushi"` slash commands
//! - `:press <message-id> <custom-id>` button presses

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::BotError;
use crate::application::messaging::parser::split_args;
use crate::application::messaging::{CommandRouter, Dispatch};
use crate::domain::entities::{Message, OptionKind, OptionValue, Reply, SentMessage, SlashCommand, User};
use crate::domain::traits::{Bot, ChannelResponder, ComponentContext};

const CONSOLE_CHANNEL: u64 = 1;
/// Id the bot answers to when mentioned as `<@0>`
const CONSOLE_BOT_ID: u64 = 0;

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    name: String,
    user: User,
    next_id: AtomicU64,
}

impl ConsoleAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: User::new(1, "console"),
            next_id: AtomicU64::new(1),
        }
    }

    /// Text rendering of a reply
    pub fn render(reply: &Reply) -> String {
        let mut lines = Vec::new();
        if let Some(content) = &reply.content {
            lines.push(content.clone());
        }
        if let Some(embed) = &reply.embed {
            if let Some(title) = &embed.title {
                lines.push(format!("== {} ==", title));
            }
            if let Some(description) = &embed.description {
                lines.push(description.clone());
            }
            for field in &embed.fields {
                lines.push(format!("  {}: {}", field.name, field.value));
            }
            if let Some(footer) = &embed.footer {
                lines.push(format!("  -- {}", footer));
            }
        }
        if !reply.buttons.is_empty() {
            let row: Vec<String> = reply
                .buttons
                .iter()
                .map(|b| format!("{} ({})", b.label, b.custom_id))
                .collect();
            lines.push(format!("  [Buttons] {}", row.join(" | ")));
        }
        lines.join("\n")
    }

    /// Read stdin until EOF, routing every line
    pub async fn run(self: Arc<Self>, router: Arc<CommandRouter>) -> Result<(), BotError> {
        tracing::info!("Starting console bot {} (dev mode)", self.name);
        router.parser().set_mention(CONSOLE_BOT_ID);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if let Some(text) = self.handle_line(&router, input).await.as_ref().and_then(notice) {
                println!("{}", text);
            }
        }

        tracing::info!("Console closed");
        Ok(())
    }

    /// Route one input line; `None` when the line was malformed
    async fn handle_line(self: &Arc<Self>, router: &CommandRouter, input: &str) -> Option<Dispatch> {
        let bot: Arc<dyn Bot> = self.clone();
        let responder = Arc::new(ChannelResponder::new(bot.clone(), CONSOLE_CHANNEL));

        if let Some(rest) = input.strip_prefix(":press") {
            let parts = split_args(rest);
            let message_id = parts.first().and_then(|m| m.parse::<u64>().ok());
            let (Some(message_id), Some(custom_id)) = (message_id, parts.get(1)) else {
                println!("Usage: :press <message-id> <custom-id>");
                return None;
            };
            let ctx = ComponentContext {
                custom_id: custom_id.clone(),
                message_id,
                channel_id: CONSOLE_CHANNEL,
                user: self.user.clone(),
                bot,
                responder,
            };
            Some(router.dispatch_component(ctx).await)
        } else if let Some(rest) = input.strip_prefix('/') {
            let Some(command) = self.parse_slash(router, rest) else {
                println!("Usage: /<command> key=value ...");
                return None;
            };
            Some(router.dispatch_slash(command, bot, responder).await)
        } else {
            let message = Message::new(CONSOLE_CHANNEL, self.user.clone(), input)
                .with_id(self.next_id.fetch_add(1, Ordering::SeqCst));
            Some(router.dispatch_message(&message, bot, responder).await)
        }
    }

    fn parse_slash(&self, router: &CommandRouter, input: &str) -> Option<SlashCommand> {
        let mut parts = split_args(input).into_iter();
        let name = parts.next()?;
        let declared = router.registry().find_slash(&name).map(|c| c.options.clone()).unwrap_or_default();

        let mut options = HashMap::new();
        for part in parts {
            let (key, raw) = part.split_once('=')?;
            let kind = declared
                .iter()
                .find(|o| o.name == key)
                .map(|o| o.kind)
                .unwrap_or(OptionKind::String);
            options.insert(key.to_string(), parse_option(kind, raw, &self.user)?);
        }

        Some(SlashCommand {
            name,
            options,
            user: self.user.clone(),
            channel_id: CONSOLE_CHANNEL,
            guild_id: None,
        })
    }
}

/// Console feedback for outcomes that leave no reply in the chat
fn notice(outcome: &Dispatch) -> Option<String> {
    match outcome {
        Dispatch::Executed(name) => {
            tracing::debug!("Console input handled by '{}'", name);
            None
        }
        Dispatch::Unknown(name) => Some(format!("(no handler for '{}')", name)),
        Dispatch::Failed { command, error } => Some(format!("({} failed: {})", command, error)),
        Dispatch::Ignored => None,
    }
}

/// Coerce console text into a typed option value
fn parse_option(kind: OptionKind, raw: &str, me: &User) -> Option<OptionValue> {
    match kind {
        OptionKind::String => Some(OptionValue::String(raw.to_string())),
        OptionKind::Integer => raw.parse().ok().map(OptionValue::Integer),
        OptionKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(OptionValue::Boolean(true)),
            "false" | "no" | "0" => Some(OptionValue::Boolean(false)),
            _ => None,
        },
        // Only the console user exists here
        OptionKind::User => Some(OptionValue::User(me.clone())),
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new("cog-bot")
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send(&self, channel_id: u64, reply: Reply) -> Result<SentMessage, BotError> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let marker = if reply.ephemeral { " (only you)" } else { "" };
        println!("[BOT #{}]{} {}", message_id, marker, Self::render(&reply));
        Ok(SentMessage { channel_id, message_id })
    }

    async fn edit(&self, _channel_id: u64, message_id: u64, reply: Reply) -> Result<(), BotError> {
        println!("[BOT #{} edited] {}", message_id, Self::render(&reply));
        Ok(())
    }

    async fn latency(&self) -> Option<Duration> {
        Some(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::messaging::MessageParser;
    use crate::application::errors::CommandError;
    use crate::domain::entities::{Button, Command, CommandKind, CommandOption, CommandRegistry, Embed};

    #[test]
    fn test_render_embed_and_buttons() {
        let reply = Reply::embed(
            Embed::new("📊 Lunch")
                .description("Please click buttons below to vote")
                .field("pizza", "░░░░░░░░░░ 0 votes (0.0%)", false)
                .footer("Time remaining: 59 minutes"),
        )
        .with_buttons(vec![Button::new("pizza", "poll_0")]);

        let text = ConsoleAdapter::render(&reply);
        let expected = [
            "== 📊 Lunch ==",
            "Please click buttons below to vote",
            "  pizza: ░░░░░░░░░░ 0 votes (0.0%)",
            "  -- Time remaining: 59 minutes",
            "  [Buttons] pizza (poll_0)",
        ];
        assert_eq!(text, expected.join("\n"));
    }

    #[test]
    fn test_slash_options_follow_declared_kinds() {
        let mut registry = CommandRegistry::default();
        registry
            .register(
                Command::new("poll")
                    .with_kind(CommandKind::Slash)
                    .with_option(CommandOption::new(OptionKind::String, "title", "Poll title").required())
                    .with_option(CommandOption::new(OptionKind::Integer, "duration", "Minutes"))
                    .with_option(CommandOption::new(OptionKind::Boolean, "multiple", "Multi")),
            )
            .unwrap();
        let router = CommandRouter::new(MessageParser::new(">"), Arc::new(registry));
        let console = ConsoleAdapter::default();

        let slash = console
            .parse_slash(&router, r#"poll "title=Team lunch" duration=5 multiple=yes"#)
            .unwrap();

        assert_eq!(slash.name, "poll");
        assert_eq!(slash.options.get("title"), Some(&OptionValue::String("Team lunch".to_string())));
        assert_eq!(slash.options.get("duration"), Some(&OptionValue::Integer(5)));
        assert_eq!(slash.options.get("multiple"), Some(&OptionValue::Boolean(true)));

        assert!(console.parse_slash(&router, "poll duration=soon").is_none());
        assert!(console.parse_slash(&router, "poll novalue").is_none());
    }

    #[tokio::test]
    async fn test_lines_report_outcomes_without_chat_reply() {
        let mut registry = CommandRegistry::default();
        registry
            .register(Command::new("ping").with_handler(|_| Ok(Reply::text("pong"))))
            .unwrap();
        registry
            .register(
                Command::new("broken")
                    .with_handler(|_| Err(CommandError::ExecutionFailed("boom".to_string()))),
            )
            .unwrap();
        let router = CommandRouter::new(MessageParser::new(">"), Arc::new(registry));
        let console = Arc::new(ConsoleAdapter::default());

        let handled = console.handle_line(&router, ">ping").await;
        assert!(matches!(handled, Some(Dispatch::Executed(ref n)) if n == "ping"));
        assert_eq!(handled.as_ref().and_then(notice), None);

        let unknown = console.handle_line(&router, ">nope").await;
        assert_eq!(unknown.as_ref().and_then(notice).as_deref(), Some("(no handler for 'nope')"));

        let failed = console.handle_line(&router, ">broken").await;
        assert_eq!(
            failed.as_ref().and_then(notice).as_deref(),
            Some("(broken failed: Execution failed: boom)")
        );

        let pressed = console.handle_line(&router, ":press 4 poll_0").await;
        assert_eq!(pressed.as_ref().and_then(notice).as_deref(), Some("(no handler for 'poll_0')"));

        assert!(console.handle_line(&router, ":press soon").await.is_none());
        assert!(console.handle_line(&router, "/ping novalue").await.is_none());
    }
}
