//! Poll cog - button voting with timed results

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::{CommandError, ExtensionError};
use crate::domain::entities::{
    Button, Command, CommandKind, CommandOption, Embed, OptionKind, Reply, SentMessage,
};
use crate::domain::traits::{Bot, CommandContext, CommandHandler, ComponentContext, ComponentHandler};
use crate::extensions::{Extension, ExtensionContext};

pub const BLUE: u32 = 0x3498db;
pub const GREEN: u32 = 0x2ecc71;

const BUTTON_PREFIX: &str = "poll_";
const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 10;
const DEFAULT_DURATION_MINUTES: i64 = 60;
/// One week
const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;
const BAR_CELLS: usize = 10;

/// Result of pressing an option button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Cast,
    Removed,
}

impl Vote {
    fn verb(&self) -> &'static str {
        match self {
            Vote::Cast => "Voted for",
            Vote::Removed => "Removed vote from",
        }
    }
}

/// One running poll
#[derive(Debug, Clone)]
pub struct Poll {
    pub title: String,
    pub options: Vec<String>,
    /// Voter ids per option, same order as `options`
    pub votes: Vec<HashSet<u64>>,
    pub multiple: bool,
    pub author_id: u64,
    pub ends_at: DateTime<Utc>,
}

/// `██░░░░░░░░` style bar for a percentage
fn bar(percentage: f64) -> String {
    let filled = ((percentage / 10.0) as usize).min(BAR_CELLS);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}

fn tally(votes: usize, total: usize) -> String {
    let percentage = if total > 0 {
        votes as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    format!("{} {} votes ({:.1}%)", bar(percentage), votes, percentage)
}

impl Poll {
    pub fn new(
        title: impl Into<String>,
        options: Vec<String>,
        multiple: bool,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            votes: vec![HashSet::new(); options.len()],
            options,
            multiple,
            author_id: 0,
            ends_at,
        }
    }

    pub fn started_by(mut self, author_id: u64) -> Self {
        self.author_id = author_id;
        self
    }

    pub fn total_votes(&self) -> usize {
        self.votes.iter().map(HashSet::len).sum()
    }

    /// Toggle `user`'s vote on `option`; `None` when the option does not exist
    pub fn toggle(&mut self, option: usize, user: u64) -> Option<Vote> {
        if option >= self.votes.len() {
            return None;
        }
        if self.votes[option].remove(&user) {
            return Some(Vote::Removed);
        }
        if !self.multiple {
            for voters in &mut self.votes {
                voters.remove(&user);
            }
        }
        self.votes[option].insert(user);
        Some(Vote::Cast)
    }

    pub fn buttons(&self) -> Vec<Button> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, option)| Button::new(option.clone(), format!("{}{}", BUTTON_PREFIX, i)))
            .collect()
    }

    /// Live status embed
    pub fn embed(&self, now: DateTime<Utc>) -> Embed {
        let mut description = "Please click buttons below to vote".to_string();
        if self.multiple {
            description.push_str("\n(Multiple choices allowed)");
        }

        let total = self.total_votes();
        let minutes_left = (self.ends_at - now).num_seconds() / 60;

        self.options
            .iter()
            .zip(&self.votes)
            .fold(
                Embed::new(format!("📊 {}", self.title)).description(description).colour(BLUE),
                |embed, (option, voters)| embed.field(option.clone(), tally(voters.len(), total), false),
            )
            .footer(format!("Time remaining: {} minutes", minutes_left))
    }

    /// Final results embed, every top-scoring option listed first as a winner
    pub fn results(&self) -> Embed {
        let mut embed = Embed::new(format!("📊 Poll Results: {}", self.title)).colour(GREEN);
        let total = self.total_votes();

        if total == 0 {
            for (i, option) in self.options.iter().enumerate() {
                embed = embed.field(format!("Option {}: {}", i + 1, option), "0 votes (0.0%)", false);
            }
            return embed.footer("Poll has ended");
        }

        let max = self.votes.iter().map(HashSet::len).max().unwrap_or(0);
        let counted: Vec<(usize, &String, usize)> = self
            .options
            .iter()
            .zip(&self.votes)
            .enumerate()
            .map(|(i, (option, voters))| (i, option, voters.len()))
            .collect();

        for (_, option, votes) in counted.iter().filter(|(_, _, v)| *v == max) {
            embed = embed.field(format!("🏆 Winning Option: {}", option), tally(*votes, total), false);
        }
        for (i, option, votes) in counted.iter().filter(|(_, _, v)| *v != max) {
            embed = embed.field(format!("Option {}: {}", i + 1, option), tally(*votes, total), false);
        }
        embed.footer("Poll has ended")
    }
}

/// Running polls keyed by the id of the message carrying them
#[derive(Clone, Default)]
pub struct PollBook {
    polls: Arc<RwLock<HashMap<u64, Poll>>>,
}

impl PollBook {
    pub async fn open(&self, message_id: u64, poll: Poll) {
        self.polls.write().await.insert(message_id, poll);
    }

    /// Apply a vote and return the outcome with the refreshed embed.
    /// Outer `None`: no such poll.
    pub async fn vote(
        &self,
        message_id: u64,
        option: usize,
        user: u64,
    ) -> Option<Option<(Vote, Embed)>> {
        let mut polls = self.polls.write().await;
        let poll = polls.get_mut(&message_id)?;
        Some(poll.toggle(option, user).map(|vote| (vote, poll.embed(Utc::now()))))
    }

    /// Close the poll, replace its message with the results and post them again
    pub async fn finish(&self, message: SentMessage, bot: Arc<dyn Bot>) {
        let Some(poll) = self.polls.write().await.remove(&message.message_id) else {
            return;
        };
        let results = poll.results();

        let edit = Reply::embed(results.clone()).clearing_components();
        if let Err(e) = bot.edit(message.channel_id, message.message_id, edit).await {
            tracing::error!("Failed to update poll results: {}", e);
        }
        if let Err(e) = bot.send(message.channel_id, Reply::embed(results)).await {
            tracing::error!("Failed to post poll results: {}", e);
        }
        tracing::info!(
            "Poll '{}' by {} ended with {} votes",
            poll.title,
            poll.author_id,
            poll.total_votes()
        );
    }
}

/// Voting system
#[derive(Default)]
pub struct PollCog {
    book: PollBook,
}

impl Extension for PollCog {
    fn name(&self) -> &str {
        "poll"
    }

    fn description(&self) -> &str {
        "Voting System"
    }

    fn setup(&self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        ctx.add_command(
            Command::new("poll")
                .with_kind(CommandKind::Slash)
                .with_description("Create a new poll")
                .with_option(CommandOption::new(OptionKind::String, "title", "Poll title").required())
                .with_option(
                    CommandOption::new(OptionKind::String, "options", "Options (comma-separated)").required(),
                )
                .with_option(
                    CommandOption::new(
                        OptionKind::Integer,
                        "duration",
                        "Poll duration in minutes (default 60)",
                    )
                    .with_range(1, MAX_DURATION_MINUTES as u64),
                )
                .with_option(CommandOption::new(
                    OptionKind::Boolean,
                    "multiple",
                    "Allow multiple choices (True/False)",
                ))
                .with_command_handler(Arc::new(CreatePoll { book: self.book.clone() })),
        );
        ctx.add_component(BUTTON_PREFIX, Arc::new(PollButtons { book: self.book.clone() }));
        Ok(())
    }
}

struct CreatePoll {
    book: PollBook,
}

/// Wall-clock length of a poll, or the reason the requested minutes are refused
fn poll_length(minutes: i64) -> Result<std::time::Duration, String> {
    if minutes < 1 {
        return Err("Duration must be at least 1 minute!".to_string());
    }
    if minutes > MAX_DURATION_MINUTES {
        return Err(format!("Duration must be at most {} minutes!", MAX_DURATION_MINUTES));
    }
    Ok(std::time::Duration::from_secs(minutes.unsigned_abs() * 60))
}

/// Trimmed, non-empty entries of a comma separated list
fn split_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[async_trait]
impl CommandHandler for CreatePoll {
    async fn invoke(&self, ctx: CommandContext) -> Result<(), CommandError> {
        let title = ctx
            .option_str("title")
            .ok_or_else(|| CommandError::InvalidArgs("missing option 'title'".to_string()))?;
        let options = split_options(ctx.option_str("options").unwrap_or_default());
        let duration = ctx.option_i64("duration").unwrap_or(DEFAULT_DURATION_MINUTES);
        let multiple = ctx.option_bool("multiple").unwrap_or(false);

        let checked = if options.len() < MIN_OPTIONS {
            Err("At least 2 options required!".to_string())
        } else if options.len() > MAX_OPTIONS {
            Err("Maximum 10 options allowed!".to_string())
        } else {
            poll_length(duration)
        };
        let length = match checked {
            Ok(length) => length,
            Err(text) => {
                ctx.reply(Reply::text(text).ephemeral()).await?;
                return Ok(());
            }
        };

        let opened = Utc::now();
        let ends_at = chrono::Duration::from_std(length)
            .ok()
            .and_then(|d| opened.checked_add_signed(d))
            .ok_or_else(|| CommandError::InvalidArgs(format!("duration {} is out of range", duration)))?;
        let poll = Poll::new(title, options, multiple, ends_at).started_by(ctx.author.id);
        let reply = Reply::embed(poll.embed(Utc::now())).with_buttons(poll.buttons());
        let sent = ctx.reply(reply).await?;

        tracing::info!("Poll '{}' opened by {} for {} minutes", poll.title, ctx.author, duration);
        self.book.open(sent.message_id, poll).await;

        let book = self.book.clone();
        let bot = ctx.bot.clone();
        tokio::spawn(async move {
            tokio::time::sleep(length).await;
            book.finish(sent, bot).await;
        });
        Ok(())
    }
}

struct PollButtons {
    book: PollBook,
}

#[async_trait]
impl ComponentHandler for PollButtons {
    async fn handle(&self, ctx: ComponentContext) -> Result<(), CommandError> {
        let option = ctx
            .custom_id
            .strip_prefix(BUTTON_PREFIX)
            .and_then(|i| i.parse::<usize>().ok())
            .ok_or_else(|| CommandError::InvalidArgs(format!("bad poll button '{}'", ctx.custom_id)))?;

        let Some(outcome) = self.book.vote(ctx.message_id, option, ctx.user.id).await else {
            ctx.reply(Reply::text("This poll has already ended!").ephemeral()).await?;
            return Ok(());
        };
        let (vote, embed) = outcome
            .ok_or_else(|| CommandError::InvalidArgs(format!("poll has no option {}", option + 1)))?;

        ctx.bot.edit(ctx.channel_id, ctx.message_id, Reply::embed(embed)).await?;
        ctx.reply(Reply::text(format!("You {} option {}!", vote.verb(), option + 1)).ephemeral())
            .await?;
        Ok(())
    }
}
