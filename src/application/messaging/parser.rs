//! Message parser - Turns raw message text into commands

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::sync::OnceLock;

use crate::domain::entities::Content;

static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<@!?(\d+)>").expect("mention pattern is valid"));

/// Recognises the two command prefixes: a mention of the bot, or a literal string
#[derive(Debug, Clone)]
pub struct MessageParser {
    command_prefix: String,
    mention_id: OnceLock<u64>,
    mention_enabled: bool,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            mention_id: OnceLock::new(),
            mention_enabled: true,
        }
    }

    /// Accept `<@id>` / `<@!id>` as a prefix from now on. Adapters call this
    /// once they learn their own id; the first id wins.
    pub fn set_mention(&self, bot_id: u64) {
        let _ = self.mention_id.set(bot_id);
    }

    pub fn mention_id(&self) -> Option<u64> {
        self.mention_id.get().copied()
    }

    pub fn with_mention_enabled(mut self, enabled: bool) -> Self {
        self.mention_enabled = enabled;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Return the text after a recognised prefix
    pub fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        if let Some(rest) = self.strip_mention(text) {
            return Some(rest.trim_start());
        }
        if self.command_prefix.is_empty() {
            return None;
        }
        text.strip_prefix(self.command_prefix.as_str()).map(str::trim_start)
    }

    fn strip_mention<'a>(&self, text: &'a str) -> Option<&'a str> {
        let bot_id = self.mention_id().filter(|_| self.mention_enabled)?;
        let caps = MENTION.captures(text)?;
        let id: u64 = caps.get(1)?.as_str().parse().ok()?;
        if id != bot_id {
            return None;
        }
        let rest = &text[caps.get(0)?.end()..];
        // The mention must be followed by whitespace before the command name
        rest.starts_with(char::is_whitespace).then_some(rest)
    }

    /// Parse message text into command content
    pub fn parse(&self, text: &str) -> Content {
        let Some(cmd_text) = self.strip_prefix(text) else {
            return Content::Text;
        };

        let mut parts = split_args(cmd_text).into_iter();
        match parts.next() {
            Some(name) => Content::Command {
                name,
                args: parts.collect(),
            },
            None => Content::Empty,
        }
    }
}

/// Split on whitespace, keeping double-quoted runs together
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }
    args
}
