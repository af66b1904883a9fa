//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;
use crate::extensions::FailurePolicy;

/// Environment variable holding the Discord bot token
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub extensions: ExtensionsConfig,
    pub discord: DiscordConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    /// Literal command prefix
    pub prefix: String,
    /// Accept a mention of the bot as a prefix too
    pub mention_prefix: bool,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtensionsConfig {
    /// Extension identifiers, loaded in this order
    pub load: Vec<String>,
    pub on_failure: FailurePolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscordConfig {
    pub token: Option<String>,
    /// Register slash commands in this guild only (instant) instead of globally
    pub guild_id: Option<u64>,
    pub sync_commands: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub ansi: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "cog-bot".to_string(),
            prefix: ">".to_string(),
            mention_prefix: true,
            case_insensitive: true,
        }
    }
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            load: vec!["cogs.example".to_string()],
            on_failure: FailurePolicy::Continue,
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            guild_id: None,
            sync_commands: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Overlay environment variables on top of this configuration
    pub fn with_env(mut self) -> Self {
        self.apply_env(|key| std::env::var(key).ok());
        self
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.discord.token = Some(token);
        }

        if let Some(prefix) = lookup("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }
    }

    /// Token for the Discord adapter; absence is fatal
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.discord
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField(TOKEN_ENV.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.is_empty() && !self.bot.mention_prefix {
            return Err(ConfigError::InvalidValue(
                "bot.prefix is empty and mention-prefix is disabled".to_string(),
            ));
        }
        if self.bot.prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "bot.prefix must not contain whitespace: {:?}",
                self.bot.prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_classic_setup() {
        let config = Config::default();
        assert_eq!(config.bot.prefix, ">");
        assert!(config.bot.mention_prefix);
        assert!(config.bot.case_insensitive);
        assert_eq!(config.extensions.load, vec!["cogs.example".to_string()]);
        assert_eq!(config.extensions.on_failure, FailurePolicy::Continue);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = [
            "extensions:",
            "  load: [cogs.example, cogs.poll]",
            "  on-failure: abort",
            "discord:",
            "  guild-id: 1234",
        ]
        .join("\n");
        let config = Config::from_yaml(&yaml).unwrap();

        assert_eq!(config.extensions.load, vec!["cogs.example", "cogs.poll"]);
        assert_eq!(config.extensions.on_failure, FailurePolicy::Abort);
        assert_eq!(config.discord.guild_id, Some(1234));
        assert!(config.discord.sync_commands);
        assert_eq!(config.bot.prefix, ">");
    }

    #[test]
    fn test_invalid_yaml_is_a_parse_error() {
        let err = Config::from_yaml("extensions: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = [("DISCORD_TOKEN", "abc"), ("BOT_PREFIX", "!")].into_iter().collect();
        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.token().unwrap(), "abc");
        assert_eq!(config.bot.prefix, "!");
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut config = Config::default();
        config.apply_env(|_| None);
        assert!(matches!(config.token(), Err(ConfigError::MissingField(ref f)) if f == "DISCORD_TOKEN"));

        config.discord.token = Some("   ".to_string());
        assert!(config.token().is_err());
    }

    #[test]
    fn test_validate_rejects_unusable_prefixes() {
        let mut config = Config::default();
        config.bot.prefix = "> ".to_string();
        assert!(config.validate().is_err());

        config.bot.prefix = String::new();
        config.bot.mention_prefix = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_of_defaults() {
        let yaml = Config::default().to_yaml().unwrap();
        assert!(yaml.contains("on-failure: continue"));
        assert!(yaml.contains("- cogs.example"));
    }
}
