use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

mod domain;
mod application;
mod infrastructure;
mod extensions;
mod cogs;
#[cfg(test)]
mod testing;

use application::errors::BotError;
use application::messaging::{CommandRouter, MessageParser};
use application::services::CommandService;
use extensions::{ExtensionLoader, FailurePolicy};
use infrastructure::adapters::console::ConsoleAdapter;
use infrastructure::adapters::discord;
use infrastructure::config::Config;
use infrastructure::logging;

#[derive(Parser)]
#[command(name = "cog-bot")]
#[command(about = "A Discord bot built from loadable cogs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config and DISCORD_TOKEN)
    #[arg(short, long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default)
    Run {
        /// Read messages from stdin instead of connecting to Discord
        #[arg(long)]
        console: bool,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run { console: false }) {
        Commands::Run { console } => match run_bot(&cli.config, cli.token, console) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{}", e);
                eprintln!("Fatal: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Version => {
            println!("cog-bot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(&cli.config),
    }
}

/// Config file (when present) with environment and CLI overrides applied
fn load_config(config_path: &str, token_override: Option<String>) -> (Config, Option<String>) {
    let (config, warning) = if Path::new(config_path).exists() {
        match Config::load(config_path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(format!("Failed to load config: {}, using defaults", e))),
        }
    } else {
        (Config::default(), None)
    };

    let mut config = config.with_env();
    if let Some(token) = token_override {
        config.discord.token = Some(token);
    }
    (config, warning)
}

/// Register built-in commands, then load the configured extensions in order
fn build_router(config: &Config) -> Result<Arc<CommandRouter>, BotError> {
    let mut commands = CommandService::new(&config.bot.prefix, config.bot.case_insensitive);
    commands.register_defaults()?;

    let loader = ExtensionLoader::new(cogs::catalog()).with_policy(config.extensions.on_failure);
    let report = loader.load_all(&config.extensions.load, commands.registry_mut());
    if report.is_success() {
        tracing::info!("Loaded {}/{} extensions", report.loaded.len(), report.attempted.len());
    } else {
        tracing::warn!(
            "Loaded {}/{} extensions, {} failed",
            report.loaded.len(),
            report.attempted.len(),
            report.failed.len()
        );
    }

    if loader.policy() == FailurePolicy::Abort {
        if let Some((_, error)) = report.failed.into_iter().next() {
            return Err(error.into());
        }
    }

    let parser = MessageParser::new(commands.prefix()).with_mention_enabled(config.bot.mention_prefix);
    Ok(Arc::new(CommandRouter::new(parser, Arc::new(commands.into_registry()))))
}

fn run_bot(config_path: &str, token_override: Option<String>, console: bool) -> Result<(), BotError> {
    let (config, warning) = load_config(config_path, token_override);
    logging::init(&config.logging);
    if let Some(warning) = warning {
        tracing::warn!("{}", warning);
    }
    config.validate()?;

    tracing::info!("Starting cog-bot: {}", config.bot.name);
    let router = build_router(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    if console {
        let bot = Arc::new(ConsoleAdapter::new(config.bot.name.clone()));
        rt.block_on(bot.run(router))
    } else {
        rt.block_on(discord::run(&config, router))
    }
}

/// Write the default configuration to `path`, never overwriting an existing file
fn init_config(path: &str) -> ExitCode {
    if Path::new(path).exists() {
        eprintln!("{} already exists, not overwriting", path);
        return ExitCode::FAILURE;
    }

    let written = Config::default()
        .to_yaml()
        .map_err(BotError::from)
        .and_then(|yaml| std::fs::write(path, yaml).map_err(BotError::from));

    match written {
        Ok(()) => {
            println!("Wrote default config to {}", path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::ExtensionError;
    use crate::domain::entities::{Message, User};
    use crate::testing::{response_texts, RecordingBot};

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::try_parse_from(["cog-bot"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "config.yaml");

        let cli = Cli::try_parse_from(["cog-bot", "run", "--console", "--token", "abc"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run { console: true })));
        assert_eq!(cli.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let (config, warning) = load_config("/nonexistent/cog-bot.yaml", Some("from-cli".to_string()));
        assert!(warning.is_none());
        assert_eq!(config.token().unwrap(), "from-cli");
    }

    #[test]
    fn test_abort_policy_fails_startup() {
        let mut config = Config::default();
        config.extensions.load = vec!["cogs.missing".to_string(), "cogs.example".to_string()];
        assert!(build_router(&config).is_ok());

        config.extensions.on_failure = FailurePolicy::Abort;
        let err = build_router(&config).err().unwrap();
        assert!(matches!(err, BotError::Extension(ExtensionError::NotFound(ref id)) if id == "cogs.missing"));
    }

    #[tokio::test]
    async fn test_started_bot_answers_prefixed_and_mentioned_commands() {
        let router = build_router(&Config::default()).unwrap();
        router.parser().set_mention(99);
        let bot = RecordingBot::new();

        for text in [">ping", "<@99> ping", "<@!99>   example   ping", ">help nope", "ping"] {
            let message = Message::new(10, User::new(7, "alice"), text);
            router.dispatch_message(&message, bot.clone(), bot.clone()).await;
        }

        assert_eq!(
            response_texts(&bot),
            vec![
                "Pong! Latency is 42ms",
                "Pong! Latency is 42ms",
                "Pong! Latency is 42ms",
                "No command called \"nope\" found.",
            ]
        );
    }
}
