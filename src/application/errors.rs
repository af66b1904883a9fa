//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serenity::Error> for BotError {
    fn from(e: serenity::Error) -> Self {
        BotError::Platform(e.to_string())
    }
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Failed to reply: {0}")]
    Reply(Box<BotError>),
}

impl From<BotError> for CommandError {
    fn from(e: BotError) -> Self {
        CommandError::Reply(Box::new(e))
    }
}

/// Extension loading errors
#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("Extension '{0}' could not be found")]
    NotFound(String),

    #[error("Extension '{0}' is already loaded")]
    AlreadyLoaded(String),

    #[error("Command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("Extension setup failed: {0}")]
    Setup(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
