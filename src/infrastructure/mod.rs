//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Logging: Console log formatting
//! - Adapters: Platform integrations (Discord, console)

pub mod config;
pub mod logging;
pub mod adapters;
