//! Extension system for cog-bot
//!
//! Extensions ("cogs") are compiled into the binary and registered in an
//! [`ExtensionCatalog`] under a dotted identifier such as `cogs.example`.
//! The configured list of identifiers is loaded in order at startup; each
//! extension registers its commands, button handlers and listeners.

pub mod catalog;
pub mod loader;
pub mod trait_def;

pub use catalog::ExtensionCatalog;
pub use loader::{ExtensionLoader, FailurePolicy};
pub use trait_def::{Extension, ExtensionContext};

/// Last dot-separated segment of an extension identifier
pub fn short_name(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}
