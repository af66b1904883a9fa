//! Built-in cogs
//!
//! Each cog is an [`Extension`] registered under `cogs.<name>`; list the
//! identifiers under `extensions.load` in the config to enable them.

pub mod example;
pub mod poll;

use std::sync::Arc;

use crate::extensions::{Extension, ExtensionCatalog};

pub use example::ExampleCog;
pub use poll::PollCog;

fn example() -> Arc<dyn Extension> {
    Arc::new(ExampleCog::default())
}

fn poll() -> Arc<dyn Extension> {
    Arc::new(PollCog::default())
}

/// Every cog compiled into this binary
pub fn catalog() -> ExtensionCatalog {
    ExtensionCatalog::new()
        .with("cogs.example", example)
        .with("cogs.poll", poll)
}
