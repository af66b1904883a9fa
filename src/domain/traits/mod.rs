//! Domain traits - Abstractions for platform adapters and extension handlers

pub mod bot;
pub mod handler;

pub use bot::{Bot, ChannelResponder, Responder};
pub use handler::{
    CommandContext, CommandHandler, ComponentContext, ComponentHandler, EventListener, Invocation,
};
