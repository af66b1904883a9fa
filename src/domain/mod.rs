//! Domain layer - Core bot model with no platform dependencies
//!
//! This layer contains:
//! - Entities: Core objects (User, Message, Command, Reply)
//! - Traits: Abstractions for adapters and handlers (Bot, Responder, CommandHandler)

pub mod entities;
pub mod traits;
