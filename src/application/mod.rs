//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Built-in commands and registry assembly
//! - Errors: Domain-specific errors
//! - Messaging: Prefix parsing and dispatching

pub mod errors;
pub mod services;
pub mod messaging;
