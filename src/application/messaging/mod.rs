//! Message handling - Prefix parsing and event routing

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{CommandRouter, Dispatch};
pub use parser::MessageParser;
