//! Application services - Built-in behaviour that is not owned by an extension

pub mod command_service;

pub use command_service::CommandService;
