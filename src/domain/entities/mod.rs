//! Domain entities - Core business objects with no platform dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod reply;

pub use user::{User, MemberDetails};
pub use message::{Message, Content, MemberJoin, SlashCommand};
pub use command::{Command, CommandKind, CommandOption, OptionKind, OptionValue, CommandRegistry};
pub use reply::{Reply, Embed, Button, SentMessage};
