//! Example cog - a listener plus one command of each kind

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::errors::{BotError, CommandError, ExtensionError};
use crate::domain::entities::{
    Command, CommandKind, CommandOption, Embed, MemberJoin, OptionKind, Reply, User,
};
use crate::domain::traits::{Bot, CommandContext, CommandHandler, EventListener};
use crate::extensions::{Extension, ExtensionContext};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Greets new members and provides `hello`, `ping` and `userinfo`
#[derive(Default)]
pub struct ExampleCog {
    last_member: Arc<Mutex<Option<u64>>>,
}

impl Extension for ExampleCog {
    fn name(&self) -> &str {
        "example"
    }

    fn description(&self) -> &str {
        "Command examples"
    }

    fn setup(&self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        ctx.add_listener(Arc::new(Welcome));

        ctx.add_command(
            Command::new("hello")
                .with_description("A simple greeting command")
                .with_usage("hello [member]")
                .with_command_handler(Arc::new(Hello {
                    last_member: self.last_member.clone(),
                })),
        );
        ctx.add_command(
            Command::new("ping")
                .with_kind(CommandKind::Hybrid)
                .with_description("Check bot's latency")
                .with_command_handler(Arc::new(Ping)),
        );
        ctx.add_command(
            Command::new("userinfo")
                .with_kind(CommandKind::Slash)
                .with_description("Get information about a user")
                .with_option(CommandOption::new(OptionKind::User, "member", "The member to look up"))
                .with_command_handler(Arc::new(UserInfo)),
        );
        Ok(())
    }
}

struct Welcome;

#[async_trait]
impl EventListener for Welcome {
    async fn on_member_join(&self, member: &MemberJoin, bot: Arc<dyn Bot>) -> Result<(), BotError> {
        let Some(channel_id) = member.system_channel_id else {
            return Ok(());
        };
        bot.send(channel_id, Reply::text(format!("Welcome {}.", member.user.mention())))
            .await?;
        Ok(())
    }
}

struct Hello {
    last_member: Arc<Mutex<Option<u64>>>,
}

/// Mentioned member, the author when nothing was given, or the author by name
fn target_member(ctx: &CommandContext) -> Result<User, CommandError> {
    if let Some(mentioned) = ctx.mentions.first() {
        return Ok(mentioned.clone());
    }
    if ctx.args.is_empty() {
        return Ok(ctx.author.clone());
    }

    let wanted = ctx.args.join(" ");
    let author = &ctx.author;
    if author.name.eq_ignore_ascii_case(&wanted) || author.display_name().eq_ignore_ascii_case(&wanted) {
        return Ok(author.clone());
    }
    Err(CommandError::InvalidArgs(format!("Member \"{}\" not found.", wanted)))
}

#[async_trait]
impl CommandHandler for Hello {
    async fn invoke(&self, ctx: CommandContext) -> Result<(), CommandError> {
        let member = target_member(&ctx)?;

        let text = {
            let mut last = self.last_member.lock().await;
            let text = if *last == Some(member.id) {
                format!("Hello {}... This feels familiar.", member.name)
            } else {
                format!("Hello {}~", member.name)
            };
            *last = Some(member.id);
            text
        };

        ctx.reply(Reply::text(text)).await?;
        Ok(())
    }
}

struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn invoke(&self, ctx: CommandContext) -> Result<(), CommandError> {
        let millis = ctx
            .bot
            .latency()
            .await
            .map(|d| (d.as_secs_f64() * 1000.0).round() as u64)
            .unwrap_or(0);
        ctx.reply(Reply::text(format!("Pong! Latency is {}ms", millis))).await?;
        Ok(())
    }
}

struct UserInfo;

pub fn user_info_embed(member: &User) -> Embed {
    let details = member.member.clone().unwrap_or_default();
    let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
        d.map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    };
    let roles = if details.roles.is_empty() {
        "No roles".to_string()
    } else {
        details.roles.join(", ")
    };

    let mut embed = Embed::new(format!("User Information for {}", member.name))
        .colour(details.colour.unwrap_or_default())
        .field("User ID", member.id.to_string(), false)
        .field("Joined Server", date(details.joined_at), false)
        .field("Account Created", date(member.created_at), false)
        .field("Roles", roles, false);
    if let Some(avatar) = &member.avatar_url {
        embed = embed.thumbnail(avatar.clone());
    }
    embed
}

#[async_trait]
impl CommandHandler for UserInfo {
    async fn invoke(&self, ctx: CommandContext) -> Result<(), CommandError> {
        let member = ctx.option_user("member").unwrap_or(&ctx.author);
        let embed = user_info_embed(member);
        ctx.reply(Reply::embed(embed)).await?;
        Ok(())
    }
}
