//! Discord adapter - gateway client and REST calls through serenity

pub mod convert;

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serenity::all::{
    ChannelId, Client, Command as DiscordCommand, CommandInteraction, ComponentInteraction, Context,
    CreateInteractionResponse, EventHandler, GatewayIntents, GuildId, Http, Interaction, Member,
    Message as DiscordMessage, MessageId, Ready, ShardId, ShardManager,
};

use crate::application::errors::BotError;
use crate::application::messaging::CommandRouter;
use crate::domain::entities::{MemberJoin, Reply, SentMessage};
use crate::domain::traits::{Bot, ChannelResponder, ComponentContext, Responder};
use crate::infrastructure::config::Config;

/// Gateway intents the bot needs: guild messages with content plus member joins
pub fn intents() -> GatewayIntents {
    GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT | GatewayIntents::GUILD_MEMBERS
}

/// Library version, taken from the user agent serenity sends
fn serenity_version() -> &'static str {
    let agent = serenity::constants::USER_AGENT;
    agent
        .rsplit(", ")
        .next()
        .map(|v| v.trim_end_matches(')'))
        .unwrap_or(agent)
}

/// Lines logged once the gateway session is ready
fn banner(user: &str, bot_id: u64, slash_commands: usize) -> Vec<String> {
    vec![
        format!("Logged in as {}", user),
        format!("Bot ID {}", bot_id),
        format!("Serenity version {}", serenity_version()),
        format!("{} version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        format!("Slash commands synchronized {} commands", slash_commands),
    ]
}

/// Shard manager, set once the client is built
type SharedShards = Arc<OnceLock<Arc<ShardManager>>>;

/// Discord bot adapter
pub struct DiscordAdapter {
    http: Arc<Http>,
    shards: SharedShards,
    shard_id: ShardId,
}

impl DiscordAdapter {
    fn from_context(ctx: &Context, shards: SharedShards) -> Self {
        Self {
            http: ctx.http.clone(),
            shards,
            shard_id: ctx.shard_id,
        }
    }
}

#[async_trait]
impl Bot for DiscordAdapter {
    async fn send(&self, channel_id: u64, reply: Reply) -> Result<SentMessage, BotError> {
        let sent = ChannelId::new(channel_id)
            .send_message(&*self.http, convert::create_message(&reply))
            .await?;
        Ok(SentMessage {
            channel_id: sent.channel_id.get(),
            message_id: sent.id.get(),
        })
    }

    async fn edit(&self, channel_id: u64, message_id: u64, reply: Reply) -> Result<(), BotError> {
        ChannelId::new(channel_id)
            .edit_message(&*self.http, MessageId::new(message_id), convert::edit_message(&reply))
            .await?;
        Ok(())
    }

    async fn latency(&self) -> Option<Duration> {
        let manager = self.shards.get()?;
        let runners = manager.runners.lock().await;
        runners.get(&self.shard_id).and_then(|runner| runner.latency)
    }
}

enum Pending {
    Command(CommandInteraction),
    Component(ComponentInteraction),
}

/// Answers an interaction: the first reply is the interaction response,
/// later ones are followups.
pub struct InteractionResponder {
    http: Arc<Http>,
    interaction: Pending,
    responded: AtomicBool,
}

impl InteractionResponder {
    fn new(http: Arc<Http>, interaction: Pending) -> Self {
        Self {
            http,
            interaction,
            responded: AtomicBool::new(false),
        }
    }

    async fn initial(&self, reply: &Reply) -> Result<SentMessage, BotError> {
        let response = CreateInteractionResponse::Message(convert::interaction_message(reply));
        let (channel_id, sent) = match &self.interaction {
            Pending::Command(i) => {
                i.create_response(&*self.http, response).await?;
                let sent = if reply.ephemeral { None } else { Some(i.get_response(&*self.http).await?) };
                (i.channel_id, sent)
            }
            Pending::Component(i) => {
                i.create_response(&*self.http, response).await?;
                let sent = if reply.ephemeral { None } else { Some(i.get_response(&*self.http).await?) };
                (i.channel_id, sent)
            }
        };
        // Ephemeral messages cannot be edited later, so their id is not fetched
        Ok(SentMessage {
            channel_id: channel_id.get(),
            message_id: sent.map(|m| m.id.get()).unwrap_or_default(),
        })
    }

    async fn followup(&self, reply: &Reply) -> Result<SentMessage, BotError> {
        let builder = convert::followup(reply);
        let sent = match &self.interaction {
            Pending::Command(i) => i.create_followup(&*self.http, builder).await?,
            Pending::Component(i) => i.create_followup(&*self.http, builder).await?,
        };
        Ok(SentMessage {
            channel_id: sent.channel_id.get(),
            message_id: sent.id.get(),
        })
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn respond(&self, reply: Reply) -> Result<SentMessage, BotError> {
        if self.responded.swap(true, Ordering::SeqCst) {
            self.followup(&reply).await
        } else {
            self.initial(&reply).await
        }
    }
}

/// Gateway event handler feeding the command router
pub struct Handler {
    router: Arc<CommandRouter>,
    shards: SharedShards,
    guild_id: Option<u64>,
    sync_commands: bool,
    synced: AtomicBool,
}

impl Handler {
    pub fn new(
        router: Arc<CommandRouter>,
        shards: SharedShards,
        guild_id: Option<u64>,
        sync_commands: bool,
    ) -> Self {
        Self {
            router,
            shards,
            guild_id,
            sync_commands,
            synced: AtomicBool::new(false),
        }
    }

    fn bot(&self, ctx: &Context) -> Arc<dyn Bot> {
        Arc::new(DiscordAdapter::from_context(ctx, self.shards.clone()))
    }

    /// Push the slash command table to Discord. Failure is logged, not fatal
    async fn sync_slash_commands(&self, ctx: &Context) {
        let commands: Vec<_> = self
            .router
            .registry()
            .slash_commands()
            .map(convert::create_command)
            .collect();

        tracing::info!("Synchronizing {} slash commands...", commands.len());
        let result = match self.guild_id {
            Some(guild) => GuildId::new(guild).set_commands(&ctx.http, commands).await,
            None => DiscordCommand::set_global_commands(&ctx.http, commands).await,
        };

        match result {
            Ok(synced) => tracing::info!("Synchronized {} slash commands.", synced.len()),
            Err(e) => tracing::error!("Failed to synchronize slash commands: {}", e),
        }
    }

    async fn on_command(&self, ctx: &Context, command: CommandInteraction) {
        let slash = convert::slash_command(&ctx.http, &command).await;
        let responder = Arc::new(InteractionResponder::new(ctx.http.clone(), Pending::Command(command)));
        self.router.dispatch_slash(slash, self.bot(ctx), responder).await;
    }

    async fn on_component(&self, ctx: &Context, component: ComponentInteraction) {
        let press = ComponentContext {
            custom_id: component.data.custom_id.clone(),
            message_id: component.message.id.get(),
            channel_id: component.channel_id.get(),
            user: convert::user(&component.user),
            bot: self.bot(ctx),
            responder: Arc::new(InteractionResponder::new(ctx.http.clone(), Pending::Component(component))),
        };
        self.router.dispatch_component(press).await;
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.router.parser().set_mention(ready.user.id.get());

        // Ready fires again after reconnects; only sync once per process
        if self.sync_commands && !self.synced.swap(true, Ordering::SeqCst) {
            self.sync_slash_commands(&ctx).await;
        }

        let registered = self.router.registry().slash_commands().count();
        for line in banner(&ready.user.name, ready.user.id.get(), registered) {
            tracing::info!("{}", line);
        }
    }

    async fn message(&self, ctx: Context, msg: DiscordMessage) {
        let message = convert::message(&msg);
        let bot = self.bot(&ctx);
        let responder = Arc::new(ChannelResponder::new(bot.clone(), message.channel_id));
        self.router.dispatch_message(&message, bot, responder).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.on_command(&ctx, command).await,
            Interaction::Component(component) => self.on_component(&ctx, component).await,
            other => tracing::debug!("Ignoring interaction of kind {:?}", other.kind()),
        }
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let system_channel_id = match new_member.guild_id.to_partial_guild(&ctx).await {
            Ok(guild) => guild.system_channel_id.map(|c| c.get()),
            Err(e) => {
                tracing::warn!("Failed to fetch guild {}: {}", new_member.guild_id, e);
                None
            }
        };

        let join = MemberJoin {
            guild_id: new_member.guild_id.get(),
            system_channel_id,
            user: convert::user(&new_member.user),
        };
        self.router.dispatch_member_join(&join, self.bot(&ctx)).await;
    }
}

/// Connect to the gateway and serve until shutdown
pub async fn run(config: &Config, router: Arc<CommandRouter>) -> Result<(), BotError> {
    let token = config.token()?;
    let shards: SharedShards = Arc::new(OnceLock::new());
    let handler = Handler::new(
        router,
        shards.clone(),
        config.discord.guild_id,
        config.discord.sync_commands,
    );

    let mut client = Client::builder(token, intents())
        .event_handler(handler)
        .await?;

    let manager = client.shard_manager.clone();
    let _ = shards.set(manager.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down...");
            manager.shutdown_all().await;
        }
    });

    tracing::info!("Connecting to Discord...");
    client.start().await?;
    Ok(())
}
