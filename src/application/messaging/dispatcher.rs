//! Command router - Resolves inbound events to registered handlers

use std::collections::HashMap;
use std::sync::Arc;

use super::parser::MessageParser;
use crate::application::errors::CommandError;
use crate::domain::entities::{
    Command, CommandRegistry, Content, MemberJoin, Message, Reply, SlashCommand, User,
};
use crate::domain::traits::{Bot, CommandContext, ComponentContext, Invocation, Responder};

/// Outcome of routing one event
#[derive(Debug)]
pub enum Dispatch {
    /// Not addressed to the bot
    Ignored,
    /// Prefixed, but no handler matched
    Unknown(String),
    /// Handler ran to completion
    Executed(String),
    /// Handler returned an error; already logged
    Failed { command: String, error: CommandError },
}

/// Routes messages and interactions through the shared registry
pub struct CommandRouter {
    parser: MessageParser,
    registry: Arc<CommandRegistry>,
}

impl CommandRouter {
    pub fn new(parser: MessageParser, registry: Arc<CommandRegistry>) -> Self {
        Self { parser, registry }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }

    /// Resolve a prefixed command name, including the `<extension> <command>` form
    fn resolve<'a>(&'a self, name: &str, args: &'a [String]) -> Option<(&'a Command, &'a [String])> {
        if let Some(cmd) = self.registry.find_prefix(name) {
            return Some((cmd, args));
        }
        if !self.registry.has_extension_named(name) {
            return None;
        }
        let (inner, rest) = args.split_first()?;
        self.registry
            .find_in_extension(name, inner)
            .map(|cmd| (cmd, rest))
    }

    /// Route a text message
    pub async fn dispatch_message(
        &self,
        message: &Message,
        bot: Arc<dyn Bot>,
        responder: Arc<dyn Responder>,
    ) -> Dispatch {
        if message.author.is_bot {
            return Dispatch::Ignored;
        }

        let Content::Command { name, args } = self.parser.parse(&message.text) else {
            return Dispatch::Ignored;
        };

        let Some((cmd, args)) = self.resolve(&name, &args) else {
            tracing::debug!(
                "[{}] Unknown command '{}' in message {}",
                message.channel_id,
                name,
                message.id
            );
            return Dispatch::Unknown(name);
        };

        let own_id = self.parser.mention_id();
        let mentions: Vec<User> = message
            .mentions
            .iter()
            .filter(|u| Some(u.id) != own_id)
            .cloned()
            .collect();

        let ctx = CommandContext {
            command: cmd.name.clone(),
            invocation: Invocation::Prefix,
            args: args.to_vec(),
            options: HashMap::new(),
            author: message.author.clone(),
            channel_id: message.channel_id,
            guild_id: message.guild_id,
            mentions,
            prefix: self.parser.prefix().to_string(),
            registry: self.registry.clone(),
            bot,
            responder,
        };
        self.run(cmd, ctx).await
    }

    /// Route a slash command interaction
    pub async fn dispatch_slash(
        &self,
        command: SlashCommand,
        bot: Arc<dyn Bot>,
        responder: Arc<dyn Responder>,
    ) -> Dispatch {
        let Some(cmd) = self.registry.find_slash(&command.name) else {
            tracing::warn!("Received unknown slash command: /{}", command.name);
            return Dispatch::Unknown(command.name);
        };

        let ctx = CommandContext {
            command: cmd.name.clone(),
            invocation: Invocation::Slash,
            args: Vec::new(),
            options: command.options,
            author: command.user,
            channel_id: command.channel_id,
            guild_id: command.guild_id,
            mentions: Vec::new(),
            prefix: self.parser.prefix().to_string(),
            registry: self.registry.clone(),
            bot,
            responder,
        };
        self.run(cmd, ctx).await
    }

    /// Route a button press
    pub async fn dispatch_component(&self, ctx: ComponentContext) -> Dispatch {
        let custom_id = ctx.custom_id.clone();
        let Some(handler) = self.registry.find_component(&custom_id) else {
            tracing::debug!("No component handler for '{}'", custom_id);
            return Dispatch::Unknown(custom_id);
        };

        match handler.handle(ctx).await {
            Ok(()) => Dispatch::Executed(custom_id),
            Err(error) => {
                tracing::error!("Component '{}' failed: {}", custom_id, error);
                Dispatch::Failed { command: custom_id, error }
            }
        }
    }

    /// Forward a member join to every listener; failures are logged and skipped
    pub async fn dispatch_member_join(&self, member: &MemberJoin, bot: Arc<dyn Bot>) {
        tracing::info!("{} joined guild {}", member.user, member.guild_id);
        for listener in self.registry.listeners() {
            if let Err(e) = listener.on_member_join(member, bot.clone()).await {
                tracing::error!("Member join listener failed for {}: {}", member.user, e);
            }
        }
    }

    async fn run(&self, cmd: &Command, ctx: CommandContext) -> Dispatch {
        let name = cmd.name.clone();
        let Some(handler) = cmd.handler.clone() else {
            tracing::warn!("Command '{}' has no handler", name);
            let error = CommandError::ExecutionFailed(format!("Command {} not implemented", name));
            return Dispatch::Failed { command: name, error };
        };

        tracing::info!(
            "Executing {} command '{}' for {} in {}",
            ctx.invocation,
            name,
            ctx.author,
            ctx.location()
        );
        let responder = ctx.responder.clone();

        match handler.invoke(ctx).await {
            Ok(()) => Dispatch::Executed(name),
            Err(error) => {
                tracing::error!("Command '{}' failed: {}", name, error);
                if let CommandError::InvalidArgs(_) = error {
                    let notice = Reply::text(format!("Error: {}", error)).ephemeral();
                    if let Err(e) = responder.respond(notice).await {
                        tracing::warn!("Failed to report error for '{}': {}", name, e);
                    }
                }
                Dispatch::Failed { command: name, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Command, CommandKind, OptionValue};
    use crate::domain::traits::CommandHandler;
    use crate::testing::{RecordingBot, BOT_ID};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Handler that records the arguments of each call
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl CommandHandler for Recorder {
        async fn invoke(&self, ctx: CommandContext) -> Result<(), CommandError> {
            self.calls.lock().unwrap().push((ctx.command.clone(), ctx.args.clone()));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl CommandHandler for Failing {
        async fn invoke(&self, _ctx: CommandContext) -> Result<(), CommandError> {
            Err(CommandError::InvalidArgs("bad input".to_string()))
        }
    }

    fn router_with(recorder: Arc<Recorder>) -> CommandRouter {
        let mut registry = CommandRegistry::default();
        registry
            .register(
                Command::new("ping")
                    .with_kind(CommandKind::Hybrid)
                    .owned_by("example")
                    .with_command_handler(recorder.clone()),
            )
            .unwrap();
        registry
            .register(Command::new("hello").owned_by("example").with_command_handler(recorder.clone()))
            .unwrap();
        registry
            .register(
                Command::new("userinfo")
                    .with_kind(CommandKind::Slash)
                    .with_command_handler(recorder.clone()),
            )
            .unwrap();
        registry
            .register(Command::new("broken").with_command_handler(Arc::new(Failing)))
            .unwrap();
        registry.mark_loaded("cogs.example", "Command examples");

        let parser = MessageParser::new(">");
        parser.set_mention(BOT_ID);
        CommandRouter::new(parser, Arc::new(registry))
    }

    fn message(text: &str) -> Message {
        Message::new(10, User::new(7, "alice"), text)
    }

    async fn route(router: &CommandRouter, text: &str) -> Dispatch {
        let bot = RecordingBot::new();
        router.dispatch_message(&message(text), bot.clone(), bot).await
    }

    #[tokio::test]
    async fn test_known_command_gets_split_arguments() {
        let recorder = Arc::new(Recorder::default());
        let router = router_with(recorder.clone());

        let outcome = route(&router, ">hello big  world").await;

        assert!(matches!(outcome, Dispatch::Executed(ref n) if n == "hello"));
        assert_eq!(
            recorder.calls.lock().unwrap().clone(),
            vec![("hello".to_string(), vec!["big".to_string(), "world".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_unknown_command_invokes_nothing() {
        let recorder = Arc::new(Recorder::default());
        let router = router_with(recorder.clone());

        let outcome = route(&router, ">nope 1 2").await;

        assert!(matches!(outcome, Dispatch::Unknown(ref n) if n == "nope"));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mention_behaves_like_literal_prefix() {
        let recorder = Arc::new(Recorder::default());
        let router = router_with(recorder.clone());

        route(&router, ">ping now").await;
        route(&router, &format!("<@{}> ping now", BOT_ID)).await;

        let calls = recorder.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn test_extension_qualified_invocation() {
        let recorder = Arc::new(Recorder::default());
        let router = router_with(recorder.clone());

        let outcome = route(&router, ">example ping").await;

        assert!(matches!(outcome, Dispatch::Executed(ref n) if n == "ping"));
        assert_eq!(
            recorder.calls.lock().unwrap().clone(),
            vec![("ping".to_string(), vec![])]
        );
    }

    #[tokio::test]
    async fn test_slash_only_command_is_not_a_prefix_command() {
        let recorder = Arc::new(Recorder::default());
        let router = router_with(recorder.clone());

        let outcome = route(&router, ">userinfo").await;

        assert!(matches!(outcome, Dispatch::Unknown(_)));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bots_and_plain_text_are_ignored() {
        let recorder = Arc::new(Recorder::default());
        let router = router_with(recorder.clone());
        let bot = RecordingBot::new();

        let from_bot = Message::new(10, User::new(8, "other-bot").bot(), ">ping");
        let outcome = router.dispatch_message(&from_bot, bot.clone(), bot.clone()).await;
        assert!(matches!(outcome, Dispatch::Ignored));

        let chatter = route(&router, "just talking").await;
        assert!(matches!(chatter, Dispatch::Ignored));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_reported_and_swallowed() {
        let router = router_with(Arc::new(Recorder::default()));
        let bot = RecordingBot::new();

        let outcome = router.dispatch_message(&message(">broken"), bot.clone(), bot.clone()).await;

        assert!(matches!(outcome, Dispatch::Failed { ref command, .. } if command == "broken"));
        let replies = bot.responses();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].content.as_deref(), Some("Error: Invalid arguments: bad input"));
    }

    #[tokio::test]
    async fn test_slash_dispatch_uses_options() {
        let recorder = Arc::new(Recorder::default());
        let router = router_with(recorder.clone());
        let bot = RecordingBot::new();

        let mut options = HashMap::new();
        options.insert("member".to_string(), OptionValue::User(User::new(9, "bob")));
        let slash = SlashCommand {
            name: "userinfo".to_string(),
            options,
            user: User::new(7, "alice"),
            channel_id: 10,
            guild_id: Some(3),
        };

        let outcome = router.dispatch_slash(slash, bot.clone(), bot).await;
        assert!(matches!(outcome, Dispatch::Executed(ref n) if n == "userinfo"));

        let missing = SlashCommand {
            name: "hello".to_string(),
            options: HashMap::new(),
            user: User::new(7, "alice"),
            channel_id: 10,
            guild_id: None,
        };
        let bot = RecordingBot::new();
        let outcome = router.dispatch_slash(missing, bot.clone(), bot).await;
        assert!(matches!(outcome, Dispatch::Unknown(_)));
    }
}
