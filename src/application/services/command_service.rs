use crate::domain::entities::{Command, CommandRegistry, Reply};
use crate::application::errors::ExtensionError;

/// Assembles the command registry before extensions load
pub struct CommandService {
    registry: CommandRegistry,
    prefix: String,
}

impl CommandService {
    pub fn new(prefix: impl Into<String>, case_insensitive: bool) -> Self {
        Self {
            registry: CommandRegistry::new(case_insensitive),
            prefix: prefix.into(),
        }
    }

    pub fn register(&mut self, command: Command) -> Result<(), ExtensionError> {
        self.registry.register(command)
    }

    pub fn register_defaults(&mut self) -> Result<(), ExtensionError> {
        self.register(
            Command::new("help")
                .with_description("Shows this message")
                .with_usage("help [command]")
                .with_handler(|ctx| {
                    let topic = ctx.args.first().map(String::as_str);
                    Ok(Reply::text(Self::get_help(&ctx.registry, &ctx.prefix, topic)))
                }),
        )
    }

    pub fn get_help(registry: &CommandRegistry, prefix: &str, command: Option<&str>) -> String {
        if let Some(name) = command {
            if let Some(cmd) = registry.find_prefix(name) {
                let description = cmd.description.as_deref().unwrap_or("No description");
                let mut help = format!("{}{} - {}", prefix, cmd.name, description);
                if !cmd.aliases.is_empty() {
                    help.push_str(&format!("\nAliases: {}", cmd.aliases.join(", ")));
                }
                if let Some(usage) = &cmd.usage {
                    help.push_str(&format!("\nUsage: {}{}", prefix, usage));
                }
                return help;
            }
            if let Some(description) = registry.extension_description(name) {
                return Self::extension_help(registry, prefix, name, description);
            }
            return format!("No command called \"{}\" found.", name);
        }

        // List all prefix commands
        let mut help = "Available commands:\n".to_string();
        for cmd in registry.all().filter(|c| c.kind.accepts_prefix()) {
            let description = cmd.description.as_deref().unwrap_or("");
            help.push_str(&format!("  {}{} - {}\n", prefix, cmd.name, description));
        }
        help.push_str(&format!("Type {}help command for more info on a command.", prefix));
        help
    }

    /// Extension description followed by its prefix commands
    fn extension_help(registry: &CommandRegistry, prefix: &str, name: &str, description: &str) -> String {
        let mut help = String::new();
        if !description.is_empty() {
            help.push_str(description);
            help.push_str("\n\n");
        }
        help.push_str("Commands:\n");
        for cmd in registry.prefix_commands_in(name) {
            let description = cmd.description.as_deref().unwrap_or("");
            help.push_str(&format!("  {}{} - {}\n", prefix, cmd.name, description));
        }
        help.push_str(&format!("Type {}help command for more info on a command.", prefix));
        help
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> CommandRegistry {
        self.registry
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CommandKind;

    fn service() -> CommandService {
        let mut service = CommandService::new(">", true);
        service.register_defaults().unwrap();
        service
            .register(Command::new("ping")
                .with_kind(CommandKind::Hybrid)
                .with_description("Check bot's latency")
                .with_aliases(vec!["latency".to_string()]))
            .unwrap();
        service
            .register(
                Command::new("userinfo")
                    .with_kind(CommandKind::Slash)
                    .with_description("Get information about a user"),
            )
            .unwrap();
        service
    }

    #[test]
    fn test_help_lists_prefix_commands_only() {
        let service = service();
        let help = CommandService::get_help(&service.registry, service.prefix(), None);

        assert!(help.starts_with("Available commands:\n"));
        assert!(help.contains("  >help - Shows this message\n"));
        assert!(help.contains("  >ping - Check bot's latency\n"));
        assert!(!help.contains("userinfo"));
    }

    #[test]
    fn test_help_for_single_command() {
        let service = service();

        let help = CommandService::get_help(&service.registry, ">", Some("LATENCY"));
        assert_eq!(help, ">ping - Check bot's latency\nAliases: latency");

        let help = CommandService::get_help(&service.registry, ">", Some("help"));
        assert_eq!(help, ">help - Shows this message\nUsage: >help [command]");
    }

    #[test]
    fn test_help_for_unknown_command() {
        let service = service();
        let help = CommandService::get_help(&service.registry, ">", Some("nope"));
        assert_eq!(help, "No command called \"nope\" found.");
    }

    #[test]
    fn test_help_for_extension_shows_description() {
        let mut service = service();
        service
            .register(Command::new("hello").with_description("A simple greeting command").owned_by("example"))
            .unwrap();
        service
            .register(Command::new("userinfo2").with_kind(CommandKind::Slash).owned_by("example"))
            .unwrap();
        service.registry_mut().mark_loaded("cogs.example", "Command examples");

        let help = CommandService::get_help(&service.registry, ">", Some("Example"));
        let expected = [
            "Command examples",
            "",
            "Commands:",
            "  >hello - A simple greeting command",
            "Type >help command for more info on a command.",
        ];
        assert_eq!(help, expected.join("\n"));
    }

    #[test]
    fn test_defaults_register_once() {
        let mut service = service();
        assert!(service.register_defaults().is_err());
        assert_eq!(service.into_registry().all().count(), 3);
    }
}
