//! Conversions between serenity models and the domain model

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use serenity::all::{
    ButtonStyle, CommandDataOptionValue, CommandInteraction, CommandOptionType, CreateActionRow,
    CreateButton, CreateCommand, CreateCommandOption, CreateEmbed, CreateEmbedFooter,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, CreateMessage, EditMessage,
    GuildId, Http, Message as DiscordMessage, RoleId, Timestamp, User as DiscordUser,
};

use crate::domain::entities::{
    Button, Command, Embed, MemberDetails, Message, OptionKind, OptionValue, Reply, SlashCommand, User,
};

/// Buttons per action row allowed by the platform
const BUTTONS_PER_ROW: usize = 5;

pub fn datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0)
}

pub fn user(user: &DiscordUser) -> User {
    let mut converted = User::new(user.id.get(), user.name.clone())
        .with_avatar(user.face());
    if let Some(created) = datetime(user.id.created_at()) {
        converted = converted.with_created_at(created);
    }
    if let Some(global) = &user.global_name {
        converted = converted.with_nickname(global.clone());
    }
    if user.bot {
        converted = converted.bot();
    }
    converted
}

pub fn message(msg: &DiscordMessage) -> Message {
    let mut author = user(&msg.author);
    if let Some(nick) = msg.member.as_ref().and_then(|m| m.nick.clone()) {
        author = author.with_nickname(nick);
    }

    Message::new(msg.channel_id.get(), author, msg.content.clone())
        .with_id(msg.id.get())
        .with_guild(msg.guild_id.map(|g| g.get()))
        .with_mentions(msg.mentions.iter().map(user).collect())
}

/// Resolve role ids into names (lowest role first) and the top coloured role
pub async fn member_details(
    http: &Http,
    guild_id: Option<GuildId>,
    joined_at: Option<Timestamp>,
    role_ids: &[RoleId],
) -> MemberDetails {
    let mut details = MemberDetails {
        joined_at: joined_at.and_then(datetime),
        ..MemberDetails::default()
    };

    let Some(guild_id) = guild_id else {
        return details;
    };
    if role_ids.is_empty() {
        return details;
    }

    match guild_id.roles(http).await {
        Ok(roles) => {
            let mut held: Vec<_> = role_ids.iter().filter_map(|id| roles.get(id)).collect();
            held.sort_by_key(|r| r.position);
            details.colour = held.iter().rev().map(|r| r.colour.0).find(|c| *c != 0);
            details.roles = held.into_iter().map(|r| r.name.clone()).collect();
        }
        Err(e) => tracing::warn!("Failed to fetch roles for guild {}: {}", guild_id, e),
    }
    details
}

/// Build the domain view of a slash command interaction
pub async fn slash_command(http: &Http, command: &CommandInteraction) -> SlashCommand {
    let mut invoker = user(&command.user);
    if let Some(member) = &command.member {
        if let Some(nick) = &member.nick {
            invoker = invoker.with_nickname(nick.clone());
        }
        let details = member_details(http, command.guild_id, member.joined_at, &member.roles).await;
        invoker = invoker.with_member(details);
    }

    let resolved = &command.data.resolved;
    let mut options = HashMap::new();
    for option in &command.data.options {
        let value = match &option.value {
            CommandDataOptionValue::String(s) => OptionValue::String(s.clone()),
            CommandDataOptionValue::Integer(i) => OptionValue::Integer(*i),
            CommandDataOptionValue::Boolean(b) => OptionValue::Boolean(*b),
            CommandDataOptionValue::User(id) => {
                let Some(found) = resolved.users.get(id) else {
                    continue;
                };
                let mut target = user(found);
                if let Some(member) = resolved.members.get(id) {
                    if let Some(nick) = &member.nick {
                        target = target.with_nickname(nick.clone());
                    }
                    let details =
                        member_details(http, command.guild_id, member.joined_at, &member.roles).await;
                    target = target.with_member(details);
                }
                OptionValue::User(target)
            }
            other => {
                tracing::debug!("Ignoring unsupported option '{}': {:?}", option.name, other);
                continue;
            }
        };
        options.insert(option.name.clone(), value);
    }

    SlashCommand {
        name: command.data.name.clone(),
        options,
        user: invoker,
        channel_id: command.channel_id.get(),
        guild_id: command.guild_id.map(|g| g.get()),
    }
}

pub fn embed(embed: &Embed) -> CreateEmbed {
    let mut out = CreateEmbed::new();
    if let Some(title) = &embed.title {
        out = out.title(title);
    }
    if let Some(description) = &embed.description {
        out = out.description(description);
    }
    if let Some(colour) = embed.colour {
        out = out.colour(colour);
    }
    for field in &embed.fields {
        out = out.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        out = out.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(url) = &embed.thumbnail {
        out = out.thumbnail(url);
    }
    out
}

pub fn action_rows(buttons: &[Button]) -> Vec<CreateActionRow> {
    buttons
        .chunks(BUTTONS_PER_ROW)
        .map(|row| {
            CreateActionRow::Buttons(
                row.iter()
                    .map(|b| CreateButton::new(&b.custom_id).label(&b.label).style(ButtonStyle::Primary))
                    .collect(),
            )
        })
        .collect()
}

pub fn create_message(reply: &Reply) -> CreateMessage {
    let mut out = CreateMessage::new();
    if let Some(content) = &reply.content {
        out = out.content(content);
    }
    if let Some(e) = &reply.embed {
        out = out.embed(embed(e));
    }
    if !reply.buttons.is_empty() {
        out = out.components(action_rows(&reply.buttons));
    }
    out
}

pub fn edit_message(reply: &Reply) -> EditMessage {
    let mut out = EditMessage::new();
    if let Some(content) = &reply.content {
        out = out.content(content);
    }
    if let Some(e) = &reply.embed {
        out = out.embed(embed(e));
    }
    if !reply.buttons.is_empty() {
        out = out.components(action_rows(&reply.buttons));
    } else if reply.clear_components {
        out = out.components(Vec::new());
    }
    out
}

pub fn interaction_message(reply: &Reply) -> CreateInteractionResponseMessage {
    let mut out = CreateInteractionResponseMessage::new().ephemeral(reply.ephemeral);
    if let Some(content) = &reply.content {
        out = out.content(content);
    }
    if let Some(e) = &reply.embed {
        out = out.embed(embed(e));
    }
    if !reply.buttons.is_empty() {
        out = out.components(action_rows(&reply.buttons));
    }
    out
}

pub fn followup(reply: &Reply) -> CreateInteractionResponseFollowup {
    let mut out = CreateInteractionResponseFollowup::new().ephemeral(reply.ephemeral);
    if let Some(content) = &reply.content {
        out = out.content(content);
    }
    if let Some(e) = &reply.embed {
        out = out.embed(embed(e));
    }
    if !reply.buttons.is_empty() {
        out = out.components(action_rows(&reply.buttons));
    }
    out
}

fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::User => CommandOptionType::User,
    }
}

/// Slash command registration payload
pub fn create_command(command: &Command) -> CreateCommand {
    let description = command.description.clone().unwrap_or_else(|| command.name.clone());
    command.options.iter().fold(
        CreateCommand::new(&command.name).description(description),
        |builder, option| {
            let kind = option_type(option.kind);
            let mut created =
                CreateCommandOption::new(kind, &option.name, &option.description).required(option.required);
            if let Some((min, max)) = option.range {
                created = created.min_int_value(min).max_int_value(max);
            }
            builder.add_option(created)
        },
    )
}
