use serenity::all::{
    Colour, CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage, GuildId,
};
use tracing::{error, warn};

use registry::{EventRecord, Registry, RegistryError};

use crate::config::AppConfig;
use crate::dashboard;

pub async fn register(ctx: &Context, guild: GuildId) -> serenity::Result<()> {
    guild
        .set_commands(
            &ctx.http,
            vec![
                CreateCommand::new("participants")
                    .description("Show who signed up for an event")
                    .add_option(
                        CreateCommandOption::new(
                            CommandOptionType::String,
                            "ctftime_id",
                            "CTFtime event id",
                        )
                        .required(true),
                    ),
                CreateCommand::new("next").description("Next upcoming event with participants"),
                CreateCommand::new("calendar")
                    .description("Upcoming events with participants, refreshed on demand"),
            ],
        )
        .await?;
    Ok(())
}

pub async fn dispatch(
    ctx: &Context,
    cmd: &CommandInteraction,
    registry: &Registry,
    config: &AppConfig,
) {
    let response = match cmd.data.name.as_str() {
        "participants" => participants(cmd, registry).await,
        "next" => next_event(registry).await,
        "calendar" => calendar(registry, config).await,
        other => {
            warn!(command = other, "unknown command");
            return;
        }
    };

    let message = match response {
        Ok(message) => message,
        Err(e) => {
            error!(error = %e, command = %cmd.data.name, "command failed");
            CreateInteractionResponseMessage::new()
                .content("Something went wrong.")
                .ephemeral(true)
        }
    };

    if let Err(e) = cmd
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
    {
        warn!(error = %e, "failed to respond to interaction");
    }
}

async fn participants(
    cmd: &CommandInteraction,
    registry: &Registry,
) -> anyhow::Result<CreateInteractionResponseMessage> {
    let id = cmd
        .data
        .options
        .first()
        .and_then(|o| o.value.as_str())
        .unwrap_or_default();

    match registry.get_event(id).await {
        Ok(record) => {
            let title = format!("Participants for \u{ab} {} \u{bb}", record.title);
            Ok(CreateInteractionResponseMessage::new()
                .embed(roster_embed(&record, title, false))
                .ephemeral(true))
        }
        Err(RegistryError::NotFound(_)) => Ok(CreateInteractionResponseMessage::new()
            .content(format!("❌ No event with id `{id}`."))
            .ephemeral(true)),
        Err(e) => Err(e.into()),
    }
}

async fn next_event(registry: &Registry) -> anyhow::Result<CreateInteractionResponseMessage> {
    match registry.next_event(chrono::Utc::now()).await {
        Ok(record) => {
            let title = format!("Next event \u{ab} {} \u{bb}", record.title);
            Ok(CreateInteractionResponseMessage::new()
                .embed(roster_embed(&record, title, true))
                .ephemeral(true))
        }
        Err(RegistryError::NoUpcomingEvent) => Ok(CreateInteractionResponseMessage::new()
            .content("❌ No upcoming event with participants.")
            .ephemeral(true)),
        Err(e) => Err(e.into()),
    }
}

async fn calendar(
    registry: &Registry,
    config: &AppConfig,
) -> anyhow::Result<CreateInteractionResponseMessage> {
    let embed = dashboard::calendar_embed(registry, config).await?;
    Ok(CreateInteractionResponseMessage::new().embed(embed))
}

fn roster_embed(record: &EventRecord, title: String, with_start: bool) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(title).colour(Colour::RED);

    if with_start {
        embed = embed.field("⌚ When", record.start.clone(), false);
    }

    let going = if record.participants.is_empty() {
        "Nobody yet…".to_string()
    } else {
        record.participants.join("\n")
    };
    let maybe = if record.maybe_participants.is_empty() {
        "—".to_string()
    } else {
        record.maybe_participants.join("\n")
    };

    embed
        .field("👥 Going", going, false)
        .field("❓ Maybe", maybe, false)
}
