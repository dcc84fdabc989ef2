use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serenity::all::{
    ChannelId, Colour, CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage, MessageId,
    Timestamp,
};
use serenity::http::Http;
use tracing::{info, warn};

use registry::{Registry, RegistryError};

use crate::config::AppConfig;

/// Keep one calendar message in the dashboard channel up to date.
pub async fn run(http: Arc<Http>, registry: Registry, config: Arc<AppConfig>) {
    let channel = ChannelId::new(config.discord.dashboard_channel_id);
    let mut message_id: Option<MessageId> = None;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.dashboard.refresh_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(channel = config.discord.dashboard_channel_id, "dashboard loop started");
    loop {
        ticker.tick().await;
        if let Err(e) = refresh(&http, channel, &mut message_id, &registry, &config).await {
            warn!(error = %e, "dashboard refresh failed");
        }
    }
}

async fn refresh(
    http: &Arc<Http>,
    channel: ChannelId,
    message_id: &mut Option<MessageId>,
    registry: &Registry,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let embed = calendar_embed(registry, config).await?;

    if let Some(id) = *message_id {
        match channel
            .edit_message(http, id, EditMessage::new().embed(embed.clone()))
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) => {
                // The message was likely deleted by hand; post a fresh one.
                warn!(error = %e, "could not edit the calendar message, recreating");
                *message_id = None;
            }
        }
    }

    let msg = channel
        .send_message(http, CreateMessage::new().embed(embed))
        .await?;
    *message_id = Some(msg.id);
    Ok(())
}

/// Rolling calendar of upcoming events with interest. Shared by the refresh
/// loop and the `/calendar` command.
pub async fn calendar_embed(
    registry: &Registry,
    config: &AppConfig,
) -> Result<CreateEmbed, RegistryError> {
    let span = config.dashboard.span_days;
    match registry.events_in_window(Utc::now(), span).await {
        Ok(events) => {
            let mut embed = CreateEmbed::new()
                .title(format!("📅 Next {} events (≤{span} days)", events.len()))
                .colour(Colour::BLUE)
                .timestamp(Timestamp::now())
                .footer(CreateEmbedFooter::new("Auto-refreshed"));

            for ev in &events {
                let going = if ev.participants.is_empty() {
                    "—".to_string()
                } else {
                    ev.participants.join(", ")
                };
                let maybe = if ev.maybe_participants.is_empty() {
                    "—".to_string()
                } else {
                    ev.maybe_participants.join(", ")
                };
                embed = embed.field(
                    format!("🔗 {}", ev.title),
                    format!(
                        "**Start:** {}\n**End:** {}\n**Going:** {}\n**Maybe:** {}\n{}",
                        ev.start, ev.end, going, maybe, ev.url
                    ),
                    false,
                );
            }
            Ok(embed)
        }
        Err(RegistryError::NoUpcomingEvent) => Ok(CreateEmbed::new()
            .title("📅 No upcoming events")
            .description(format!(
                "No CTF with participants in the next {span} days."
            ))
            .colour(Colour::ORANGE)),
        Err(e) => Err(e),
    }
}
