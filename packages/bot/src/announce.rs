use std::sync::Arc;

use serenity::all::{ChannelId, Colour, CreateEmbed, CreateMessage, ReactionType};
use serenity::http::Http;
use tracing::warn;

use ctftime::{CtftimeClient, FeedEntry};
use registry::NewEvent;

use crate::config::AppConfig;

/// Display text for dates the source has not published yet.
const UPCOMING: &str = "upcoming";

/// Post the announcement embed, seed the reaction trio, then register the
/// event under the posted message id.
pub async fn announce(
    http: &Arc<Http>,
    registry: &registry::Registry,
    catalog: &CtftimeClient,
    config: &AppConfig,
    entry: &FeedEntry,
) -> anyhow::Result<()> {
    // The feed entry lacks the long description; best-effort catalog lookup.
    let detail = match entry.ctftime_id.parse::<u64>() {
        Ok(num) => match catalog.event(num).await {
            Ok(ev) => Some(ev),
            Err(e) => {
                warn!(error = %e, ctftime_id = %entry.ctftime_id, "catalog lookup failed, announcing from the feed entry");
                None
            }
        },
        Err(_) => None,
    };

    let title = detail
        .as_ref()
        .map(|d| d.title.clone())
        .unwrap_or_else(|| entry.title.clone());
    let description = detail
        .as_ref()
        .map(|d| d.description.clone())
        .unwrap_or_default();
    let start = or_upcoming(&entry.start_text);
    let end = or_upcoming(&entry.end_text);

    let mut embed = CreateEmbed::new()
        .title(format!("🚩 {title}"))
        .url(entry.link.clone())
        .colour(Colour::RED)
        .field("⌚ Start", start.clone(), true)
        .field("🏁 End", end.clone(), true);
    if !description.is_empty() {
        embed = embed.description(description.clone());
    }
    if let Some(weight) = &entry.weight {
        embed = embed.field("⚖️ Weight", weight.clone(), true);
    }

    let channel = ChannelId::new(config.discord.channel_id);
    let msg = channel
        .send_message(http, CreateMessage::new().embed(embed))
        .await?;

    let cfg = &config.discord;
    for emoji in [&cfg.ok_emoji, &cfg.maybe_emoji, &cfg.not_emoji] {
        match ReactionType::try_from(emoji.as_str()) {
            Ok(reaction) => {
                if let Err(e) = msg.react(http, reaction).await {
                    warn!(error = %e, emoji = %emoji, "failed to seed reaction");
                }
            }
            Err(e) => warn!(error = %e, emoji = %emoji, "not a valid reaction emoji"),
        }
    }

    registry
        .upsert_event(NewEvent {
            ctftime_id: entry.ctftime_id.clone(),
            message_id: msg.id.to_string(),
            title,
            url: entry.link.clone(),
            start,
            end,
            description,
        })
        .await?;

    Ok(())
}

fn or_upcoming(text: &str) -> String {
    if text.trim().is_empty() {
        UPCOMING.to_string()
    } else {
        text.to_string()
    }
}
