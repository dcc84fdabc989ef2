use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serenity::all::{ChannelId, Context, EventHandler, GuildId, Interaction, Reaction, Ready};
use serenity::async_trait;
use tracing::{error, info, warn};

use ctftime::CtftimeClient;
use registry::Registry;

use crate::config::AppConfig;
use crate::{commands, dashboard, poller};

pub struct Handler {
    registry: Registry,
    catalog: CtftimeClient,
    config: Arc<AppConfig>,
    started: AtomicBool,
}

impl Handler {
    pub fn new(registry: Registry, catalog: CtftimeClient, config: AppConfig) -> Self {
        Self {
            registry,
            catalog,
            config: Arc::new(config),
            started: AtomicBool::new(false),
        }
    }

    async fn handle_reaction(
        &self,
        ctx: &Context,
        reaction: &Reaction,
        added: bool,
    ) -> anyhow::Result<()> {
        let cfg = &self.config.discord;
        if reaction.guild_id != Some(GuildId::new(cfg.guild_id)) {
            return Ok(());
        }
        let emoji = reaction.emoji.to_string();
        if emoji != cfg.ok_emoji && emoji != cfg.maybe_emoji {
            return Ok(());
        }
        let Some(user_id) = reaction.user_id else {
            return Ok(());
        };
        if user_id == ctx.cache.current_user().id {
            return Ok(());
        }
        let message_id = reaction.message_id.to_string();
        if !self.registry.exists(&message_id).await? {
            return Ok(());
        }

        let member = GuildId::new(cfg.guild_id).member(&ctx.http, user_id).await?;
        let name = member.display_name().to_string();

        let text = if added {
            if emoji == cfg.ok_emoji {
                self.registry.add_participant(&message_id, &name).await?;
                let title = self.registry.get_event(&message_id).await?.title;
                format!("ℹ️ {name} signed up for `{title}` {}", cfg.ok_emoji)
            } else {
                self.registry
                    .add_maybe_participant(&message_id, &name)
                    .await?;
                let title = self.registry.get_event(&message_id).await?.title;
                format!("ℹ️ {name} might join `{title}` {}", cfg.maybe_emoji)
            }
        } else if emoji == cfg.ok_emoji {
            self.registry.remove_participant(&message_id, &name).await?;
            format!("➖ **{name}** withdrew {}", cfg.ok_emoji)
        } else {
            self.registry
                .remove_maybe_participant(&message_id, &name)
                .await?;
            format!("➖ **{name}** is no longer a maybe {}", cfg.maybe_emoji)
        };

        notice(ctx.http.clone(), reaction.channel_id, text);
        Ok(())
    }
}

/// Post a short notice and delete it after 30 seconds.
fn notice(http: Arc<serenity::http::Http>, channel: ChannelId, text: String) {
    tokio::spawn(async move {
        match channel.say(&http, text).await {
            Ok(msg) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                let _ = msg.delete(&http).await;
            }
            Err(e) => warn!(error = %e, "failed to send notice"),
        }
    });
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "connected to Discord");

        let guild = GuildId::new(self.config.discord.guild_id);
        if let Err(e) = commands::register(&ctx, guild).await {
            error!(error = %e, "failed to register slash commands");
        }

        // `ready` fires again on gateway reconnects; spawn the loops once.
        if !self.started.swap(true, Ordering::SeqCst) {
            tokio::spawn(poller::run(
                ctx.http.clone(),
                self.registry.clone(),
                self.catalog.clone(),
                self.config.clone(),
            ));
            tokio::spawn(dashboard::run(
                ctx.http.clone(),
                self.registry.clone(),
                self.config.clone(),
            ));
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(cmd) = interaction {
            commands::dispatch(&ctx, &cmd, &self.registry, &self.config).await;
        }
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        if let Err(e) = self.handle_reaction(&ctx, &reaction, true).await {
            warn!(error = %e, "failed to handle reaction add");
        }
    }

    async fn reaction_remove(&self, ctx: Context, reaction: Reaction) {
        if let Err(e) = self.handle_reaction(&ctx, &reaction, false).await {
            warn!(error = %e, "failed to handle reaction remove");
        }
    }
}
