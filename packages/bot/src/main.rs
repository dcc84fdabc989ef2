mod announce;
mod commands;
mod config;
mod dashboard;
mod handler;
mod poller;

use anyhow::Context as _;
use serenity::all::GatewayIntents;
use tracing::info;

use crate::config::AppConfig;
use crate::handler::Handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = registry::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize the registry database")?;
    let tz: chrono_tz::Tz = config
        .database
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {e}", config.database.timezone))?;
    let reg = registry::Registry::new(db, tz);

    let catalog = ctftime::CtftimeClient::new().context("Failed to build the CTFtime client")?;

    info!(guild = config.discord.guild_id, "ctfwatch starting");

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let token = config.discord.token.clone();
    let mut client = serenity::Client::builder(&token, intents)
        .event_handler(Handler::new(reg, catalog, config))
        .await
        .context("Failed to build the Discord client")?;

    client.start().await.context("Discord client stopped")?;
    Ok(())
}
