use std::sync::Arc;
use std::time::Duration;

use serenity::http::Http;
use tracing::{info, warn};

use ctftime::{CtftimeClient, feed};
use registry::Registry;

use crate::announce;
use crate::config::AppConfig;

/// Sequential feed poll on a fixed interval. `exists` is the freshness gate;
/// the idempotent upsert absorbs anything that slips through.
pub async fn run(
    http: Arc<Http>,
    registry: Registry,
    catalog: CtftimeClient,
    config: Arc<AppConfig>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.feed.poll_interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(url = %config.feed.url, "feed poller started");
    loop {
        ticker.tick().await;
        if let Err(e) = poll_once(&http, &registry, &catalog, &config).await {
            warn!(error = %e, "feed poll failed");
        }
    }
}

async fn poll_once(
    http: &Arc<Http>,
    registry: &Registry,
    catalog: &CtftimeClient,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let Some(entry) = feed::fetch_latest(catalog.http(), &config.feed.url).await? else {
        return Ok(());
    };

    if registry.exists(&entry.ctftime_id).await? {
        return Ok(());
    }

    info!(ctftime_id = %entry.ctftime_id, title = %entry.title, "new event sighted");
    announce::announce(http, registry, catalog, config, &entry).await
}
