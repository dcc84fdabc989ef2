use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: u64,
    /// Channel announcements are posted to.
    pub channel_id: u64,
    /// Channel holding the self-refreshing calendar message.
    pub dashboard_channel_id: u64,
    #[serde(default = "default_ok_emoji")]
    pub ok_emoji: String,
    #[serde(default = "default_maybe_emoji")]
    pub maybe_emoji: String,
    #[serde(default = "default_not_emoji")]
    pub not_emoji: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Seconds between sequential polls. Default: 30.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Seconds between calendar refreshes. Default: 20.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Calendar window in days. Default: 30.
    #[serde(default = "default_span_days")]
    pub span_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Community timezone for anchoring naive dates. Default: Europe/Paris.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_ok_emoji() -> String {
    "✅".into()
}
fn default_maybe_emoji() -> String {
    "🤔".into()
}
fn default_not_emoji() -> String {
    "❌".into()
}
fn default_feed_url() -> String {
    "https://ctftime.org/event/list/upcoming/rss/".into()
}
fn default_poll_interval() -> u64 {
    30
}
fn default_refresh_secs() -> u64 {
    20
}
fn default_span_days() -> i64 {
    30
}
fn default_db_url() -> String {
    "sqlite://data/events.db?mode=rwc".into()
}
fn default_timezone() -> String {
    "Europe/Paris".into()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
            span_days: default_span_days(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CTFWATCH_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., CTFWATCH__DISCORD__TOKEN)
            .add_source(Environment::with_prefix("CTFWATCH").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
