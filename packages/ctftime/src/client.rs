use std::time::Duration;

use serde::Deserialize;

use crate::error::CtftimeError;
use crate::page::EventPage;

pub const DEFAULT_BASE_URL: &str = "https://ctftime.org";

/// One event as returned by the catalog API (`/api/v1/events/{id}/`).
/// Date fields are kept as raw text; the registry normalizes them at query
/// time.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEvent {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub ctftime_url: String,
    pub start: String,
    pub finish: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub onsite: bool,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub restrictions: String,
    #[serde(default)]
    pub participants: u64,
}

#[derive(Debug, Clone)]
pub struct CtftimeClient {
    http: reqwest::Client,
    base_url: String,
}

impl CtftimeClient {
    pub fn new() -> Result<Self, CtftimeError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, CtftimeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("ctfwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// The shared HTTP client, reused by the feed adapter.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetch one event from the catalog API.
    pub async fn event(&self, ctftime_id: u64) -> Result<CatalogEvent, CtftimeError> {
        let url = format!("{}/api/v1/events/{}/", self.base_url, ctftime_id);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CtftimeError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(resp.json().await?)
    }

    /// Fetch the public event page. It carries the two flags the API does not
    /// expose (individual-only participation, on-line format).
    pub async fn event_page(&self, ctftime_id: u64) -> Result<EventPage, CtftimeError> {
        let url = format!("{}/event/{}", self.base_url, ctftime_id);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CtftimeError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(EventPage::parse(&resp.text().await?))
    }
}
