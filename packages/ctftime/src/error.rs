use thiserror::Error;

#[derive(Debug, Error)]
pub enum CtftimeError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0} from the feed")]
    Status(u16),

    #[error("malformed feed: {0}")]
    Malformed(String),

    #[error("feed entry is missing its {0}")]
    Incomplete(&'static str),
}
