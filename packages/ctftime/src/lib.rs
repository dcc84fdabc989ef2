pub mod client;
pub mod error;
pub mod feed;
pub mod page;

pub use client::{CatalogEvent, CtftimeClient};
pub use error::{CtftimeError, FeedError};
pub use feed::FeedEntry;
pub use page::EventPage;
