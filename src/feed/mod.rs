// src/feed/mod.rs
pub mod client;
pub mod models;
pub mod parser;

use crate::utils::error::FeedError;
use async_trait::async_trait;

pub use client::HttpFeedClient;
pub use models::FeedEntry;
pub use parser::parse_feed;

/// Transport that turns a feed URL into the raw document bytes.
#[async_trait]
pub trait FeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FeedError>;
}
