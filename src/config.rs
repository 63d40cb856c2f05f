// src/config.rs
use crate::market::enricher::DEFAULT_EXCHANGE_SUFFIX;
use std::collections::HashSet;
use std::path::PathBuf;

/// Feeds processed when no URL is given on the command line.
pub const DEFAULT_FEEDS: &[&str] = &["https://ufocatch.com/a8/Rss/Filer/E35239"];
pub const DEFAULT_DB_PATH: &str = "reports.db";

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub feeds: Vec<String>,
    pub db_path: PathBuf,
    pub exchange_suffix: String,
    pub fetch_prices: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            exchange_suffix: DEFAULT_EXCHANGE_SUFFIX.to_string(),
            fetch_prices: true,
        }
    }
}

impl Settings {
    /// A feed URL replaces the default feed list; a database path replaces
    /// the default file.
    pub fn new(feed_url: Option<String>, db_path: Option<PathBuf>) -> Self {
        let defaults = Self::default();
        let feeds = match feed_url {
            Some(url) => vec![url],
            None => defaults.feeds,
        };
        Self {
            feeds: dedup_feeds(feeds),
            db_path: db_path.unwrap_or(defaults.db_path),
            ..defaults
        }
    }

    pub fn with_exchange_suffix(mut self, suffix: &str) -> Self {
        self.exchange_suffix = suffix.to_string();
        self
    }

    pub fn with_prices(mut self, fetch_prices: bool) -> Self {
        self.fetch_prices = fetch_prices;
        self
    }
}

/// Drops blank and repeated URLs, keeping first-seen order.
pub fn dedup_feeds<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
