// src/feed/models.rs

/// One item of a disclosure feed, independent of the feed dialect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,           // unique key of a report
    pub published: Option<String>, // raw date text as the feed wrote it
    pub description: Option<String>, // may still contain HTML
}

/// A parsed feed document.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}
