// src/extractors/date.rs
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};

// Feed publication dates, e.g. "Wed, 19 Feb 2025 16:57:00 +0900"
const FEED_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";
// Report body dates, e.g. "2025年2月12日"
const LOCALIZED_DATE_FORMAT: &str = "%Y年%m月%d日";

/// A date recovered from feed metadata or report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// Timestamp carrying a UTC offset (feed dates).
    Zoned(DateTime<FixedOffset>),
    /// Plain calendar date with no time of day or zone.
    Calendar(NaiveDate),
}

impl ParsedDate {
    /// The calendar date as written, in the value's own offset.
    pub fn date(&self) -> NaiveDate {
        match self {
            ParsedDate::Zoned(dt) => dt.date_naive(),
            ParsedDate::Calendar(d) => *d,
        }
    }

    pub fn year(&self) -> i32 {
        self.date().year()
    }

    pub fn month(&self) -> u32 {
        self.date().month()
    }

    pub fn day(&self) -> u32 {
        self.date().day()
    }

    /// Text form written to the database. Matches the layout SQLite tooling
    /// already reads for these columns: `2025-02-19 16:57:00+09:00` and
    /// `2025-02-12 00:00:00`.
    pub fn to_storage_string(&self) -> String {
        match self {
            ParsedDate::Zoned(dt) => dt.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
            ParsedDate::Calendar(d) => d.format("%Y-%m-%d 00:00:00").to_string(),
        }
    }
}

/// Parses a free-text date, trying each known layout in turn.
///
/// Order: strict feed layout, general RFC 2822 (zone names such as `GMT`),
/// RFC 3339 (Atom), then the `YYYY年MM月DD日` form. Returns `None` when nothing
/// matches; this never fails loudly.
pub fn parse_date(text: &str) -> Option<ParsedDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_str(text, FEED_DATE_FORMAT) {
        return Some(ParsedDate::Zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(ParsedDate::Zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedDate::Zoned(dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, LOCALIZED_DATE_FORMAT) {
        return Some(ParsedDate::Calendar(d));
    }

    tracing::trace!("Unrecognized date text: '{}'", text);
    None
}
