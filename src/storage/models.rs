// src/storage/models.rs
#![allow(dead_code)]
use crate::extractors::{ParsedDate, ReportFields};
use crate::feed::FeedEntry;
use crate::market::MarketPrices;

/// A fully normalized report, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub published_date: Option<ParsedDate>,
    pub fields: ReportFields,
    pub prices: MarketPrices,
}

/// Year/month/day columns used for indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePartition {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<ParsedDate> for DatePartition {
    fn from(date: ParsedDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl ReportRecord {
    pub fn new(entry: &FeedEntry, published_date: Option<ParsedDate>, fields: ReportFields, prices: MarketPrices) -> Self {
        Self {
            title: entry.title.clone(),
            link: entry.link.clone(),
            published: entry.published.clone(),
            published_date,
            fields,
            prices,
        }
    }

    /// Publication date components, else the obligation date's.
    pub fn partition(&self) -> Option<DatePartition> {
        self.published_date
            .or(self.fields.report_date_parsed)
            .map(DatePartition::from)
    }
}

/// A row of the `reports` table as read back.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReport {
    pub id: i64,
    pub title: Option<String>,
    pub link: String,
    pub published: Option<String>,
    pub published_date: Option<String>,
    pub ticker: Option<String>,
    pub company: Option<String>,
    pub percentage: Option<f64>,
    pub percentage_change: Option<String>,
    pub percentage_change_value: Option<f64>,
    pub percentage_change_direction: i64,
    pub change_flag: Option<String>,
    pub report_date: Option<String>,
    pub report_date_timestamp: Option<String>,
    pub reason: Option<String>,
    pub reason_type: i64,
    pub purpose: Option<String>,
    pub report_date_close: Option<f64>,
    pub current_price: Option<f64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredReport {
    pub(crate) const COLUMNS: &'static str = "id, title, link, published, published_date, ticker, company, \
         percentage, percentage_change, percentage_change_value, percentage_change_direction, \
         change_flag, report_date, report_date_timestamp, reason, reason_type, purpose, \
         report_date_close, current_price, year, month, day, created_at, updated_at";

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            link: row.get("link")?,
            published: row.get("published")?,
            published_date: row.get("published_date")?,
            ticker: row.get("ticker")?,
            company: row.get("company")?,
            percentage: row.get("percentage")?,
            percentage_change: row.get("percentage_change")?,
            percentage_change_value: row.get("percentage_change_value")?,
            percentage_change_direction: row
                .get::<_, Option<i64>>("percentage_change_direction")?
                .unwrap_or(0),
            change_flag: row.get("change_flag")?,
            report_date: row.get("report_date")?,
            report_date_timestamp: row.get("report_date_timestamp")?,
            reason: row.get("reason")?,
            reason_type: row.get::<_, Option<i64>>("reason_type")?.unwrap_or(0),
            purpose: row.get("purpose")?,
            report_date_close: row.get("report_date_close")?,
            current_price: row.get("current_price")?,
            year: row.get("year")?,
            month: row.get("month")?,
            day: row.get("day")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
