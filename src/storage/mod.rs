// src/storage/mod.rs
pub mod models;
mod schema;

use crate::utils::error::StorageError;
use chrono::{DateTime, Utc};
use rusqlite::{named_params, Connection, OptionalExtension as _};
use std::fs;
use std::path::Path;

pub use models::{ReportRecord, StoredReport};
use schema::SCHEMA;

const INSERT_REPORT: &str = "
INSERT INTO reports (
    title, link, published, published_date, ticker,
    company, percentage, percentage_change, percentage_change_value,
    percentage_change_direction, change_flag, report_date, report_date_timestamp,
    reason, reason_type, purpose, report_date_close, current_price,
    year, month, day, created_at, updated_at
) VALUES (
    :title, :link, :published, :published_date, :ticker,
    :company, :percentage, :percentage_change, :percentage_change_value,
    :percentage_change_direction, :change_flag, :report_date, :report_date_timestamp,
    :reason, :reason_type, :purpose, :report_date_close, :current_price,
    :year, :month, :day, :now, :now
)";

// Full overwrite of every mutable column; created_at is left as first written
const UPDATE_REPORT: &str = "
UPDATE reports SET
    title = :title, published = :published, published_date = :published_date,
    ticker = :ticker, company = :company, percentage = :percentage,
    percentage_change = :percentage_change,
    percentage_change_value = :percentage_change_value,
    percentage_change_direction = :percentage_change_direction,
    change_flag = :change_flag, report_date = :report_date,
    report_date_timestamp = :report_date_timestamp, reason = :reason,
    reason_type = :reason_type, purpose = :purpose,
    report_date_close = :report_date_close, current_price = :current_price,
    year = :year, month = :month, day = :day,
    updated_at = :now
WHERE link = :link";

/// What an upsert did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// SQLite-backed store for reports, keyed by link.
pub struct ReportStore {
    conn: Connection,
}

impl ReportStore {
    /// Opens (or creates) the database at `path` and bootstraps the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();

        // Create the parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens a throwaway in-memory store.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Inserts or overwrites the row for `record.link`, stamped with the
    /// current time.
    pub fn upsert(&mut self, record: &ReportRecord) -> Result<UpsertOutcome, StorageError> {
        self.upsert_at(record, Utc::now())
    }

    /// Like [`upsert`](Self::upsert) with an explicit clock. Runs in its own
    /// transaction, committed before returning; on error nothing is written.
    pub fn upsert_at(
        &mut self,
        record: &ReportRecord,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StorageError> {
        let now = encode_timestamp(now);
        let fields = &record.fields;
        let partition = record.partition();
        let published_date = record.published_date.map(|d| d.to_storage_string());
        let report_date_timestamp = fields.report_date_parsed.map(|d| d.to_storage_string());

        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM reports WHERE link = ?1",
                [&record.link],
                |row| row.get(0),
            )
            .optional()?;

        let sql = if existing.is_some() { UPDATE_REPORT } else { INSERT_REPORT };
        tx.execute(
            sql,
            named_params! {
                ":title": record.title,
                ":link": record.link,
                ":published": record.published,
                ":published_date": published_date,
                ":ticker": fields.ticker,
                ":company": fields.company,
                ":percentage": fields.percentage,
                ":percentage_change": fields.change.raw,
                ":percentage_change_value": fields.change.value,
                ":percentage_change_direction": fields.change.direction.code(),
                ":change_flag": fields.change.direction.flag(),
                ":report_date": fields.report_date,
                ":report_date_timestamp": report_date_timestamp,
                ":reason": fields.reason,
                ":reason_type": fields.reason_type.code(),
                ":purpose": fields.purpose,
                ":report_date_close": record.prices.report_date_close,
                ":current_price": record.prices.current_price,
                ":year": partition.map(|p| p.year),
                ":month": partition.map(|p| p.month),
                ":day": partition.map(|p| p.day),
                ":now": now,
            },
        )?;

        tx.commit()?;

        Ok(if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    #[allow(dead_code)]
    pub fn find_by_link(&self, link: &str) -> Result<Option<StoredReport>, StorageError> {
        let sql = format!("SELECT {} FROM reports WHERE link = ?1", StoredReport::COLUMNS);
        let report = self
            .conn
            .query_row(&sql, [link], StoredReport::from_row)
            .optional()?;
        Ok(report)
    }

    pub fn count(&self) -> Result<u64, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
