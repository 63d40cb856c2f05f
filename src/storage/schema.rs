// src/storage/schema.rs

/// Schema for the report store. Every statement is idempotent, so this runs
/// on each open.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reports (
    id                          INTEGER PRIMARY KEY AUTOINCREMENT,
    title                       TEXT,
    link                        TEXT UNIQUE,
    published                   TEXT,
    published_date              TIMESTAMP,
    ticker                      TEXT,
    company                     TEXT,
    percentage                  REAL,
    percentage_change           TEXT,      -- raw change token: 1.02pt↑, Δ28.74pt
    percentage_change_value     REAL,      -- magnitude, e.g. 1.02
    percentage_change_direction INTEGER,   -- 1 up, -1 down, 0 none/unknown
    change_flag                 TEXT,      -- '増' | '減' | NULL
    report_date                 TEXT,
    report_date_timestamp       TIMESTAMP, -- parsed obligation date
    reason                      TEXT,
    reason_type                 INTEGER,   -- 0 unclassified, 1..=6 see ReasonType
    purpose                     TEXT,
    report_date_close           REAL,      -- close on the obligation date
    current_price               REAL,
    created_at                  TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at                  TIMESTAMP DEFAULT CURRENT_TIMESTAMP,

    -- partition keys: published date, else obligation date
    year                        INTEGER,
    month                       INTEGER,
    day                         INTEGER
);

CREATE INDEX IF NOT EXISTS idx_ticker            ON reports(ticker);
CREATE INDEX IF NOT EXISTS idx_percentage_change ON reports(percentage_change_direction);
CREATE INDEX IF NOT EXISTS idx_report_date       ON reports(report_date_timestamp);
CREATE INDEX IF NOT EXISTS idx_year_month        ON reports(year, month);
CREATE INDEX IF NOT EXISTS idx_reason_type       ON reports(reason_type);

PRAGMA user_version = 1;
";
