// src/utils/error.rs
use thiserror::Error;

// Errors for each stage of the pipeline
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error {status} for {url}")]
    Http { url: String, status: reqwest::StatusCode },

    #[error("Feed body is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Malformed feed: {0}")]
    Malformed(#[from] roxmltree::Error),

    #[error("Unrecognized feed format (root element <{0}>)")]
    UnknownFormat(String),
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status} for {symbol}")]
    Http { symbol: String, status: reqwest::StatusCode },

    #[error("Provider error for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("No price data for {0}")]
    NoData(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Feed retrieval failed: {0}")]
    Feed(#[from] FeedError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
}
