// src/market/mod.rs
pub mod client;
pub mod enricher;
pub mod models;

use crate::utils::error::MarketError;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use client::YahooClient;
pub use enricher::{MarketPrices, PriceEnricher, PriceLookup};
pub use models::PriceBar;

/// Source of historical bars and latest quotes, keyed by exchange-qualified symbol.
#[async_trait]
pub trait PriceProvider {
    /// Daily bars in `[from, to)`.
    async fn daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>, MarketError>;

    async fn latest_price(&self, symbol: &str) -> Result<f64, MarketError>;
}
