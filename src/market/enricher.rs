// src/market/enricher.rs
use crate::market::PriceProvider;
use crate::utils::error::MarketError;
use chrono::NaiveDate;

pub const DEFAULT_EXCHANGE_SUFFIX: &str = ".T";

/// Prices attached to a stored report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarketPrices {
    pub report_date_close: Option<f64>,
    pub current_price: Option<f64>,
}

/// Result of the enrichment stage for one report.
#[derive(Debug)]
pub enum PriceLookup {
    Priced(MarketPrices),
    /// Nothing to look up (no ticker or no obligation date).
    Skipped(&'static str),
    Failed(MarketError),
}

impl PriceLookup {
    /// Prices to persist; absent unless the lookup fully succeeded.
    pub fn prices(&self) -> MarketPrices {
        match self {
            PriceLookup::Priced(prices) => *prices,
            PriceLookup::Skipped(_) | PriceLookup::Failed(_) => MarketPrices::default(),
        }
    }
}

/// Qualifies a bare local code with the exchange suffix: `7203` → `7203.T`.
/// Codes that already carry a suffix are left alone.
pub fn normalize_ticker(ticker: &str, exchange_suffix: &str) -> String {
    let ticker = ticker.trim();
    if ticker.contains('.') || exchange_suffix.is_empty() {
        ticker.to_string()
    } else if exchange_suffix.starts_with('.') {
        format!("{}{}", ticker, exchange_suffix)
    } else {
        format!("{}.{}", ticker, exchange_suffix)
    }
}

/// Looks up the close on the obligation date and the latest price.
pub struct PriceEnricher<P> {
    provider: P,
    exchange_suffix: String,
}

impl<P: PriceProvider> PriceEnricher<P> {
    pub fn new(provider: P, exchange_suffix: &str) -> Self {
        Self {
            provider,
            exchange_suffix: exchange_suffix.to_string(),
        }
    }

    /// Any provider error, or an empty history for the obligation date, leaves
    /// both prices absent. Failures are logged here and returned as values.
    pub async fn enrich(&self, ticker: Option<&str>, report_date: Option<NaiveDate>) -> PriceLookup {
        let Some(ticker) = ticker else {
            return PriceLookup::Skipped("no ticker");
        };
        let Some(date) = report_date else {
            return PriceLookup::Skipped("no report date");
        };
        let symbol = normalize_ticker(ticker, &self.exchange_suffix);
        let Some(next_day) = date.succ_opt() else {
            return PriceLookup::Skipped("report date out of range");
        };

        let bars = match self.provider.daily_bars(&symbol, date, next_day).await {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!("Historical price lookup failed for {} on {}: {}", symbol, date, e);
                return PriceLookup::Failed(e);
            }
        };
        let Some(close) = bars.iter().find_map(|bar| bar.close) else {
            tracing::warn!("No price bar for {} on {}", symbol, date);
            return PriceLookup::Failed(MarketError::NoData(symbol));
        };

        let current = match self.provider.latest_price(&symbol).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("Latest quote lookup failed for {}: {}", symbol, e);
                return PriceLookup::Failed(e);
            }
        };

        tracing::debug!("{}: close on {} = {}, current = {}", symbol, date, close, current);
        PriceLookup::Priced(MarketPrices {
            report_date_close: Some(close),
            current_price: Some(current),
        })
    }
}
