// src/market/models.rs
#![allow(dead_code)]
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Envelope of the Yahoo Finance v8 chart endpoint.
/// Example: https://query1.finance.yahoo.com/v8/finance/chart/7203.T?range=1d&interval=1d
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub currency: Option<String>,
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
}

// Yahoo leaves gaps as nulls inside these arrays
#[derive(Debug, Default, Deserialize)]
pub struct QuoteSeries {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

/// One daily bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub time: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

impl ChartResult {
    /// Zips the parallel timestamp/indicator arrays into bars.
    pub fn bars(&self) -> Vec<PriceBar> {
        let empty = QuoteSeries::default();
        let series = self.indicators.quote.first().unwrap_or(&empty);
        let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let time = DateTime::from_timestamp(*ts, 0)?;
                Some(PriceBar {
                    time,
                    open: at(&series.open, i),
                    high: at(&series.high, i),
                    low: at(&series.low, i),
                    close: at(&series.close, i),
                    volume: series.volume.get(i).copied().flatten(),
                })
            })
            .collect()
    }
}
