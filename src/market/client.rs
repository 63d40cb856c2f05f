// src/market/client.rs
use crate::market::models::{ChartResponse, ChartResult, PriceBar};
use crate::market::PriceProvider;
use crate::utils::error::MarketError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
// Yahoo rejects requests without a browser-like User-Agent
const YAHOO_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";
const YAHOO_TIMEOUT_SECS: u64 = 20;
// Tokyo Stock Exchange trading days start at 00:00 JST (UTC+9)
const MARKET_UTC_OFFSET_SECS: i64 = 9 * 3600;

/// Market-data provider backed by the Yahoo Finance chart endpoint.
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Result<Self, MarketError> {
        Self::with_base_url(YAHOO_BASE_URL)
    }

    /// Points the client at another host (mirrors, test servers).
    pub fn with_base_url(base_url: &str) -> Result<Self, MarketError> {
        let client = reqwest::Client::builder()
            .user_agent(YAHOO_USER_AGENT)
            .timeout(Duration::from_secs(YAHOO_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResult, MarketError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        tracing::debug!("Requesting chart data: {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("HTTP error status: {} for symbol: {}", status, symbol);
            return Err(MarketError::Http {
                symbol: symbol.to_string(),
                status,
            });
        }

        let body: ChartResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                MarketError::Provider {
                    symbol: symbol.to_string(),
                    message: format!("unreadable chart payload: {}", e),
                }
            } else {
                MarketError::Network(e)
            }
        })?;
        if let Some(err) = body.chart.error {
            return Err(MarketError::Provider {
                symbol: symbol.to_string(),
                message: format!("{}: {}", err.code, err.description),
            });
        }

        body.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| MarketError::NoData(symbol.to_string()))
    }
}

fn market_midnight(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp() - MARKET_UTC_OFFSET_SECS)
}

#[async_trait]
impl PriceProvider for YahooClient {
    async fn daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>, MarketError> {
        let (Some(period1), Some(period2)) = (market_midnight(from), market_midnight(to)) else {
            return Err(MarketError::NoData(symbol.to_string()));
        };
        let query = [
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ];
        let result = self.chart(symbol, &query).await?;
        Ok(result.bars())
    }

    async fn latest_price(&self, symbol: &str) -> Result<f64, MarketError> {
        let query = [("range", "1d".to_string()), ("interval", "1d".to_string())];
        let result = self.chart(symbol, &query).await?;

        // Prefer the live quote; fall back to the last close in the window
        result
            .meta
            .regular_market_price
            .or_else(|| result.bars().iter().rev().find_map(|bar| bar.close))
            .ok_or_else(|| MarketError::NoData(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chart_body(price: Option<f64>, timestamps: &[i64], closes: &[Option<f64>]) -> serde_json::Value {
        json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "7203.T", "currency": "JPY", "regularMarketPrice": price},
                    "timestamp": timestamps,
                    "indicators": {"quote": [{"close": closes}]}
                }],
                "error": null
            }
        })
    }

    #[test]
    fn test_market_midnight_is_jst() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 12).unwrap();
        // 2025-02-12T00:00:00+09:00 == 2025-02-11T15:00:00Z
        assert_eq!(market_midnight(date), Some(1_739_286_000));
    }

    #[tokio::test]
    async fn test_daily_bars_queries_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/7203.T"))
            .and(query_param("period1", "1739286000"))
            .and(query_param("period2", "1739372400"))
            .and(query_param("interval", "1d"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chart_body(Some(2900.0), &[1739318400], &[Some(2801.5)])),
            )
            .mount(&server)
            .await;

        let client = YahooClient::with_base_url(&server.uri()).unwrap();
        let from = NaiveDate::from_ymd_opt(2025, 2, 12).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 2, 13).unwrap();
        let bars = client.daily_bars("7203.T", from, to).await.unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, Some(2801.5));
    }

    #[tokio::test]
    async fn test_latest_price_prefers_market_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/7203.T"))
            .and(query_param("range", "1d"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chart_body(Some(2900.0), &[1739318400], &[Some(2801.5)])),
            )
            .mount(&server)
            .await;

        let client = YahooClient::with_base_url(&server.uri()).unwrap();
        assert_eq!(client.latest_price("7203.T").await.unwrap(), 2900.0);
    }

    #[tokio::test]
    async fn test_latest_price_falls_back_to_last_close() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(
                None,
                &[1739318400, 1739404800],
                &[Some(2801.5), Some(2810.0)],
            )))
            .mount(&server)
            .await;

        let client = YahooClient::with_base_url(&server.uri()).unwrap();
        assert_eq!(client.latest_price("7203.T").await.unwrap(), 2810.0);
    }

    #[tokio::test]
    async fn test_provider_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}
            })))
            .mount(&server)
            .await;

        let client = YahooClient::with_base_url(&server.uri()).unwrap();
        let err = client.latest_price("0000.T").await.unwrap_err();
        assert!(matches!(err, MarketError::Provider { ref symbol, .. } if symbol == "0000.T"));
    }

    #[tokio::test]
    async fn test_bad_payload_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
            .mount(&server)
            .await;

        let client = YahooClient::with_base_url(&server.uri()).unwrap();
        let err = client.latest_price("7203.T").await.unwrap_err();
        assert!(
            matches!(err, MarketError::Provider { ref message, .. } if message.contains("payload")),
            "got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = YahooClient::with_base_url(&server.uri()).unwrap();
        let err = client.latest_price("7203.T").await.unwrap_err();
        assert!(matches!(err, MarketError::Http { status, .. } if status.as_u16() == 429));
    }
}
