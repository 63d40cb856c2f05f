// src/ingest.rs
use crate::extractors::{parse_date, FieldExtractor};
use crate::feed::{parse_feed, FeedEntry, FeedSource};
use crate::market::{PriceEnricher, PriceLookup, PriceProvider};
use crate::storage::{ReportRecord, ReportStore, UpsertOutcome};
use crate::utils::error::{IngestError, StorageError};
use std::fmt;
use std::path::PathBuf;

/// Counts for one processed feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub url: String,
    pub entries: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    pub priced: usize,
}

impl fmt::Display for FeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} inserted, {} updated",
            self.url, self.inserted, self.updated
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// Result of one feed in a multi-feed run.
#[derive(Debug)]
pub struct FeedRun {
    pub url: String,
    pub result: Result<FeedSummary, IngestError>,
}

/// Result of one entry: the price stage and the storage stage are reported
/// separately so a missing price never hides a write failure.
#[derive(Debug)]
pub enum EntryOutcome {
    Stored {
        upsert: UpsertOutcome,
        prices: PriceLookup,
    },
    Failed {
        prices: PriceLookup,
        error: StorageError,
    },
}

/// Drives fetch → parse → extract → enrich → upsert for each feed.
pub struct Ingester<F, P> {
    source: F,
    extractor: FieldExtractor,
    enricher: Option<PriceEnricher<P>>,
    db_path: PathBuf,
}

impl<F: FeedSource, P: PriceProvider> Ingester<F, P> {
    /// `enricher: None` stores reports without prices.
    pub fn new(source: F, enricher: Option<PriceEnricher<P>>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            extractor: FieldExtractor::new(),
            enricher,
            db_path: db_path.into(),
        }
    }

    /// Processes every feed in order. A failing feed is logged and does not
    /// stop the ones after it.
    pub async fn run(&self, urls: &[String]) -> Vec<FeedRun> {
        let mut runs = Vec::with_capacity(urls.len());
        for url in urls {
            let result = self.process_feed(url).await;
            if let Err(e) = &result {
                tracing::error!("Feed {} failed: {}", url, e);
            }
            runs.push(FeedRun {
                url: url.clone(),
                result,
            });
        }
        runs
    }

    /// Processes a single feed against a connection opened for this call.
    ///
    /// Fetch and parse failures abort the feed before any row is written.
    /// A failed write only loses that entry; its transaction is rolled back
    /// and the loop moves on.
    pub async fn process_feed(&self, url: &str) -> Result<FeedSummary, IngestError> {
        let mut store = ReportStore::open(&self.db_path)?;
        tracing::info!("Processing feed {} into {}", url, self.db_path.display());

        let bytes = self.source.fetch(url).await?;
        let feed = parse_feed(&bytes)?;
        tracing::info!(
            "Feed '{}' has {} entries",
            feed.title.as_deref().unwrap_or(url),
            feed.entries.len()
        );

        let mut summary = FeedSummary {
            url: url.to_string(),
            entries: feed.entries.len(),
            ..Default::default()
        };

        for entry in &feed.entries {
            match self.process_entry(&mut store, entry).await {
                EntryOutcome::Stored { upsert, prices } => {
                    match upsert {
                        UpsertOutcome::Inserted => summary.inserted += 1,
                        UpsertOutcome::Updated => summary.updated += 1,
                    }
                    match &prices {
                        PriceLookup::Priced(_) => summary.priced += 1,
                        PriceLookup::Skipped(reason) => {
                            tracing::debug!("No price lookup for {}: {}", entry.link, reason)
                        }
                        PriceLookup::Failed(e) => {
                            tracing::debug!("Prices left empty for {}: {}", entry.link, e)
                        }
                    }
                    tracing::info!("{:?}: {} ({})", upsert, entry.title, entry.link);
                }
                EntryOutcome::Failed { error, prices } => {
                    summary.failed += 1;
                    tracing::error!(
                        "Failed to store {}: {} (price lookup: {:?})",
                        entry.link,
                        error,
                        prices
                    );
                }
            }
        }

        tracing::info!(
            "Finished {}: {} entries, {} inserted, {} updated, {} failed, {} priced",
            url,
            summary.entries,
            summary.inserted,
            summary.updated,
            summary.failed,
            summary.priced
        );
        Ok(summary)
    }

    async fn process_entry(&self, store: &mut ReportStore, entry: &FeedEntry) -> EntryOutcome {
        let published_date = entry.published.as_deref().and_then(parse_date);
        let fields = self
            .extractor
            .extract(entry.description.as_deref().unwrap_or_default());

        let prices = match &self.enricher {
            Some(enricher) => {
                enricher
                    .enrich(
                        fields.ticker.as_deref(),
                        fields.report_date_parsed.map(|d| d.date()),
                    )
                    .await
            }
            None => PriceLookup::Skipped("price lookups disabled"),
        };

        let record = ReportRecord::new(entry, published_date, fields, prices.prices());
        tracing::debug!(
            "Extracted {}: ticker={:?} company={:?} percentage={:?} change={:?} report_date={:?} reason_type={} purpose={:?} prices={:?}",
            record.link,
            record.fields.ticker,
            record.fields.company,
            record.fields.percentage,
            record.fields.change,
            record.fields.report_date,
            record.fields.reason_type.code(),
            record.fields.purpose,
            record.prices
        );

        match store.upsert(&record) {
            Ok(upsert) => EntryOutcome::Stored { upsert, prices },
            Err(error) => EntryOutcome::Failed { prices, error },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::enricher::tests::StubProvider;
    use crate::market::enricher::DEFAULT_EXCHANGE_SUFFIX;
    use crate::utils::error::FeedError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned feed bodies; unknown URLs answer 404.
    #[derive(Default)]
    struct StubSource {
        bodies: Mutex<HashMap<String, String>>,
    }

    impl StubSource {
        fn serve(&self, url: &str, body: &str) {
            self.bodies
                .lock()
                .unwrap()
                .insert(url.to_string(), body.to_string());
        }
    }

    #[async_trait]
    impl FeedSource for StubSource {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FeedError> {
            self.bodies
                .lock()
                .unwrap()
                .get(url)
                .map(|body| body.clone().into_bytes())
                .ok_or_else(|| FeedError::Http {
                    url: url.to_string(),
                    status: reqwest::StatusCode::NOT_FOUND,
                })
        }
    }

    const FEED_URL: &str = "https://feeds.example.com/E35239";

    fn rss(items: &[(&str, Option<&str>, &str)]) -> String {
        let mut body = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>test</title>"#);
        for (link, published, description) in items {
            body.push_str("<item><title>【大量保有報告書】光通信株式会社</title>");
            body.push_str(&format!("<link>{}</link>", link));
            if let Some(published) = published {
                body.push_str(&format!("<pubDate>{}</pubDate>", published));
            }
            body.push_str(&format!("<description><![CDATA[{}]]></description></item>", description));
        }
        body.push_str("</channel></rss>");
        body
    }

    fn ingester(
        dir: &tempfile::TempDir,
        provider: Option<StubProvider>,
    ) -> Ingester<StubSource, StubProvider> {
        let enricher = provider.map(|p| PriceEnricher::new(p, DEFAULT_EXCHANGE_SUFFIX));
        Ingester::new(StubSource::default(), enricher, dir.path().join("reports.db"))
    }

    const PUBLISHED: Option<&str> = Some("Wed, 19 Feb 2025 16:57:00 +0900");
    const DESCRIPTION: &str = "【銘柄】[7203]トヨタ自動車<br>【割合】5.12%（1.02pt↑）<br>【報告義務発生日】2025年2月12日<br>【提出事由】新規<br>【保有目的】純投資";

    #[tokio::test]
    async fn test_empty_feed_reports_zero() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = ingester(&dir, None);
        ingester.source.serve(FEED_URL, &rss(&[]));

        let summary = ingester.process_feed(FEED_URL).await.unwrap();
        assert_eq!((summary.inserted, summary.updated), (0, 0));
        assert_eq!(summary.to_string(), format!("{}: 0 inserted, 0 updated", FEED_URL));

        let store = ReportStore::open(&ingester.db_path).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reingest_updates_existing_link() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = ingester(&dir, None);
        let link = "https://example.com/report/1";

        ingester.source.serve(FEED_URL, &rss(&[(link, PUBLISHED, DESCRIPTION)]));
        let first = ingester.process_feed(FEED_URL).await.unwrap();
        assert_eq!((first.inserted, first.updated), (1, 0));
        let before = ReportStore::open(&ingester.db_path)
            .unwrap()
            .find_by_link(link)
            .unwrap()
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let changed = DESCRIPTION.replace("新規", "訂正");
        ingester.source.serve(FEED_URL, &rss(&[(link, PUBLISHED, changed.as_str())]));
        let second = ingester.process_feed(FEED_URL).await.unwrap();
        assert_eq!((second.inserted, second.updated), (0, 1));

        let store = ReportStore::open(&ingester.db_path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        let after = store.find_by_link(link).unwrap().unwrap();
        assert_eq!(after.reason.as_deref(), Some("訂正"));
        assert_eq!(after.reason_type, 5);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_missing_published_uses_obligation_date() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = ingester(&dir, None);
        let link = "https://example.com/report/2";
        ingester.source.serve(FEED_URL, &rss(&[(link, None, DESCRIPTION)]));

        ingester.process_feed(FEED_URL).await.unwrap();

        let row = ReportStore::open(&ingester.db_path)
            .unwrap()
            .find_by_link(link)
            .unwrap()
            .unwrap();
        assert_eq!(row.published, None);
        assert_eq!((row.year, row.month, row.day), (Some(2025), Some(2), Some(12)));
    }

    #[tokio::test]
    async fn test_prices_flow_into_rows() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StubProvider {
            close: Some(2801.5),
            latest: Some(2900.0),
            ..Default::default()
        };
        let ingester = ingester(&dir, Some(provider));
        let link = "https://example.com/report/3";
        ingester.source.serve(FEED_URL, &rss(&[(link, PUBLISHED, DESCRIPTION)]));

        let summary = ingester.process_feed(FEED_URL).await.unwrap();
        assert_eq!(summary.priced, 1);

        let row = ReportStore::open(&ingester.db_path)
            .unwrap()
            .find_by_link(link)
            .unwrap()
            .unwrap();
        assert_eq!(row.report_date_close, Some(2801.5));
        assert_eq!(row.current_price, Some(2900.0));
    }

    #[tokio::test]
    async fn test_price_failure_still_persists_record() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StubProvider {
            fail_history: true,
            ..Default::default()
        };
        let ingester = ingester(&dir, Some(provider));
        let link = "https://example.com/report/4";
        ingester.source.serve(FEED_URL, &rss(&[(link, PUBLISHED, DESCRIPTION)]));

        let summary = ingester.process_feed(FEED_URL).await.unwrap();
        assert_eq!((summary.inserted, summary.priced), (1, 0));

        let row = ReportStore::open(&ingester.db_path)
            .unwrap()
            .find_by_link(link)
            .unwrap()
            .unwrap();
        assert_eq!(row.ticker.as_deref(), Some("7203"));
        assert_eq!(row.report_date_close, None);
        assert_eq!(row.current_price, None);
    }

    #[tokio::test]
    async fn test_failed_entry_does_not_stop_feed() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = ingester(&dir, None);

        // Reject one link at the database level
        {
            let store = ReportStore::open(&ingester.db_path).unwrap();
            drop(store);
            let conn = rusqlite::Connection::open(&ingester.db_path).unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON reports
                 WHEN NEW.link = 'https://example.com/bad'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        }

        ingester.source.serve(
            FEED_URL,
            &rss(&[
                ("https://example.com/bad", PUBLISHED, DESCRIPTION),
                ("https://example.com/good", PUBLISHED, DESCRIPTION),
            ]),
        );

        let summary = ingester.process_feed(FEED_URL).await.unwrap();
        assert_eq!((summary.inserted, summary.updated, summary.failed), (1, 0, 1));
        assert_eq!(
            summary.to_string(),
            format!("{}: 1 inserted, 0 updated, 1 failed", FEED_URL)
        );

        let store = ReportStore::open(&ingester.db_path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.find_by_link("https://example.com/good").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_bad_feeds_do_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = ingester(&dir, None);
        let malformed = "https://feeds.example.com/malformed";
        let missing = "https://feeds.example.com/missing";
        ingester.source.serve(malformed, "<rss><channel><item></channel>");
        ingester.source.serve(
            FEED_URL,
            &rss(&[("https://example.com/report/5", PUBLISHED, DESCRIPTION)]),
        );

        let urls = vec![malformed.to_string(), missing.to_string(), FEED_URL.to_string()];
        let runs = ingester.run(&urls).await;

        assert_eq!(runs.len(), 3);
        assert!(matches!(
            runs[0].result,
            Err(IngestError::Feed(FeedError::Malformed(_)))
        ));
        assert!(matches!(runs[1].result, Err(IngestError::Feed(FeedError::Http { .. }))));
        let summary = runs[2].result.as_ref().unwrap();
        assert_eq!(summary.inserted, 1);

        let store = ReportStore::open(&ingester.db_path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
