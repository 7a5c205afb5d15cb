//! Sourcing and caching of weekly price series
//!
//! Yahoo Finance is the primary source, Stooq the fallback. Series are
//! cached already normalized under the owning source's key namespace, so
//! a cache hit never re-parses an upstream payload.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::constants::{HISTORY_YEARS, PRICE_CACHE_TTL_MS};
use crate::error::{AppError, Result};
use crate::models::{normalize_points, DataSource, PricePoint, PriceSeries};
use crate::services::cache::PriceCache;
use crate::services::fetch::Fetch;

pub struct PriceStore<F: Fetch> {
    fetcher: Arc<F>,
    cache: PriceCache,
}

impl<F: Fetch> PriceStore<F> {
    pub fn new(fetcher: Arc<F>, cache: PriceCache) -> Self {
        Self { fetcher, cache }
    }

    /// Weekly closes for `ticker`: cache, then Yahoo, then Stooq.
    ///
    /// Only when every source fails does this return an error; a stale
    /// cache entry is never served.
    pub async fn get_prices(&self, ticker: &str) -> Result<PriceSeries> {
        for source in [DataSource::Yahoo, DataSource::Stooq] {
            if let Some(series) = self.cached(source, ticker).await {
                return Ok(series);
            }
        }

        let yahoo_err = match self.fetch_yahoo(ticker).await {
            Ok(series) => {
                self.store(&series).await;
                return Ok(series);
            }
            Err(e) => {
                warn!(ticker = ticker, error = %e, "Yahoo fetch failed, falling back to Stooq");
                e
            }
        };

        match self.fetch_stooq(ticker).await {
            Ok(series) => {
                self.store(&series).await;
                Ok(series)
            }
            Err(stooq_err) => Err(AppError::UpstreamUnavailable(format!(
                "{}: yahoo: {}; stooq: {}",
                ticker, yahoo_err, stooq_err
            ))),
        }
    }

    async fn cached(&self, source: DataSource, ticker: &str) -> Option<PriceSeries> {
        let value = self
            .cache
            .get(&source.cache_key(ticker), PRICE_CACHE_TTL_MS)
            .await?;
        match serde_json::from_value::<PriceSeries>(value) {
            Ok(series) if !series.is_empty() => Some(series),
            Ok(_) => None,
            Err(e) => {
                warn!(ticker = ticker, error = %e, "Ignoring malformed cached series");
                None
            }
        }
    }

    async fn store(&self, series: &PriceSeries) {
        match serde_json::to_value(series) {
            Ok(value) => {
                self.cache
                    .set(&series.source.cache_key(&series.ticker), value)
                    .await
            }
            Err(e) => warn!(ticker = %series.ticker, error = %e, "Series not cacheable"),
        }
    }

    async fn fetch_yahoo(&self, ticker: &str) -> Result<PriceSeries> {
        let url = yahoo_url(ticker);
        let body = self.fetcher.fetch_text(&url).await?;
        let points = parse_yahoo(&body, ticker)?;
        let points = normalize_points(points);
        if points.is_empty() {
            return Err(AppError::InvalidPayload(format!(
                "{}: yahoo payload had no usable closes",
                ticker
            )));
        }
        info!(ticker = ticker, points = points.len(), source = "yahoo", "Fetched price series");
        Ok(PriceSeries::new(
            ticker.to_uppercase(),
            DataSource::Yahoo,
            points,
        ))
    }

    async fn fetch_stooq(&self, ticker: &str) -> Result<PriceSeries> {
        let url = stooq_url(ticker);
        let body = self.fetcher.fetch_text(&url).await?;
        let points = parse_stooq(&body, ticker)?;
        let points = normalize_points(points);
        if points.is_empty() {
            return Err(AppError::InvalidPayload(format!(
                "{}: stooq payload had no usable closes",
                ticker
            )));
        }
        info!(ticker = ticker, points = points.len(), source = "stooq", "Fetched price series");
        Ok(PriceSeries::new(
            ticker.to_uppercase(),
            DataSource::Stooq,
            points,
        ))
    }
}

fn yahoo_url(ticker: &str) -> String {
    format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{}?range={}y&interval=1wk",
        ticker.to_uppercase(),
        HISTORY_YEARS as u32
    )
}

fn stooq_url(ticker: &str) -> String {
    format!(
        "https://stooq.com/q/d/l/?s={}.us&i=w",
        ticker.to_lowercase()
    )
}

/// Extract (timestamp, close) pairs from a Yahoo chart payload.
/// Adjusted closes are preferred; raw quote closes are the fallback for
/// symbols without an adjclose track. Null slots (untraded weeks) are
/// skipped, not zero-filled.
fn parse_yahoo(body: &str, ticker: &str) -> Result<Vec<PricePoint>> {
    let payload: Value = serde_json::from_str(body)?;
    let result = payload
        .pointer("/chart/result/0")
        .ok_or_else(|| AppError::InvalidPayload(format!("{}: missing chart result", ticker)))?;

    let timestamps = result
        .pointer("/timestamp")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::InvalidPayload(format!("{}: missing timestamps", ticker)))?;

    let closes = result
        .pointer("/indicators/adjclose/0/adjclose")
        .and_then(Value::as_array)
        .or_else(|| {
            result
                .pointer("/indicators/quote/0/close")
                .and_then(Value::as_array)
        })
        .ok_or_else(|| AppError::InvalidPayload(format!("{}: missing close track", ticker)))?;

    let mut points = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.iter().zip(closes) {
        if let (Some(secs), Some(close)) = (ts.as_i64(), close.as_f64()) {
            if let Some(date) = Utc.timestamp_opt(secs, 0).single() {
                points.push(PricePoint::new(date, close));
            }
        }
    }
    Ok(points)
}

/// Parse a Stooq daily-download CSV (Date,Open,High,Low,Close,Volume).
/// Rows with unparseable dates or closes are skipped.
fn parse_stooq(body: &str, ticker: &str) -> Result<Vec<PricePoint>> {
    if !body.trim_start().starts_with("Date,") {
        return Err(AppError::InvalidPayload(format!(
            "{}: stooq body missing Date header",
            ticker
        )));
    }

    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        let (Some(date_str), Some(close_str)) = (record.get(0), record.get(4)) else {
            continue;
        };
        let (Ok(date), Ok(close)) = (
            NaiveDate::parse_from_str(date_str, "%Y-%m-%d"),
            close_str.parse::<f64>(),
        ) else {
            continue;
        };
        points.push(PricePoint::new(
            date.and_time(NaiveTime::MIN).and_utc(),
            close,
        ));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned-response fetcher keyed by URL substring
    struct StubFetch {
        responses: Mutex<HashMap<&'static str, String>>,
        calls: AtomicUsize,
    }

    impl StubFetch {
        fn new(responses: &[(&'static str, String)]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().cloned().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for StubFetch {
        fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let hit = self
                .responses
                .lock()
                .unwrap()
                .iter()
                .find(|(fragment, _)| url.contains(*fragment))
                .map(|(_, body)| body.clone());
            async move {
                hit.ok_or_else(|| AppError::UpstreamUnavailable(format!("no stub for {}", url)))
            }
        }

        fn fetch_binary(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
            let url = url.to_string();
            async move { Err(AppError::UpstreamUnavailable(format!("no stub for {}", url))) }
        }
    }

    fn yahoo_body(timestamps: &[i64], closes: &[f64]) -> String {
        serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": timestamps,
                    "indicators": {
                        "adjclose": [{"adjclose": closes}],
                        "quote": [{"close": closes}]
                    }
                }],
                "error": null
            }
        })
        .to_string()
    }

    fn temp_cache(tag: &str) -> PriceCache {
        let path = std::env::temp_dir().join(format!(
            "sectorcycle_store_test_{}_{}.json",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        PriceCache::open(path)
    }

    const WEEK_SECS: i64 = 7 * 24 * 3600;

    #[tokio::test]
    async fn test_yahoo_fetch_and_parse() {
        let ts: Vec<i64> = (0..3).map(|i| 1_700_000_000 + i * WEEK_SECS).collect();
        let stub = Arc::new(StubFetch::new(&[(
            "yahoo.com",
            yahoo_body(&ts, &[100.0, 101.0, 102.0]),
        )]));
        let store = PriceStore::new(stub, temp_cache("yahoo"));

        let series = store.get_prices("spy").await.unwrap();
        assert_eq!(series.ticker, "SPY");
        assert_eq!(series.source, DataSource::Yahoo);
        assert_eq!(series.len(), 3);
        assert_eq!(series.points[2].close, 102.0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let ts: Vec<i64> = (0..3).map(|i| 1_700_000_000 + i * WEEK_SECS).collect();
        let stub = Arc::new(StubFetch::new(&[(
            "yahoo.com",
            yahoo_body(&ts, &[100.0, 101.0, 102.0]),
        )]));
        let store = PriceStore::new(stub.clone(), temp_cache("cachehit"));

        store.get_prices("XLK").await.unwrap();
        assert_eq!(stub.call_count(), 1);
        let again = store.get_prices("XLK").await.unwrap();
        assert_eq!(stub.call_count(), 1);
        assert_eq!(again.len(), 3);
    }

    #[tokio::test]
    async fn test_stooq_fallback_when_yahoo_fails() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-05,99,101,98,100.5,1000\n\
                   2024-01-12,100,103,99,102.25,1100\n";
        let stub = Arc::new(StubFetch::new(&[("stooq.com", csv.to_string())]));
        let store = PriceStore::new(stub, temp_cache("fallback"));

        let series = store.get_prices("XLE").await.unwrap();
        assert_eq!(series.source, DataSource::Stooq);
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[1].close, 102.25);
    }

    #[tokio::test]
    async fn test_both_sources_failing_is_fatal() {
        let stub = Arc::new(StubFetch::new(&[]));
        let store = PriceStore::new(stub, temp_cache("allfail"));
        let err = store.get_prices("XLF").await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_parse_yahoo_skips_null_closes() {
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": [1_700_000_000i64, 1_700_604_800i64, 1_701_209_600i64],
                    "indicators": {
                        "adjclose": [{"adjclose": [100.0, null, 102.0]}]
                    }
                }]
            }
        })
        .to_string();
        let points = parse_yahoo(&body, "SPY").unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].close, 102.0);
    }

    #[test]
    fn test_parse_yahoo_quote_close_fallback() {
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": [1_700_000_000i64],
                    "indicators": {
                        "quote": [{"close": [55.5]}]
                    }
                }]
            }
        })
        .to_string();
        let points = parse_yahoo(&body, "KRE").unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close, 55.5);
    }

    #[test]
    fn test_parse_yahoo_missing_result_errors() {
        assert!(parse_yahoo("{\"chart\":{\"result\":[]}}", "SPY").is_err());
        assert!(parse_yahoo("{}", "SPY").is_err());
    }

    #[test]
    fn test_parse_stooq_rejects_html() {
        assert!(parse_stooq("<html>blocked</html>", "SPY").is_err());
    }

    #[test]
    fn test_parse_stooq_skips_bad_rows() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-05,99,101,98,100.5,1000\n\
                   not-a-date,1,2,3,4,5\n\
                   2024-01-12,100,103,99,n/a,1100\n";
        let points = parse_stooq(csv, "SPY").unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close, 100.5);
    }

    #[test]
    fn test_urls() {
        assert!(yahoo_url("spy").contains("/chart/SPY?"));
        assert!(yahoo_url("spy").contains("range=25y"));
        assert!(yahoo_url("spy").contains("interval=1wk"));
        assert_eq!(stooq_url("SPY"), "https://stooq.com/q/d/l/?s=spy.us&i=w");
    }
}
