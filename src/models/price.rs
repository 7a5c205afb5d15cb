use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream provider a price series was fetched from.
///
/// Each source owns a distinct cache-key namespace so entries from
/// different providers never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Yahoo,
    Stooq,
}

impl DataSource {
    /// Cache key prefix owned by this source
    pub fn cache_prefix(&self) -> &'static str {
        match self {
            DataSource::Yahoo => "y:",
            DataSource::Stooq => "s:",
        }
    }

    /// Cache key for one ticker under this source's namespace
    pub fn cache_key(&self, ticker: &str) -> String {
        format!("{}{}", self.cache_prefix(), ticker.to_uppercase())
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Yahoo => write!(f, "yahoo"),
            DataSource::Stooq => write!(f, "stooq"),
        }
    }
}

/// One week-ending close for a ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    /// Week-ending date of the observation
    pub date: DateTime<Utc>,

    /// Closing price, always > 0 after ingestion filtering
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: DateTime<Utc>, close: f64) -> Self {
        Self { date, close }
    }
}

/// Weekly close series for one ticker.
///
/// Invariants: dates strictly ascending, all closes > 0. A series is
/// replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub source: DataSource,
    pub fetched_at: DateTime<Utc>,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(ticker: String, source: DataSource, points: Vec<PricePoint>) -> Self {
        Self {
            ticker,
            source,
            fetched_at: Utc::now(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Drop non-positive closes, sort ascending and deduplicate dates
/// (keeping the last observation for a date). Ingestion normalization
/// applied to every upstream payload before it becomes a PriceSeries.
pub fn normalize_points(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.retain(|p| p.close > 0.0 && p.close.is_finite());
    points.sort_by_key(|p| p.date);

    let mut out: Vec<PricePoint> = Vec::with_capacity(points.len());
    for p in points {
        match out.last_mut() {
            Some(last) if last.date == p.date => *last = p,
            _ => out.push(p),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_filters_and_sorts() {
        let points = vec![
            PricePoint::new(day(8), 102.0),
            PricePoint::new(day(1), 100.0),
            PricePoint::new(day(15), -5.0),
            PricePoint::new(day(22), f64::NAN),
        ];
        let out = normalize_points(points);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, day(1));
        assert_eq!(out[1].date, day(8));
    }

    #[test]
    fn test_normalize_dedupes_keeping_last() {
        let points = vec![
            PricePoint::new(day(1), 100.0),
            PricePoint::new(day(1), 101.0),
        ];
        let out = normalize_points(points);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].close, 101.0);
    }

    #[test]
    fn test_cache_key_namespaces() {
        assert_eq!(DataSource::Yahoo.cache_key("xlk"), "y:XLK");
        assert_eq!(DataSource::Stooq.cache_key("XLK"), "s:XLK");
    }
}
