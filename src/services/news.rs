//! Headline mention counting and keyword sentiment
//!
//! Best-effort enrichment: any upstream problem degrades to "no data"
//! instead of failing the holdings ranking.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::warn;

use crate::constants::NEWS_MENTION_WINDOW_DAYS;
use crate::services::fetch::Fetch;

const POSITIVE_WORDS: &[&str] = &[
    "beat", "beats", "surge", "surges", "rally", "rallies", "record", "upgrade", "upgraded",
    "growth", "gain", "gains", "strong", "soar", "soars", "jump", "jumps", "outperform", "buy",
];

const NEGATIVE_WORDS: &[&str] = &[
    "miss", "misses", "fall", "falls", "drop", "drops", "plunge", "plunges", "downgrade",
    "downgraded", "weak", "loss", "losses", "lawsuit", "recall", "cut", "cuts", "slump",
    "underperform", "sell",
];

/// (sentiment, mention count) for one ticker over the trailing news
/// window. Both None when the news feed is unreachable or malformed.
pub async fn fetch_news_stats<F: Fetch>(fetcher: &F, ticker: &str) -> (Option<f64>, Option<u32>) {
    let url = format!(
        "https://query1.finance.yahoo.com/v1/finance/search?q={}&quotesCount=0&newsCount=20",
        ticker.to_uppercase()
    );
    let body = match fetcher.fetch_text(&url).await {
        Ok(body) => body,
        Err(e) => {
            warn!(ticker = ticker, error = %e, "News fetch failed");
            return (None, None);
        }
    };
    match serde_json::from_str::<Value>(&body) {
        Ok(payload) => news_stats(&payload, Utc::now()),
        Err(e) => {
            warn!(ticker = ticker, error = %e, "News payload unparseable");
            (None, None)
        }
    }
}

/// Extract mention count and title polarity from a search payload.
///
/// Mentions count articles published within the window; sentiment is
/// `(positive - negative) / (positive + negative)` over keyword hits in
/// those articles' titles, 0 when titles carry no keywords, None when
/// there are no recent articles at all.
pub fn news_stats(payload: &Value, now: DateTime<Utc>) -> (Option<f64>, Option<u32>) {
    let Some(news) = payload.pointer("/news").and_then(Value::as_array) else {
        return (None, None);
    };

    let cutoff = now - Duration::days(NEWS_MENTION_WINDOW_DAYS);
    let mut mentions = 0u32;
    let mut positive = 0usize;
    let mut negative = 0usize;

    for item in news {
        let published = item
            .pointer("/providerPublishTime")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        let Some(published) = published else { continue };
        if published < cutoff || published > now {
            continue;
        }
        mentions += 1;

        if let Some(title) = item.pointer("/title").and_then(Value::as_str) {
            let (pos, neg) = title_polarity(title);
            positive += pos;
            negative += neg;
        }
    }

    let sentiment = if mentions == 0 {
        None
    } else if positive + negative == 0 {
        Some(0.0)
    } else {
        Some((positive as f64 - negative as f64) / (positive + negative) as f64)
    };
    (sentiment, Some(mentions))
}

fn title_polarity(title: &str) -> (usize, usize) {
    let lower = title.to_lowercase();
    let mut positive = 0;
    let mut negative = 0;
    for token in lower.split(|c: char| !c.is_ascii_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if POSITIVE_WORDS.contains(&token) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&token) {
            negative += 1;
        }
    }
    (positive, negative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(items: Vec<Value>) -> Value {
        json!({ "news": items })
    }

    fn item(title: &str, age_days: i64, now: DateTime<Utc>) -> Value {
        json!({
            "title": title,
            "providerPublishTime": (now - Duration::days(age_days)).timestamp()
        })
    }

    #[test]
    fn test_mentions_count_recent_only() {
        let now = Utc::now();
        let p = payload(vec![
            item("Quarterly results", 1, now),
            item("Old coverage", 30, now),
            item("More coverage", 10, now),
        ]);
        let (_, mentions) = news_stats(&p, now);
        assert_eq!(mentions, Some(2));
    }

    #[test]
    fn test_sentiment_polarity() {
        let now = Utc::now();
        let p = payload(vec![
            item("Shares surge after earnings beat", 1, now),
            item("Analyst downgrade weighs on outlook", 2, now),
        ]);
        let (sentiment, mentions) = news_stats(&p, now);
        assert_eq!(mentions, Some(2));
        // 2 positive hits, 1 negative
        assert!((sentiment.unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_titles_score_zero() {
        let now = Utc::now();
        let p = payload(vec![item("Company schedules investor day", 1, now)]);
        let (sentiment, mentions) = news_stats(&p, now);
        assert_eq!(sentiment, Some(0.0));
        assert_eq!(mentions, Some(1));
    }

    #[test]
    fn test_no_recent_articles_no_sentiment() {
        let now = Utc::now();
        let p = payload(vec![item("Shares surge", 60, now)]);
        let (sentiment, mentions) = news_stats(&p, now);
        assert_eq!(sentiment, None);
        assert_eq!(mentions, Some(0));
    }

    #[test]
    fn test_missing_news_array() {
        let (sentiment, mentions) = news_stats(&json!({}), Utc::now());
        assert_eq!(sentiment, None);
        assert_eq!(mentions, None);
    }

    #[test]
    fn test_keyword_is_whole_word() {
        // "cutting-edge" must not count "cut"
        let now = Utc::now();
        let p = payload(vec![item("Cutting-edge fabs come online", 1, now)]);
        let (sentiment, _) = news_stats(&p, now);
        assert_eq!(sentiment, Some(0.0));
    }
}
