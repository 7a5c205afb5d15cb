//! Proxy-racing HTTP fetch layer
//!
//! Upstream data sources sit behind redundant public CORS proxies. Every
//! fetch races one attempt per healthy route and takes the first payload
//! that passes shape validation; losing attempts are dropped, which
//! cancels their requests. Routes accrue consecutive-failure counts and
//! are benched for a cooldown once they cross the threshold. When every
//! route is benched the breaker fails open and resets all of them, so a
//! full outage never becomes a permanent lockout.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::constants::{
    BREAKER_COOLDOWN_SECS, BREAKER_THRESHOLD, FETCH_TIMEOUT_SECS, PROXY_ROUTES, USER_AGENTS,
};
use crate::error::{AppError, Result};

/// Seam between the network and everything above it. Implementations
/// must be shareable across spawned tasks.
pub trait Fetch: Send + Sync + 'static {
    /// Fetch a text payload (JSON or CSV) from `url`
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send;

    /// Fetch a binary payload (XLSX) from `url`
    fn fetch_binary(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

#[derive(Clone, Copy)]
enum Expected {
    /// JSON object/array or a CSV starting with a `Date,` header
    TextData,
    /// ZIP container (XLSX)
    Zip,
}

enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Default, Clone)]
struct RouteHealth {
    consecutive_failures: u32,
    broken_until: Option<Instant>,
}

/// Production `Fetch` implementation: proxy race plus per-route breaker
pub struct ProxyRacer {
    client: reqwest::Client,
    health: Mutex<HashMap<&'static str, RouteHealth>>,
}

impl ProxyRacer {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            health: Mutex::new(HashMap::new()),
        })
    }

    async fn race(&self, target: &str, expected: Expected) -> Result<Payload> {
        let routes = self.healthy_routes().await;
        debug!(target = target, routes = routes.len(), "Racing proxy routes");

        let mut inflight: FuturesUnordered<_> = routes
            .into_iter()
            .map(|(name, base, param)| async move {
                (name, self.attempt(name, base, param, target, expected).await)
            })
            .collect();

        let mut last_error = String::new();
        while let Some((name, outcome)) = inflight.next().await {
            match outcome {
                Ok(payload) => {
                    self.record_success(name).await;
                    return Ok(payload);
                }
                Err(e) => {
                    warn!(route = name, error = %e, "Proxy route attempt failed");
                    self.record_failure(name).await;
                    last_error = e.to_string();
                }
            }
        }

        Err(AppError::UpstreamUnavailable(format!(
            "every proxy route failed for {} (last: {})",
            target, last_error
        )))
    }

    async fn attempt(
        &self,
        name: &'static str,
        base: &str,
        param: &str,
        target: &str,
        expected: Expected,
    ) -> Result<Payload> {
        let url = reqwest::Url::parse_with_params(base, &[(param, target)])
            .map_err(|e| AppError::Config(format!("{}: bad proxy URL: {}", name, e)))?;
        let agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, agent)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("{}: {}", name, e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "{}: HTTP {}",
                name,
                response.status()
            )));
        }

        match expected {
            Expected::TextData => {
                let text = response
                    .text()
                    .await
                    .map_err(|e| AppError::UpstreamUnavailable(format!("{}: {}", name, e)))?;
                if looks_like_data(&text) {
                    Ok(Payload::Text(text))
                } else {
                    // Proxies return their own HTML error pages with
                    // status 200; shape validation is the real check
                    Err(AppError::InvalidPayload(format!(
                        "{}: body is not JSON or CSV data",
                        name
                    )))
                }
            }
            Expected::Zip => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| AppError::UpstreamUnavailable(format!("{}: {}", name, e)))?;
                if looks_like_zip(&bytes) {
                    Ok(Payload::Binary(bytes.to_vec()))
                } else {
                    Err(AppError::InvalidPayload(format!(
                        "{}: body is not a ZIP container",
                        name
                    )))
                }
            }
        }
    }

    /// Routes currently eligible for an attempt. Falls open to the full
    /// route table when all of them are benched.
    async fn healthy_routes(&self) -> Vec<(&'static str, &'static str, &'static str)> {
        let now = Instant::now();
        let mut health = self.health.lock().await;

        let eligible: Vec<_> = PROXY_ROUTES
            .iter()
            .filter(|(name, _, _)| {
                health
                    .get(name)
                    .and_then(|h| h.broken_until)
                    .map_or(true, |until| until <= now)
            })
            .copied()
            .collect();

        if eligible.is_empty() {
            warn!("All proxy routes benched, failing open and resetting breaker state");
            health.clear();
            return PROXY_ROUTES.to_vec();
        }
        eligible
    }

    async fn record_failure(&self, name: &'static str) {
        let mut health = self.health.lock().await;
        let entry = health.entry(name).or_default();
        entry.consecutive_failures += 1;
        if entry.consecutive_failures >= BREAKER_THRESHOLD {
            entry.broken_until = Some(Instant::now() + Duration::from_secs(BREAKER_COOLDOWN_SECS));
        }
    }

    async fn record_success(&self, name: &'static str) {
        let mut health = self.health.lock().await;
        health.remove(name);
    }
}

/// JSON object, JSON array, or CSV with a date header. Anything else is
/// a proxy error page and is rejected outright.
fn looks_like_data(text: &str) -> bool {
    let head = text.trim_start();
    head.starts_with('{') || head.starts_with('[') || head.starts_with("Date,")
}

/// ZIP local-file-header magic (`PK`), the leading bytes of any XLSX
fn looks_like_zip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x50 && bytes[1] == 0x4B
}

impl Fetch for ProxyRacer {
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send {
        async move {
            match self.race(url, Expected::TextData).await? {
                Payload::Text(text) => Ok(text),
                Payload::Binary(_) => Err(AppError::InvalidPayload(
                    "expected text payload".to_string(),
                )),
            }
        }
    }

    fn fetch_binary(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            match self.race(url, Expected::Zip).await? {
                Payload::Binary(bytes) => Ok(bytes),
                Payload::Text(_) => Err(AppError::InvalidPayload(
                    "expected binary payload".to_string(),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_data() {
        assert!(looks_like_data("{\"chart\":{}}"));
        assert!(looks_like_data("  [1,2,3]"));
        assert!(looks_like_data("Date,Open,High,Low,Close,Volume\n"));
        assert!(!looks_like_data("<!DOCTYPE html><html>error</html>"));
        assert!(!looks_like_data("Too Many Requests"));
        assert!(!looks_like_data(""));
    }

    #[test]
    fn test_looks_like_zip() {
        assert!(looks_like_zip(b"PK\x03\x04workbook bytes"));
        assert!(!looks_like_zip(b"<!DOCTYPE html><html>error</html>"));
        assert!(!looks_like_zip(b"P"));
        assert!(!looks_like_zip(b""));
    }

    #[tokio::test]
    async fn test_breaker_benches_route_after_threshold() {
        let racer = ProxyRacer::new().unwrap();
        let benched = PROXY_ROUTES[0].0;
        for _ in 0..BREAKER_THRESHOLD {
            racer.record_failure(benched).await;
        }

        let names: Vec<&str> = racer
            .healthy_routes()
            .await
            .into_iter()
            .map(|(name, _, _)| name)
            .collect();
        assert!(!names.contains(&benched));
        assert_eq!(names.len(), PROXY_ROUTES.len() - 1);
    }

    #[tokio::test]
    async fn test_breaker_fails_open_when_all_benched() {
        let racer = ProxyRacer::new().unwrap();
        for (name, _, _) in PROXY_ROUTES {
            for _ in 0..BREAKER_THRESHOLD {
                racer.record_failure(name).await;
            }
        }

        // Every route benched: the full table comes back and health
        // state is reset
        let routes = racer.healthy_routes().await;
        assert_eq!(routes.len(), PROXY_ROUTES.len());
        let routes = racer.healthy_routes().await;
        assert_eq!(routes.len(), PROXY_ROUTES.len());
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let racer = ProxyRacer::new().unwrap();
        let route = PROXY_ROUTES[0].0;
        for _ in 0..BREAKER_THRESHOLD - 1 {
            racer.record_failure(route).await;
        }
        racer.record_success(route).await;
        for _ in 0..BREAKER_THRESHOLD - 1 {
            racer.record_failure(route).await;
        }

        let names: Vec<&str> = racer
            .healthy_routes()
            .await
            .into_iter()
            .map(|(name, _, _)| name)
            .collect();
        assert!(names.contains(&route));
    }

    #[tokio::test]
    async fn test_failures_below_threshold_keep_route() {
        let racer = ProxyRacer::new().unwrap();
        racer.record_failure(PROXY_ROUTES[1].0).await;
        let routes = racer.healthy_routes().await;
        assert_eq!(routes.len(), PROXY_ROUTES.len());
    }
}
