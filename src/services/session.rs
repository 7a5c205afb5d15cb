//! Orchestration of a full analysis session
//!
//! The session owns the sector universe, the refresh configuration and
//! the shared price store. The benchmark is fetched exactly once per
//! operation and its return index is shared across every sector task.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::analysis::{
    comove_score, compute_sector_zscores, detect_sector_turn, rolling_return, rotation_signal,
    score_cross_section, ReturnIndex, SectorComoveStats,
};
use crate::analysis::stats::trailing_sma;
use crate::constants::{
    HOLDING_FETCH_CONCURRENCY, RATIO_TREND_LOOKBACK, SECTORS, SECTOR_FETCH_CONCURRENCY,
};
use crate::error::Result;
use crate::models::{
    DataQuality, GrowthWeights, Holding, HoldingMetrics, PricePoint, RankedHolding, RefreshConfig,
    RotationSignal, SortKey, ZScorePoint,
};
use crate::services::cache::PriceCache;
use crate::services::fetch::Fetch;
use crate::services::holdings::HoldingsService;
use crate::services::news::fetch_news_stats;
use crate::services::price_store::PriceStore;

/// Weeks of trailing history for the per-holding drawdown
const DRAWDOWN_WINDOW_WEEKS: usize = 52;

/// Moving-average length for the per-holding trend flag
const HOLDING_TREND_SMA_WEEKS: usize = 30;

/// Result of one full refresh, keyed by sector ticker. A sector that
/// failed to fetch is present with an empty Z-score series and no
/// quality entry.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub zscores: HashMap<String, Vec<ZScorePoint>>,
    pub quality: HashMap<String, DataQuality>,
}

pub struct SectorSession<F: Fetch> {
    fetcher: Arc<F>,
    store: Arc<PriceStore<F>>,
    holdings: HoldingsService<F>,
    config: RefreshConfig,
    sectors: Vec<(String, String)>,
}

impl<F: Fetch> SectorSession<F> {
    pub fn new(fetcher: Arc<F>, cache: PriceCache, config: RefreshConfig) -> Self {
        let store = Arc::new(PriceStore::new(Arc::clone(&fetcher), cache.clone()));
        let holdings = HoldingsService::new(Arc::clone(&fetcher), cache);
        Self {
            fetcher,
            store,
            holdings,
            config,
            sectors: SECTORS
                .iter()
                .map(|(t, n)| (t.to_string(), n.to_string()))
                .collect(),
        }
    }

    /// Replace the sector universe (smaller universes in tests)
    pub fn with_sectors(mut self, sectors: Vec<(String, String)>) -> Self {
        self.sectors = sectors;
        self
    }

    pub fn sectors(&self) -> &[(String, String)] {
        &self.sectors
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Refresh Z-scores for the whole universe.
    ///
    /// A missing benchmark is fatal: every sector depends on its return
    /// index. A failing sector only degrades that sector.
    pub async fn refresh_all(&self) -> Result<RefreshOutcome> {
        let ret_weeks = self.config.ret_weeks();
        let z_weeks = self.config.z_weeks();

        let bench = self.store.get_prices(&self.config.benchmark_ticker).await?;
        let bench_index = Arc::new(ReturnIndex::build(&rolling_return(
            &bench.points,
            ret_weeks,
        )));
        info!(
            benchmark = %self.config.benchmark_ticker,
            points = bench.len(),
            returns = bench_index.len(),
            "Benchmark return index ready"
        );

        let mut zscores = HashMap::new();
        let mut quality = HashMap::new();

        for chunk in self.sectors.chunks(SECTOR_FETCH_CONCURRENCY) {
            let mut handles = Vec::new();
            for (ticker, _) in chunk {
                let store = Arc::clone(&self.store);
                let index = Arc::clone(&bench_index);
                let ticker = ticker.clone();
                handles.push(tokio::spawn(async move {
                    match store.get_prices(&ticker).await {
                        Ok(series) => {
                            let (z, q) =
                                compute_sector_zscores(&series, &index, ret_weeks, z_weeks);
                            (ticker, z, Some(q))
                        }
                        Err(e) => {
                            warn!(ticker = %ticker, error = %e, "Sector refresh degraded");
                            (ticker, Vec::new(), None)
                        }
                    }
                }));
            }
            for joined in join_all(handles).await {
                match joined {
                    Ok((ticker, z, q)) => {
                        if let Some(q) = q {
                            quality.insert(ticker.clone(), q);
                        }
                        zscores.insert(ticker, z);
                    }
                    Err(e) => warn!(error = %e, "Sector task panicked"),
                }
            }
        }

        Ok(RefreshOutcome { zscores, quality })
    }

    /// Rotation signal for one sector, or None when the sector lacks the
    /// history for a current Z-score or enough aligned ratio points.
    pub async fn rotation(&self, sector: &str) -> Result<Option<RotationSignal>> {
        let sector = sector.to_uppercase();
        let bench = self.store.get_prices(&self.config.benchmark_ticker).await?;
        let series = self.store.get_prices(&sector).await?;

        let index = ReturnIndex::build(&rolling_return(&bench.points, self.config.ret_weeks()));
        let (zscores, _) =
            compute_sector_zscores(&series, &index, self.config.ret_weeks(), self.config.z_weeks());
        let Some(current) = zscores.last() else {
            return Ok(None);
        };
        Ok(rotation_signal(&series.points, &bench.points, current.value))
    }

    /// Holdings of one sector, enriched with metrics, growth-scored and
    /// sorted by `sort`.
    pub async fn holdings_ranking(
        &self,
        sector: &str,
        sort: SortKey,
    ) -> Result<Vec<RankedHolding>> {
        let sector = sector.to_uppercase();
        let bench = self.store.get_prices(&self.config.benchmark_ticker).await?;
        let sector_series = self.store.get_prices(&sector).await?;
        let holdings = self.holdings.get_holdings(&sector).await?;

        let index = ReturnIndex::build(&rolling_return(&bench.points, self.config.ret_weeks()));
        let (monthly_z, _) = compute_sector_zscores(
            &sector_series,
            &index,
            self.config.ret_weeks(),
            self.config.z_weeks(),
        );
        let rs_above_ma = monthly_z
            .last()
            .and_then(|z| rotation_signal(&sector_series.points, &bench.points, z.value))
            .map_or(false, |signal| signal.above_ma);
        let sector_turn = detect_sector_turn(&monthly_z, rs_above_ma);

        let comove_stats = SectorComoveStats::build(&sector_series.points).map(Arc::new);
        let sector_points = Arc::new(sector_series.points);

        let mut enriched: Vec<(Holding, HoldingMetrics)> = Vec::with_capacity(holdings.len());
        for chunk in holdings.chunks(HOLDING_FETCH_CONCURRENCY) {
            let mut handles = Vec::new();
            for holding in chunk {
                let store = Arc::clone(&self.store);
                let fetcher = Arc::clone(&self.fetcher);
                let stats = comove_stats.clone();
                let sector_points = Arc::clone(&sector_points);
                let holding = holding.clone();
                handles.push(tokio::spawn(async move {
                    let mut metrics = match store.get_prices(&holding.ticker).await {
                        Ok(series) => {
                            holding_metrics(&series.points, &sector_points, stats.as_deref())
                        }
                        Err(e) => {
                            warn!(ticker = %holding.ticker, error = %e, "Holding prices unavailable");
                            HoldingMetrics::default()
                        }
                    };
                    let (sentiment, mentions) =
                        fetch_news_stats(fetcher.as_ref(), &holding.ticker).await;
                    metrics.sentiment = sentiment;
                    metrics.news_mentions = mentions;
                    (holding, metrics)
                }));
            }
            for joined in join_all(handles).await {
                match joined {
                    Ok(pair) => enriched.push(pair),
                    Err(e) => warn!(error = %e, "Holding task panicked"),
                }
            }
        }

        let metric_list: Vec<HoldingMetrics> =
            enriched.iter().map(|(_, m)| m.clone()).collect();
        let growth = score_cross_section(&metric_list, sector_turn, &GrowthWeights::default());

        let mut ranked: Vec<RankedHolding> = enriched
            .into_iter()
            .zip(growth)
            .map(|((holding, metrics), growth)| RankedHolding {
                holding,
                metrics,
                growth,
            })
            .collect();
        sort_ranked(&mut ranked, sort);
        Ok(ranked)
    }
}

/// Price-derived metrics for one holding. Each metric is independent:
/// whatever the history cannot support stays None.
pub fn holding_metrics(
    stock: &[PricePoint],
    sector: &[PricePoint],
    comove: Option<&SectorComoveStats>,
) -> HoldingMetrics {
    let last_return = |lag: usize| rolling_return(stock, lag).last().map(|r| r.value);

    let closes: Vec<f64> = stock.iter().map(|p| p.close).collect();
    let trend_30w = trailing_sma(&closes, HOLDING_TREND_SMA_WEEKS)
        .and_then(|ma| closes.last().map(|&last| last > ma));

    let rs_improving = match (
        last_return(RATIO_TREND_LOOKBACK),
        rolling_return(sector, RATIO_TREND_LOOKBACK)
            .last()
            .map(|r| r.value),
    ) {
        (Some(stock_ret), Some(sector_ret)) => Some(stock_ret > sector_ret),
        _ => None,
    };

    HoldingMetrics {
        ret_12m: last_return(52),
        ret_6m: last_return(26),
        ret_3m: last_return(13),
        max_drawdown: max_drawdown(stock),
        trend_30w,
        rs_improving,
        comove: comove.and_then(|stats| comove_score(stock, stats)),
        sentiment: None,
        news_mentions: None,
    }
}

/// Worst peak-to-trough move over the trailing year, as a negative
/// percentage (0 for a series that only rose)
fn max_drawdown(stock: &[PricePoint]) -> Option<f64> {
    let start = stock.len().checked_sub(DRAWDOWN_WINDOW_WEEKS + 1).unwrap_or(0);
    let window = &stock[start..];
    if window.len() < 2 {
        return None;
    }

    let mut peak = window[0].close;
    let mut worst = 0.0f64;
    for point in &window[1..] {
        peak = peak.max(point.close);
        worst = worst.min((point.close / peak - 1.0) * 100.0);
    }
    Some(worst)
}

fn sort_ranked(ranked: &mut [RankedHolding], sort: SortKey) {
    ranked.sort_by(|a, b| match sort {
        SortKey::Growth => cmp_opt_desc(
            a.growth.as_ref().map(|g| g.score),
            b.growth.as_ref().map(|g| g.score),
        ),
        SortKey::Weight => b
            .holding
            .weight
            .partial_cmp(&a.holding.weight)
            .unwrap_or(Ordering::Equal),
        SortKey::Comove => cmp_opt_desc(a.metrics.comove, b.metrics.comove),
        SortKey::Ret12m => cmp_opt_desc(a.metrics.ret_12m, b.metrics.ret_12m),
    });
}

/// Descending on present values; absent values sort after every present
/// one
fn cmp_opt_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
