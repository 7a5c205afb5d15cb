//! Cyclical Z-score engine
//!
//! Turns one sector's weekly price series plus a prebuilt benchmark
//! return index into monthly Z-score points: rolling relative returns,
//! trailing-window standardization with warm-up and degenerate-variance
//! guards, then one-point-per-month deduplication.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike};

use crate::analysis::align::ReturnIndex;
use crate::analysis::returns::rolling_return;
use crate::analysis::stats::{mean, sample_std};
use crate::constants::{
    BENCH_ALIGN_TOLERANCE_DAYS, ZSCORE_CLAMP, ZSCORE_MIN_WINDOW, ZSCORE_STD_FLOOR,
    ZSCORE_WARMUP_FLOOR_WEEKS, ZSCORE_WARMUP_FRACTION,
};
use crate::models::{DataQuality, PriceSeries, ReturnPoint, ZScorePoint};

/// Compute monthly cyclical Z-scores for one sector against a shared
/// benchmark return index.
///
/// Insufficient history yields an empty output, never an error: that is
/// the expected steady state for newly-listed tickers. Calling twice
/// with identical inputs yields identical output.
pub fn compute_sector_zscores(
    series: &PriceSeries,
    bench_index: &ReturnIndex,
    ret_weeks: usize,
    z_weeks: usize,
) -> (Vec<ZScorePoint>, DataQuality) {
    let sector_returns = rolling_return(&series.points, ret_weeks);

    let mut aligned_count = 0usize;
    let mut missed_count = 0usize;
    let mut rel: Vec<ReturnPoint> = Vec::with_capacity(sector_returns.len());

    for point in &sector_returns {
        match bench_index.nearest_point(point.date.timestamp_millis(), BENCH_ALIGN_TOLERANCE_DAYS) {
            Some((bench_ts, bench_value)) => {
                aligned_count += 1;
                // Relative points carry the benchmark's date: every
                // sector then standardizes and dedups on one shared
                // calendar, whatever its own observation weekday is
                let date = DateTime::from_timestamp_millis(bench_ts).unwrap_or(point.date);
                rel.push(ReturnPoint {
                    date,
                    value: point.value - bench_value,
                });
            }
            None => missed_count += 1,
        }
    }

    let zscores = standardize(&rel, z_weeks);
    let quality = quality_summary(series, aligned_count, missed_count);

    (zscores, quality)
}

/// Rolling standardization of a relative-return series.
///
/// The current point is scored against its trailing window only; the
/// window never contains the point itself.
fn standardize(rel: &[ReturnPoint], z_weeks: usize) -> Vec<ZScorePoint> {
    let warm_up = warmup_len(rel.len(), z_weeks);

    let mut monthly: BTreeMap<(i32, u32), ZScorePoint> = BTreeMap::new();

    for i in warm_up..rel.len() {
        let window_start = i.saturating_sub(z_weeks);
        let window: Vec<f64> = rel[window_start..i].iter().map(|r| r.value).collect();
        if window.len() < ZSCORE_MIN_WINDOW {
            continue;
        }

        let m = mean(&window);
        let std = sample_std(&window);
        // Degenerate/flat window: skipping distinguishes "truly flat"
        // from merely low-volatility and avoids division blow-up
        if std < ZSCORE_STD_FLOOR {
            continue;
        }

        let z = ((rel[i].value - m) / std).clamp(-ZSCORE_CLAMP, ZSCORE_CLAMP);
        let date = rel[i].date;
        // Later-in-month points overwrite earlier ones: one point per
        // calendar month, keeping the chronologically last
        monthly.insert((date.year(), date.month()), ZScorePoint { date, value: z });
    }

    monthly.into_values().collect()
}

/// Warm-up length: at least one year of relative-return history, or 60%
/// of the requested window when history is shorter. Avoids spurious
/// extreme Z-scores from thin early windows.
fn warmup_len(rel_len: usize, z_weeks: usize) -> usize {
    let fraction = (z_weeks.min(rel_len) as f64 * ZSCORE_WARMUP_FRACTION).floor() as usize;
    ZSCORE_WARMUP_FLOOR_WEEKS.max(fraction)
}

fn quality_summary(series: &PriceSeries, aligned_count: usize, missed_count: usize) -> DataQuality {
    let total = aligned_count + missed_count;
    let alignment_pct = if total > 0 {
        (aligned_count as f64 / total as f64 * 100.0).round()
    } else {
        0.0
    };

    DataQuality {
        source: series.source,
        point_count: series.points.len(),
        start_date: series.points.first().map(|p| p.date),
        end_date: series.points.last().map(|p| p.date),
        aligned_count,
        missed_count,
        alignment_pct,
    }
}
