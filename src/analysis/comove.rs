//! Co-movement scoring of holdings against their sector ETF
//!
//! One set of sector statistics is computed per sector and shared across
//! every holding, so the correlation and beta denominators are identical
//! for all peers in the ranking.

use crate::analysis::align::ReturnIndex;
use crate::analysis::returns::weekly_return;
use crate::analysis::stats::{sample_covariance, sample_std, sample_variance};
use crate::constants::{COMOVE_MIN_PAIRS, COMOVE_WINDOW_WEEKS, STOCK_ALIGN_TOLERANCE_DAYS};
use crate::models::PricePoint;

/// Sector-side inputs to the co-movement score, precomputed once per
/// sector over its trailing weekly-return window.
#[derive(Debug, Clone)]
pub struct SectorComoveStats {
    index: ReturnIndex,
    variance: f64,
    std: f64,
}

impl SectorComoveStats {
    /// None when the sector itself has a degenerate trailing window.
    pub fn build(sector: &[PricePoint]) -> Option<Self> {
        let returns = weekly_return(sector);
        let start = returns.len().saturating_sub(COMOVE_WINDOW_WEEKS);
        let window = &returns[start..];
        if window.len() < COMOVE_MIN_PAIRS {
            return None;
        }

        let values: Vec<f64> = window.iter().map(|r| r.value).collect();
        let variance = sample_variance(&values);
        let std = variance.sqrt();
        if !(variance > 0.0) || !variance.is_finite() {
            return None;
        }

        Some(Self {
            index: ReturnIndex::build(window),
            variance,
            std,
        })
    }
}

/// Co-movement score for one holding: correlation times beta of its
/// weekly returns against the sector's, over the shared trailing window.
///
/// Defined only when both correlation and beta are finite and positive;
/// anything else (anti-correlated, orthogonal, thin history) is None and
/// sorts after every scored peer.
pub fn comove_score(stock: &[PricePoint], stats: &SectorComoveStats) -> Option<f64> {
    let returns = weekly_return(stock);
    let start = returns.len().saturating_sub(COMOVE_WINDOW_WEEKS);

    let mut stock_vals = Vec::new();
    let mut sector_vals = Vec::new();
    for point in &returns[start..] {
        if let Some(sector_value) = stats
            .index
            .nearest(point.date.timestamp_millis(), STOCK_ALIGN_TOLERANCE_DAYS)
        {
            stock_vals.push(point.value);
            sector_vals.push(sector_value);
        }
    }
    if stock_vals.len() < COMOVE_MIN_PAIRS {
        return None;
    }

    let cov = sample_covariance(&stock_vals, &sector_vals);
    let stock_std = sample_std(&stock_vals);
    if stock_std <= 0.0 {
        return None;
    }

    let corr = cov / (stock_std * stats.std);
    let beta = cov / stats.variance;
    if corr.is_finite() && beta.is_finite() && corr > 0.0 && beta > 0.0 {
        Some(corr * beta)
    } else {
        None
    }
}
