//! Cross-sectional growth composite
//!
//! Every continuous metric becomes a percentile rank within the sector's
//! own holdings, so scores compare peers rather than absolute levels.
//! Missing metrics drop out of both numerator and denominator.

use std::collections::HashMap;

use crate::analysis::stats::percentile_rank;
use crate::models::{GrowthScore, GrowthWeights, HoldingMetrics, ZScorePoint};

/// Months of Z-score history inspected for a washout
const SECTOR_TURN_LOOKBACK_MONTHS: usize = 6;

/// Score every holding against its sector peers.
///
/// Output is positionally parallel to `metrics`; a holding with no
/// usable metric at all gets None.
pub fn score_cross_section(
    metrics: &[HoldingMetrics],
    sector_turn: bool,
    weights: &GrowthWeights,
) -> Vec<Option<GrowthScore>> {
    let cross = CrossSection::collect(metrics);

    metrics
        .iter()
        .map(|m| score_one(m, &cross, sector_turn, weights))
        .collect()
}

fn score_one(
    metrics: &HoldingMetrics,
    cross: &CrossSection,
    sector_turn: bool,
    weights: &GrowthWeights,
) -> Option<GrowthScore> {
    let mut percentiles: HashMap<String, f64> = HashMap::new();
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    let mut take = |name: &str, pct: Option<f64>, weight: f64| {
        if let Some(pct) = pct {
            percentiles.insert(name.to_string(), pct);
            weighted_sum += pct * weight;
            weight_sum += weight;
        }
    };

    take(
        "ret_12m",
        metrics.ret_12m.and_then(|v| percentile_rank(&cross.ret_12m, v)),
        weights.ret_12m,
    );
    take(
        "ret_6m",
        metrics.ret_6m.and_then(|v| percentile_rank(&cross.ret_6m, v)),
        weights.ret_6m,
    );
    take(
        "ret_3m",
        metrics.ret_3m.and_then(|v| percentile_rank(&cross.ret_3m, v)),
        weights.ret_3m,
    );
    // Drawdown percentile is inverted: the shallowest drawdown in the
    // cross-section ranks 100, the deepest 0
    take(
        "max_drawdown",
        metrics
            .max_drawdown
            .and_then(|v| percentile_rank(&cross.drawdown_magnitude, v.abs()))
            .map(|pct| 100.0 - pct),
        weights.max_drawdown,
    );
    take(
        "trend_30w",
        metrics.trend_30w.map(|flag| if flag { 100.0 } else { 0.0 }),
        weights.trend_30w,
    );
    take(
        "rs_improving",
        metrics.rs_improving.map(|flag| if flag { 100.0 } else { 0.0 }),
        weights.rs_improving,
    );
    take(
        "comove",
        metrics.comove.and_then(|v| percentile_rank(&cross.comove, v)),
        weights.comove,
    );
    take(
        "sentiment",
        metrics
            .sentiment
            .and_then(|v| percentile_rank(&cross.sentiment, v)),
        weights.sentiment,
    );
    take(
        "news_mentions",
        metrics
            .news_mentions
            .and_then(|v| percentile_rank(&cross.news_mentions, v as f64)),
        weights.news_mentions,
    );

    if weight_sum <= 0.0 {
        return None;
    }

    let mut score = weighted_sum / weight_sum;
    if sector_turn {
        if let Some(&comove_pct) = percentiles.get("comove") {
            score *= 1.0 + weights.sector_turn_boost * (comove_pct / 100.0);
        }
    }
    let score = ((score.min(100.0)) * 10.0).round() / 10.0;

    Some(GrowthScore {
        score,
        percentiles,
        sector_turn,
    })
}

/// A sector turn: any of the last six monthly Z-scores dipped below -2,
/// the latest has recovered above -1, and relative strength sits above
/// its moving average.
pub fn detect_sector_turn(monthly_z: &[ZScorePoint], rs_above_ma: bool) -> bool {
    if !rs_above_ma {
        return false;
    }
    let start = monthly_z.len().saturating_sub(SECTOR_TURN_LOOKBACK_MONTHS);
    let dipped = monthly_z[start..].iter().any(|p| p.value < -2.0);
    let recovered = monthly_z.last().map_or(false, |p| p.value > -1.0);
    dipped && recovered
}

/// Present values of each metric across the whole cross-section
struct CrossSection {
    ret_12m: Vec<f64>,
    ret_6m: Vec<f64>,
    ret_3m: Vec<f64>,
    drawdown_magnitude: Vec<f64>,
    comove: Vec<f64>,
    sentiment: Vec<f64>,
    news_mentions: Vec<f64>,
}

impl CrossSection {
    fn collect(metrics: &[HoldingMetrics]) -> Self {
        Self {
            ret_12m: metrics.iter().filter_map(|m| m.ret_12m).collect(),
            ret_6m: metrics.iter().filter_map(|m| m.ret_6m).collect(),
            ret_3m: metrics.iter().filter_map(|m| m.ret_3m).collect(),
            drawdown_magnitude: metrics
                .iter()
                .filter_map(|m| m.max_drawdown)
                .map(f64::abs)
                .collect(),
            comove: metrics.iter().filter_map(|m| m.comove).collect(),
            sentiment: metrics.iter().filter_map(|m| m.sentiment).collect(),
            news_mentions: metrics
                .iter()
                .filter_map(|m| m.news_mentions)
                .map(|v| v as f64)
                .collect(),
        }
    }
}
