use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::DataSource;

/// Percentage return observed at the date of the later price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// One monthly cyclical Z-score observation, clamped to [-6, 6]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZScorePoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// Descriptive metadata about one sector's Z-score computation.
/// Recomputed every refresh, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQuality {
    pub source: DataSource,
    pub point_count: usize,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub aligned_count: usize,
    pub missed_count: usize,
    /// aligned / (aligned + missed) * 100, rounded
    pub alignment_pct: f64,
}

/// Z-score regime for the rotation classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Setup {
    Weak,
    Strong,
    Neutral,
}

/// Direction of the relative-strength ratio over the trend lookback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Discrete rotation trigger state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    #[serde(rename = "BUY ROTATION")]
    BuyRotation,
    #[serde(rename = "SELL ROTATION")]
    SellRotation,
    #[serde(rename = "WATCH")]
    Watch,
    #[serde(rename = "CAUTION")]
    Caution,
    #[serde(rename = "WAIT")]
    Wait,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trigger::BuyRotation => "BUY ROTATION",
            Trigger::SellRotation => "SELL ROTATION",
            Trigger::Watch => "WATCH",
            Trigger::Caution => "CAUTION",
            Trigger::Wait => "WAIT",
        };
        write!(f, "{}", s)
    }
}

/// Relative-strength / rotation signal for one sector vs. the benchmark.
///
/// `confidence` is a presentation heuristic in [0, 100], not a
/// statistically calibrated probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationSignal {
    pub setup: Setup,
    pub above_ma: bool,
    pub trending: Trend,
    pub trigger: Trigger,
    pub confidence: f64,
    pub zscore: f64,
    pub ratio: f64,
    pub ratio_ma: f64,
}

/// Membership of a sector ETF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub name: String,
    /// Weight in percent, 0 if unknown
    pub weight: f64,
}

/// Per-holding metric bundle feeding the growth composite.
///
/// Every field is optional: a metric its upstream could not provide is a
/// gap, excluded from the composite rather than scored as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldingMetrics {
    pub ret_12m: Option<f64>,
    pub ret_6m: Option<f64>,
    pub ret_3m: Option<f64>,
    /// Max drawdown over the trailing year, as a negative percentage
    pub max_drawdown: Option<f64>,
    /// Close above its 30-week moving average
    pub trend_30w: Option<bool>,
    /// Relative strength vs. sector improving over the trend lookback
    pub rs_improving: Option<bool>,
    /// Co-movement score (corr x beta), only present when positive
    pub comove: Option<f64>,
    pub sentiment: Option<f64>,
    pub news_mentions: Option<u32>,
}

/// Composite growth score for one holding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthScore {
    /// Bounded [0, 100], one decimal
    pub score: f64,
    /// Per-metric percentile ranks within the scored cross-section
    pub percentiles: HashMap<String, f64>,
    pub sector_turn: bool,
}

/// Holding enriched with metrics and its composite score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedHolding {
    pub holding: Holding,
    pub metrics: HoldingMetrics,
    pub growth: Option<GrowthScore>,
}
