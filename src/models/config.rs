use serde::{Deserialize, Serialize};

/// Options driving one refresh cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Return lookback in years (converted to weeks at 52/year)
    pub return_period_years: f64,
    /// Z-score trailing window in years
    pub zscore_window_years: f64,
    pub benchmark_ticker: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            return_period_years: 2.0,
            zscore_window_years: 10.0,
            benchmark_ticker: "SPY".to_string(),
        }
    }
}

impl RefreshConfig {
    /// Return lag in weeks
    pub fn ret_weeks(&self) -> usize {
        (self.return_period_years * 52.0).round() as usize
    }

    /// Z-score window in weeks
    pub fn z_weeks(&self) -> usize {
        (self.zscore_window_years * 52.0).round() as usize
    }
}

/// Fixed weight table for the growth composite plus the cycle-boost
/// factor. Untuned heuristics carried as configuration, not validated
/// financial theory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthWeights {
    pub ret_12m: f64,
    pub ret_6m: f64,
    pub ret_3m: f64,
    pub max_drawdown: f64,
    pub trend_30w: f64,
    pub rs_improving: f64,
    pub comove: f64,
    pub sentiment: f64,
    pub news_mentions: f64,
    /// Multiplier applied as `1 + boost * (comove_pct / 100)` on a
    /// detected sector turn
    pub sector_turn_boost: f64,
}

impl Default for GrowthWeights {
    fn default() -> Self {
        Self {
            ret_12m: 18.0,
            ret_6m: 18.0,
            ret_3m: 14.0,
            max_drawdown: 14.0,
            trend_30w: 8.0,
            rs_improving: 8.0,
            comove: 8.0,
            sentiment: 6.0,
            news_mentions: 6.0,
            sector_turn_boost: 0.25,
        }
    }
}

/// Caller-selectable ranking key for the holdings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    /// Composite growth score
    Growth,
    /// Index weight
    Weight,
    /// Co-movement score
    Comove,
    /// Trailing 12-month return
    Ret12m,
}
