mod config;
mod price;
mod signal;

pub use config::{GrowthWeights, RefreshConfig, SortKey};
pub use price::{normalize_points, DataSource, PricePoint, PriceSeries};
pub use signal::{
    DataQuality, GrowthScore, Holding, HoldingMetrics, RankedHolding, ReturnPoint, RotationSignal,
    Setup, Trend, Trigger, ZScorePoint,
};
