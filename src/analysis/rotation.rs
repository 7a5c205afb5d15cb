//! Relative-strength ratio and rotation trigger classification

use crate::constants::{BENCH_ALIGN_TOLERANCE_DAYS, RATIO_MA_POINTS, RATIO_TREND_LOOKBACK};
use crate::models::{PricePoint, RotationSignal, Setup, Trend, Trigger};

/// Relative change below this magnitude over the trend lookback counts
/// as flat
const TREND_FLAT_BAND: f64 = 0.001;

/// Classify a sector's rotation state from its price series, the
/// benchmark price series and the sector's current Z-score.
///
/// Needs at least 30 aligned ratio points; returns None otherwise.
pub fn rotation_signal(
    sector: &[PricePoint],
    benchmark: &[PricePoint],
    current_z: f64,
) -> Option<RotationSignal> {
    let ratios = ratio_series(sector, benchmark);
    if ratios.len() < RATIO_MA_POINTS {
        return None;
    }
    let ratio = *ratios.last()?;
    let window = &ratios[ratios.len() - RATIO_MA_POINTS..];
    let ratio_ma = window.iter().sum::<f64>() / RATIO_MA_POINTS as f64;
    let above_ma = ratio > ratio_ma;

    let earlier = ratios[ratios.len() - 1 - RATIO_TREND_LOOKBACK];
    let change = (ratio - earlier) / earlier;
    let trending = if change > TREND_FLAT_BAND {
        Trend::Up
    } else if change < -TREND_FLAT_BAND {
        Trend::Down
    } else {
        Trend::Flat
    };

    let setup = if current_z < -1.0 {
        Setup::Weak
    } else if current_z > 1.0 {
        Setup::Strong
    } else {
        Setup::Neutral
    };

    let trigger = match (setup, above_ma, trending) {
        (Setup::Weak, true, Trend::Up) => Trigger::BuyRotation,
        (Setup::Strong, false, Trend::Down) => Trigger::SellRotation,
        (Setup::Weak, _, _) => Trigger::Watch,
        (Setup::Strong, _, _) => Trigger::Caution,
        _ => Trigger::Wait,
    };

    // Presentation heuristic, not a calibrated probability: the MA
    // regime agreeing with the trigger direction earns the scaled
    // score, watch/caution states get a flat 30
    let confidence = match trigger {
        Trigger::BuyRotation | Trigger::SellRotation => (current_z.abs() * 30.0 + 20.0).min(100.0),
        Trigger::Watch | Trigger::Caution => 30.0,
        Trigger::Wait => 20.0,
    };

    Some(RotationSignal {
        setup,
        above_ma,
        trending,
        trigger,
        confidence,
        zscore: current_z,
        ratio,
        ratio_ma,
    })
}

/// sector_close / nearest_benchmark_close, aligned by a monotonically
/// advancing benchmark cursor within the 10-day tolerance. Both series
/// are iterated in full date order exactly once.
fn ratio_series(sector: &[PricePoint], benchmark: &[PricePoint]) -> Vec<f64> {
    const DAY_MS: i64 = 86_400_000;
    let tolerance_ms = BENCH_ALIGN_TOLERANCE_DAYS * DAY_MS;

    let mut ratios = Vec::with_capacity(sector.len());
    let mut cursor = 0usize;

    for point in sector {
        let ts = point.date.timestamp_millis();
        while cursor + 1 < benchmark.len()
            && (benchmark[cursor + 1].date.timestamp_millis() - ts).abs()
                < (benchmark[cursor].date.timestamp_millis() - ts).abs()
        {
            cursor += 1;
        }
        match benchmark.get(cursor) {
            Some(bench) if (bench.date.timestamp_millis() - ts).abs() <= tolerance_ms => {
                if bench.close > 0.0 {
                    ratios.push(point.close / bench.close);
                }
            }
            _ => {}
        }
    }
    ratios
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn week_date(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 7, 0, 0, 0).unwrap() + Duration::weeks(i as i64)
    }

    fn points(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(week_date(i), c))
            .collect()
    }

    #[test]
    fn test_too_few_points_is_none() {
        let sector = points(&[100.0; 20]);
        let bench = points(&[100.0; 20]);
        assert!(rotation_signal(&sector, &bench, -2.0).is_none());
    }

    #[test]
    fn test_buy_rotation() {
        // Flat ratio history, then a recent push above the MA: weak
        // setup recovering relative strength
        let mut closes = vec![100.0; 35];
        for (i, c) in closes.iter_mut().enumerate().skip(29) {
            *c = 100.0 + (i - 28) as f64 * 2.0;
        }
        let sector = points(&closes);
        let bench = points(&[100.0; 35]);

        let signal = rotation_signal(&sector, &bench, -2.5).unwrap();
        assert_eq!(signal.setup, Setup::Weak);
        assert!(signal.above_ma);
        assert_eq!(signal.trending, Trend::Up);
        assert_eq!(signal.trigger, Trigger::BuyRotation);
        assert!((signal.confidence - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_sell_rotation() {
        let mut closes = vec![100.0; 35];
        for (i, c) in closes.iter_mut().enumerate().skip(29) {
            *c = 100.0 - (i - 28) as f64 * 2.0;
        }
        let sector = points(&closes);
        let bench = points(&[100.0; 35]);

        let signal = rotation_signal(&sector, &bench, 2.0).unwrap();
        assert_eq!(signal.setup, Setup::Strong);
        assert!(!signal.above_ma);
        assert_eq!(signal.trending, Trend::Down);
        assert_eq!(signal.trigger, Trigger::SellRotation);
    }

    #[test]
    fn test_merely_weak_is_watch() {
        // Ratio falling: weak without MA support
        let closes: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        let sector = points(&closes);
        let bench = points(&[100.0; 40]);

        let signal = rotation_signal(&sector, &bench, -1.5).unwrap();
        assert_eq!(signal.trigger, Trigger::Watch);
        assert_eq!(signal.confidence, 30.0);
    }

    #[test]
    fn test_neutral_is_wait() {
        let sector = points(&[100.0; 40]);
        let bench = points(&[100.0; 40]);
        let signal = rotation_signal(&sector, &bench, 0.2).unwrap();
        assert_eq!(signal.setup, Setup::Neutral);
        assert_eq!(signal.trending, Trend::Flat);
        assert_eq!(signal.trigger, Trigger::Wait);
    }

    #[test]
    fn test_confidence_capped_at_100() {
        let mut closes = vec![100.0; 35];
        for (i, c) in closes.iter_mut().enumerate().skip(29) {
            *c = 100.0 + (i - 28) as f64 * 2.0;
        }
        let sector = points(&closes);
        let bench = points(&[100.0; 35]);

        let signal = rotation_signal(&sector, &bench, -6.0).unwrap();
        assert_eq!(signal.trigger, Trigger::BuyRotation);
        assert_eq!(signal.confidence, 100.0);
    }
}
