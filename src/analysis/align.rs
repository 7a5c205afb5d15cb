//! Nearest-in-time alignment between independently-fetched return series

use crate::models::ReturnPoint;

const DAY_MS: i64 = 86_400_000;

/// Binary-searchable index over one return series: parallel arrays of
/// epoch-millisecond timestamps (ascending) and values.
///
/// Built fresh per (series, lag) pair, never incrementally updated.
#[derive(Debug, Clone)]
pub struct ReturnIndex {
    timestamps: Vec<i64>,
    values: Vec<f64>,
}

impl ReturnIndex {
    /// Input must already be sorted by date, which rolling_return
    /// guarantees by construction.
    pub fn build(returns: &[ReturnPoint]) -> Self {
        Self {
            timestamps: returns.iter().map(|r| r.date.timestamp_millis()).collect(),
            values: returns.iter().map(|r| r.value).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Value of the point nearest to `target_ts`, or None when the
    /// closest match is farther than `max_delta_days`. Ties between the
    /// two bracketing points break toward the earlier one.
    pub fn nearest(&self, target_ts: i64, max_delta_days: i64) -> Option<f64> {
        self.nearest_point(target_ts, max_delta_days)
            .map(|(_, value)| value)
    }

    /// Like `nearest`, but also yields the matched point's own
    /// timestamp, for callers that bucket on the index's calendar.
    pub fn nearest_point(&self, target_ts: i64, max_delta_days: i64) -> Option<(i64, f64)> {
        if self.timestamps.is_empty() {
            return None;
        }

        let idx = self.timestamps.partition_point(|&ts| ts < target_ts);

        let mut best: Option<(i64, usize)> = None;
        if idx > 0 {
            let d = (target_ts - self.timestamps[idx - 1]).abs();
            best = Some((d, idx - 1));
        }
        if idx < self.timestamps.len() {
            let d = (target_ts - self.timestamps[idx]).abs();
            // Strictly closer wins; equal distance keeps the earlier point
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, idx));
            }
        }

        let (dist, i) = best?;
        if dist <= max_delta_days * DAY_MS {
            Some((self.timestamps[i], self.values[i]))
        } else {
            None
        }
    }
}
