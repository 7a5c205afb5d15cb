//! Rolling percentage returns over a weekly price series

use crate::models::{PricePoint, ReturnPoint};

/// Percentage return at an arbitrary lag in weeks.
///
/// For every index `i >= lag_weeks` with positive closes at both ends,
/// emits `(close_i / close_{i-lag} - 1) * 100` dated at the later price.
/// The first `lag_weeks` points produce no output: insufficient history,
/// not a bug. Output length is `max(0, len - lag_weeks)` before the
/// positive-close filter, so a zero lag measures each price against
/// itself and emits one zero return per point. Output preserves input
/// date order.
pub fn rolling_return(points: &[PricePoint], lag_weeks: usize) -> Vec<ReturnPoint> {
    if points.len() <= lag_weeks {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(points.len() - lag_weeks);
    for i in lag_weeks..points.len() {
        let earlier = points[i - lag_weeks].close;
        let later = points[i].close;
        if earlier > 0.0 && later > 0.0 {
            out.push(ReturnPoint {
                date: points[i].date,
                value: (later / earlier - 1.0) * 100.0,
            });
        }
    }
    out
}

/// Week-over-week returns, used for covariance/correlation work
pub fn weekly_return(points: &[PricePoint]) -> Vec<ReturnPoint> {
    rolling_return(points, 1)
}
