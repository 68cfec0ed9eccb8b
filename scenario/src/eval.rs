//! Time-indexed evaluation of a parsed [TimeSeriesSet].
//!
//! Orchestrators almost always advance time monotonically, so each lookup first tries
//! the bracket the previous lookup ended in, then the one after it, and only falls back
//! to a binary search over the axis when neither contains the query time.

use crate::interpolation::Interpolation;
use crate::series::{Column, SearchHints, TimeSeriesSet};
use tracing::trace;

/// Value of `column` at `time`, updating that column's search hint.
///
/// Returns `None` only for a column index the set does not have. Times before the
/// column's first sample (and NaN) read 0.0. Exact hits on a stored time return the
/// stored value; anything later than the last sample holds for linear and zero-order-hold
/// columns, while nearest-neighbor columns keep comparing the final two samples.
pub fn eval(
    series: &TimeSeriesSet,
    hints: &mut SearchHints,
    column: usize,
    time: f64,
) -> Option<f64> {
    let data = series.column(column)?;
    let axis = series.time_axis();

    let Some(first) = data.first_sample else {
        return Some(0.0);
    };
    if time.is_nan() || time < axis[first] {
        return Some(0.0);
    }

    let index = locate(axis, hints.get(column), time);
    hints.set(column, index);
    Some(sample(axis, data, first, index, time))
}

/// Index of the last axis entry at or before `time`.
///
/// Requires `axis[0] <= time`.
fn locate(axis: &[f64], hint: usize, time: f64) -> usize {
    let contains = |k: usize| axis[k] <= time && axis.get(k + 1).is_none_or(|next| time < *next);

    if hint < axis.len() {
        if contains(hint) {
            return hint;
        }
        if hint + 1 < axis.len() && contains(hint + 1) {
            return hint + 1;
        }
    }

    trace!(hint, time, "search hint missed, falling back to binary search");
    axis.partition_point(|t| *t <= time) - 1
}

fn sample(axis: &[f64], column: &Column, first: usize, index: usize, time: f64) -> f64 {
    let values = &column.values;
    let lower = (axis[index], values[index]);
    if lower.0 == time {
        return lower.1;
    }

    match axis.get(index + 1) {
        Some(&t1) => between(column.interpolation, time, lower, (t1, values[index + 1])),
        None => match column.interpolation {
            Interpolation::NearestNeighbor if index > first => {
                nearest(time, (axis[index - 1], values[index - 1]), lower)
            }
            _ => lower.1,
        },
    }
}

fn between(policy: Interpolation, time: f64, (t0, v0): (f64, f64), (t1, v1): (f64, f64)) -> f64 {
    match policy {
        Interpolation::ZeroOrderHold => v0,
        Interpolation::NearestNeighbor => nearest(time, (t0, v0), (t1, v1)),
        Interpolation::Linear => {
            let dt = t1 - t0;
            if dt == 0.0 {
                return v1;
            }
            v0 + (time - t0) / dt * (v1 - v0)
        }
    }
}

fn nearest(time: f64, (t0, v0): (f64, f64), (t1, v1): (f64, f64)) -> f64 {
    if (time - t0).abs() <= (time - t1).abs() {
        v0
    } else {
        v1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_uses_hint_and_neighbor() {
        let axis = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(locate(&axis, 1, 1.5), 1);
        assert_eq!(locate(&axis, 1, 2.5), 2);
        assert_eq!(locate(&axis, 3, 10.0), 3);
    }

    #[test]
    fn locate_recovers_from_stale_hint() {
        let axis = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(locate(&axis, 3, 0.5), 0);
        assert_eq!(locate(&axis, 0, 2.9), 2);
        assert_eq!(locate(&axis, 17, 1.0), 1);
    }

    #[test]
    fn locate_takes_last_duplicate() {
        let axis = [0.0, 1.0, 1.0, 2.0];
        assert_eq!(locate(&axis, 0, 1.0), 2);
        assert_eq!(locate(&axis, 1, 1.0), 2);
        assert_eq!(locate(&axis, 2, 1.5), 2);
    }

    #[test]
    fn linear_degenerate_bracket() {
        assert_eq!(between(Interpolation::Linear, 1.0, (1.0, 2.0), (1.0, 7.0)), 7.0);
    }

    #[test]
    fn nearest_ties_go_early() {
        assert_eq!(nearest(1.5, (1.0, 10.0), (2.0, 20.0)), 10.0);
        assert_eq!(nearest(1.6, (1.0, 10.0), (2.0, 20.0)), 20.0);
    }
}
