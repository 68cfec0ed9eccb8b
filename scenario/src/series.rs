use crate::eval;
use crate::interpolation::Interpolation;

/// Parsed scenario: one shared time axis and, per column, a carry-forward filled
/// value sequence of the same length.
///
/// The axis keeps input order and is non-decreasing; equal neighboring times are
/// allowed. A set is never patched after parsing, only replaced.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeriesSet {
    pub(crate) time_axis: Vec<f64>,
    pub(crate) columns: Vec<Column>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    pub(crate) values: Vec<f64>,
    pub(crate) interpolation: Interpolation,
    /// Index of the first real sample on the shared axis. Earlier entries are 0.0 fill.
    pub(crate) first_sample: Option<usize>,
}

impl TimeSeriesSet {
    pub fn time_axis(&self) -> &[f64] {
        &self.time_axis
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_axis.is_empty()
    }
}

impl Column {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// The first time at which this column was given a value, if any.
    pub fn first_sample(&self) -> Option<usize> {
        self.first_sample
    }
}

/// Per-column index of the last bracket an evaluation landed in.
///
/// Purely a search accelerator: any content, including stale hints from a previous set,
/// yields the same values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchHints(Vec<usize>);

impl SearchHints {
    pub fn cold(columns: usize) -> Self {
        SearchHints(vec![0; columns])
    }

    pub fn get(&self, column: usize) -> usize {
        self.0.get(column).copied().unwrap_or(0)
    }

    pub(crate) fn set(&mut self, column: usize, index: usize) {
        if let Some(slot) = self.0.get_mut(column) {
            *slot = index;
        }
    }

    pub fn reset(&mut self) {
        self.0.iter_mut().for_each(|h| *h = 0);
    }
}

/// The state one component instance owns: a parsed set and its search hints.
#[derive(Clone, Debug, Default)]
pub struct Signals {
    series: TimeSeriesSet,
    hints: SearchHints,
}

impl Signals {
    pub fn new(series: TimeSeriesSet) -> Self {
        let hints = SearchHints::cold(series.num_columns());
        Signals { series, hints }
    }

    pub fn series(&self) -> &TimeSeriesSet {
        &self.series
    }

    pub fn hints(&self) -> &SearchHints {
        &self.hints
    }

    pub fn num_columns(&self) -> usize {
        self.series.num_columns()
    }

    /// Value of `column` at `time`, or `None` if there is no such column.
    pub fn value_at(&mut self, column: usize, time: f64) -> Option<f64> {
        eval::eval(&self.series, &mut self.hints, column, time)
    }

    pub fn into_series(self) -> TimeSeriesSet {
        self.series
    }
}

impl From<TimeSeriesSet> for Signals {
    fn from(series: TimeSeriesSet) -> Self {
        Signals::new(series)
    }
}
