//! Scenario and interpolation text parsing.
//!
//! Scenario text is a sequence of groups `[t;v1;v2;...]`, one per sample time. Value
//! fields may be empty, which means "no new sample for this column at this time"; the
//! column then carries its last value forward. Interpolation text has the same shape,
//! `[;tok1;tok2;...]`, with the first (time) token ignored.

use crate::diagnostics::{ScenarioWarning, Status};
use crate::interpolation::Interpolation;
use crate::series::{Column, TimeSeriesSet};
use crate::text::{Fields, bracket_groups, parse_number, split_fields, strip_brackets};
use tracing::{debug, trace, warn};

/// A parsed set together with everything that went wrong on the way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parsed {
    pub series: TimeSeriesSet,
    pub warnings: Vec<ScenarioWarning>,
}

impl Parsed {
    pub fn status(&self) -> Status {
        self.warnings.iter().map(Status::from).collect()
    }
}

struct Row<'a> {
    time: f64,
    /// Value fields only, the time field is stripped.
    fields: Fields<'a>,
}

/// Parses scenario and interpolation text into a fresh [TimeSeriesSet].
///
/// At most `max_columns` columns are produced; fields past that are never looked at.
/// When interpolation text is given it also bounds the column count, and if its token
/// count disagrees with the widest scenario group (after the cap), every column gets
/// [Interpolation::DEFAULT].
pub fn parse(scenario: &str, interpolation: &str, max_columns: usize) -> Parsed {
    let mut warnings = Vec::new();

    if scenario.trim().is_empty() {
        warn!("{}", ScenarioWarning::MissingInput);
        warnings.push(ScenarioWarning::MissingInput);
        return Parsed {
            series: TimeSeriesSet::default(),
            warnings,
        };
    }

    let rows = collect_rows(scenario, &mut warnings);
    let width = rows
        .iter()
        .map(|r| r.fields.len())
        .max()
        .unwrap_or(0)
        .min(max_columns);

    let tokens = interpolation_tokens(interpolation);
    let policies = match &tokens {
        Some(tokens) if tokens.len() != width => {
            let mismatch = ScenarioWarning::ColumnCountMismatch {
                tokens: tokens.len(),
                columns: width,
            };
            warn!("{mismatch}");
            warnings.push(mismatch);
            None
        }
        other => other.clone(),
    };

    let num_columns = width.min(tokens.as_ref().map_or(usize::MAX, |t| t.len()));

    let mut columns: Vec<Column> = (0..num_columns)
        .map(|c| Column {
            values: Vec::with_capacity(rows.len()),
            interpolation: policies
                .as_ref()
                .map_or(Interpolation::DEFAULT, |p| p[c]),
            first_sample: None,
        })
        .collect();

    for (row_index, row) in rows.iter().enumerate() {
        for (c, column) in columns.iter_mut().enumerate() {
            let field = row.fields.get(c).copied().unwrap_or("");
            match parse_number(field) {
                Some(value) => {
                    column.first_sample.get_or_insert(row_index);
                    column.values.push(value);
                }
                None => {
                    if !field.trim().is_empty() {
                        trace!(column = c, time = row.time, field, "unparsable value, carrying forward");
                    }
                    let carried = column.values.last().copied().unwrap_or(0.0);
                    column.values.push(carried);
                }
            }
        }
    }

    debug!(
        rows = rows.len(),
        columns = num_columns,
        dropped = warnings.len(),
        "parsed scenario"
    );

    Parsed {
        series: TimeSeriesSet {
            time_axis: rows.iter().map(|r| r.time).collect(),
            columns,
        },
        warnings,
    }
}

fn collect_rows<'a>(scenario: &'a str, warnings: &mut Vec<ScenarioWarning>) -> Vec<Row<'a>> {
    let mut rows: Vec<Row<'a>> = Vec::new();

    for (index, group) in bracket_groups(scenario).enumerate() {
        let mut fields = split_fields(group);
        let Some(time) = parse_number(fields[0]) else {
            let dropped = ScenarioWarning::MalformedRow {
                index,
                text: group.to_string(),
            };
            warn!("{dropped}");
            warnings.push(dropped);
            continue;
        };

        match rows.last() {
            Some(previous) if time < previous.time => {
                let dropped = ScenarioWarning::OutOfOrderRow {
                    index,
                    text: group.to_string(),
                    time,
                    previous: previous.time,
                };
                warn!("{dropped}");
                warnings.push(dropped);
            }
            _ => {
                fields.remove(0);
                rows.push(Row { time, fields });
            }
        }
    }

    rows
}

/// Policies named by the interpolation text, or `None` if no text was given.
fn interpolation_tokens(interpolation: &str) -> Option<Vec<Interpolation>> {
    let inner = strip_brackets(interpolation);
    if inner.trim().is_empty() {
        return None;
    }
    Some(
        split_fields(inner)
            .iter()
            .skip(1)
            .map(|token| Interpolation::from_token_or_default(token))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 1000;

    #[test]
    fn carry_forward_and_axis() {
        let parsed = parse("[0;0;0][1;4;5][2;3;3][2.5;;4][3;4;3]", "[;L;ZOH]", MAX);
        assert!(parsed.warnings.is_empty());

        let series = parsed.series;
        assert_eq!(series.time_axis(), &[0.0, 1.0, 2.0, 2.5, 3.0]);
        assert_eq!(series.columns()[0].values(), &[0.0, 4.0, 3.0, 3.0, 4.0]);
        assert_eq!(series.columns()[1].values(), &[0.0, 5.0, 3.0, 4.0, 3.0]);
        assert_eq!(series.columns()[0].interpolation(), Interpolation::Linear);
        assert_eq!(series.columns()[1].interpolation(), Interpolation::ZeroOrderHold);
    }

    #[test]
    fn missing_values_are_not_zero() {
        let series = parse("[0;1][1;][2;abc][3;7]", "", MAX).series;
        assert_eq!(series.columns()[0].values(), &[1.0, 1.0, 1.0, 7.0]);
    }

    #[test]
    fn narrow_rows_leave_trailing_columns_unspecified() {
        let series = parse("[0;1;2][1;3][2;4;5]", "", MAX).series;
        assert_eq!(series.num_columns(), 2);
        assert_eq!(series.columns()[1].values(), &[2.0, 2.0, 5.0]);
    }

    #[test]
    fn first_sample_is_tracked() {
        let series = parse("[0;1;][5;2;9]", "", MAX).series;
        assert_eq!(series.columns()[0].first_sample(), Some(0));
        assert_eq!(series.columns()[1].first_sample(), Some(1));
        assert_eq!(series.columns()[1].values(), &[0.0, 9.0]);

        let series = parse("[0;;1][1;;2]", "", MAX).series;
        assert_eq!(series.columns()[0].first_sample(), None);
    }

    #[test]
    fn malformed_row_is_dropped_alone() {
        let parsed = parse("[0;1][x;100][2;3]", "", MAX);
        assert_eq!(parsed.series.time_axis(), &[0.0, 2.0]);
        assert_eq!(parsed.series.columns()[0].values(), &[1.0, 3.0]);
        assert_eq!(
            parsed.warnings,
            vec![ScenarioWarning::MalformedRow {
                index: 1,
                text: "x;100".to_string()
            }]
        );
        assert_eq!(parsed.status(), Status::Warning);
    }

    #[test]
    fn malformed_row_does_not_widen() {
        let parsed = parse("[0;1][;1;2;3]", "", MAX);
        assert_eq!(parsed.series.num_columns(), 1);
    }

    #[test]
    fn out_of_order_row_is_dropped() {
        let parsed = parse("[0;1][2;2][1;3][2;4]", "", MAX);
        assert_eq!(parsed.series.time_axis(), &[0.0, 2.0, 2.0]);
        assert!(matches!(
            parsed.warnings.as_slice(),
            [ScenarioWarning::OutOfOrderRow { index: 2, .. }]
        ));
    }

    #[test]
    fn columns_are_capped() {
        let series = parse("[0;1;2;3][1;4;5;6]", "", 2).series;
        assert_eq!(series.num_columns(), 2);
        assert_eq!(series.columns()[1].values(), &[2.0, 5.0]);
    }

    #[test]
    fn capped_columns_keep_matching_tokens() {
        let parsed = parse("[0;1;2;3][1;2;3;4]", "[;ZOH;NN]", 2);
        assert!(parsed.warnings.is_empty());
        let policies: Vec<_> = parsed
            .series
            .columns()
            .iter()
            .map(|c| c.interpolation())
            .collect();
        assert_eq!(
            policies,
            vec![Interpolation::ZeroOrderHold, Interpolation::NearestNeighbor]
        );
    }

    #[test]
    fn capped_columns_still_report_mismatch() {
        let parsed = parse("[0;1;2;3][1;2;3;4]", "[;ZOH;NN;L]", 2);
        assert_eq!(
            parsed.warnings,
            vec![ScenarioWarning::ColumnCountMismatch {
                tokens: 3,
                columns: 2
            }]
        );
        assert_eq!(parsed.series.num_columns(), 2);
    }

    #[test]
    fn token_mismatch_defaults_every_column() {
        let parsed = parse("[0;1;2][1;2;3]", "[;ZOH;NN;ZOH]", MAX);
        assert_eq!(
            parsed.warnings,
            vec![ScenarioWarning::ColumnCountMismatch {
                tokens: 3,
                columns: 2
            }]
        );
        assert!(
            parsed
                .series
                .columns()
                .iter()
                .all(|c| c.interpolation() == Interpolation::DEFAULT)
        );
    }

    #[test]
    fn fewer_tokens_bound_the_columns() {
        let parsed = parse("[0;1;2;3][1;2;3;4]", "[;ZOH;ZOH]", MAX);
        assert_eq!(parsed.series.num_columns(), 2);
        assert!(
            parsed
                .series
                .columns()
                .iter()
                .all(|c| c.interpolation() == Interpolation::DEFAULT)
        );
    }

    #[test]
    fn empty_tokens_use_default() {
        let series = parse("[0;1;2;3]", "[;;nn;bogus]", MAX).series;
        let policies: Vec<_> = series.columns().iter().map(|c| c.interpolation()).collect();
        assert_eq!(
            policies,
            vec![
                Interpolation::DEFAULT,
                Interpolation::NearestNeighbor,
                Interpolation::DEFAULT
            ]
        );
    }

    #[test]
    fn empty_scenario_is_missing_input() {
        let parsed = parse("  ", "[;L]", MAX);
        assert_eq!(parsed.warnings, vec![ScenarioWarning::MissingInput]);
        assert_eq!(parsed.series.num_columns(), 0);
    }

    #[test]
    fn no_groups_is_empty_but_not_missing() {
        let parsed = parse("no brackets here", "", MAX);
        assert!(parsed.warnings.is_empty());
        assert!(parsed.series.is_empty());
    }
}
