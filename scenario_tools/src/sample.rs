use crate::{ScenarioSource, write_output};
use anyhow::{Context, Result, ensure};
use clap::Args;
use scenario::references::{Parameter, REFERENCES, Variable};
use scenario::{EngineConfig, Instance, ValueReference};
use std::fmt::Write;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct SampleArgs {
    #[command(flatten)]
    pub source: ScenarioSource,

    #[arg(long, default_value_t = 0.0)]
    pub start: f64,

    #[arg(long)]
    pub stop: f64,

    #[arg(long, default_value_t = 0.1)]
    pub step: f64,

    /// Output file; stdout if omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Most communication points a single run will produce.
pub const MAX_STEPS: usize = 10_000_000;

/// Output values at each communication point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Samples {
    pub columns: usize,
    pub rows: Vec<(f64, Vec<f64>)>,
}

impl Samples {
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("time");
        for column in 0..self.columns {
            let _ = write!(csv, ",y{}", column + 1);
        }
        csv.push('\n');
        for (time, values) in &self.rows {
            let _ = write!(csv, "{time}");
            for value in values {
                let _ = write!(csv, ",{value}");
            }
            csv.push('\n');
        }
        csv
    }
}

/// Runs an [Instance] the way a co-simulation master would: parameters, initialization,
/// then fixed steps from `start` to `stop`, reading every output after each step.
pub fn sample(
    scenario: &str,
    interpolation: Option<&str>,
    start: f64,
    stop: f64,
    step: f64,
) -> Result<Samples> {
    ensure!(step > 0.0, "step must be positive, got {step}");
    ensure!(stop >= start, "stop ({stop}) is before start ({start})");

    // Communication points are computed from the step count so that rounding does not
    // accumulate over long runs.
    let steps = ((stop - start) / step).round();
    ensure!(
        steps.is_finite() && steps <= MAX_STEPS as f64,
        "{start}..{stop} in steps of {step} is more than {MAX_STEPS} steps"
    );
    let steps = steps as usize;
    let rows_len = steps
        .checked_add(1)
        .context("step count overflows")?;

    let mut instance = Instance::new(EngineConfig::default().with_start_time(start));
    let texts = [
        (Parameter::ScenarioText, Some(scenario)),
        (Parameter::InterpolationText, interpolation),
    ];
    instance.set_strings(texts.into_iter().filter_map(|(parameter, text)| {
        Some((REFERENCES.reference_of(Variable::Parameter(parameter))?, text?))
    }));
    if !instance.exit_initialization().is_ok() {
        warn!(
            warnings = instance.warnings().len(),
            "scenario has problems, sampling what could be parsed"
        );
    }

    let columns = instance.signals().map_or(0, |s| s.num_columns());
    let references: Vec<ValueReference> = (0..columns)
        .filter_map(|c| REFERENCES.reference_of(Variable::Output(c)))
        .collect();

    let mut rows = Vec::with_capacity(rows_len);
    let mut outputs = vec![0.0; references.len()];
    for k in 0..=steps {
        if k > 0 {
            let point = start + (k - 1) as f64 * step;
            instance.do_step(point, step);
        }
        instance.get_reals(&references, &mut outputs);
        rows.push((instance.time(), outputs.clone()));
    }

    Ok(Samples { columns, rows })
}

pub fn run(args: SampleArgs) -> Result<()> {
    let scenario = args.source.scenario_text()?.unwrap_or_default();
    let interpolation = args.source.interpolation_text();
    let samples = sample(
        &scenario,
        interpolation.as_deref(),
        args.start,
        args.stop,
        args.step,
    )?;
    info!(
        columns = samples.columns,
        rows = samples.rows.len(),
        "sampled scenario"
    );
    write_output(args.output.as_deref(), &samples.to_csv())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_steps() {
        let samples = sample(
            "[0;0;0][1;4;5][2;3;3][2.5;;4][3;4;3]",
            Some("[;L;ZOH]"),
            0.0,
            2.0,
            0.5,
        )
        .unwrap();
        assert_eq!(samples.columns, 2);
        assert_eq!(
            samples.rows,
            vec![
                (0.0, vec![0.0, 0.0]),
                (0.5, vec![2.0, 0.0]),
                (1.0, vec![4.0, 5.0]),
                (1.5, vec![3.5, 5.0]),
                (2.0, vec![3.0, 3.0]),
            ]
        );
    }

    #[test]
    fn csv_layout() {
        let samples = sample("[0;1][1;2]", None, 0.0, 1.0, 1.0).unwrap();
        assert_eq!(samples.to_csv(), "time,y1\n0,1\n1,2\n");
    }

    #[test]
    fn bad_ranges() {
        assert!(sample("[0;1]", None, 0.0, 1.0, 0.0).is_err());
        assert!(sample("[0;1]", None, 1.0, 0.0, 0.1).is_err());
        assert!(sample("[0;1]", None, 0.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn too_many_steps() {
        assert!(sample("[0;1]", None, 0.0, 1e300, 1e-300).is_err());
        assert!(sample("[0;1]", None, f64::MIN, f64::MAX, 1.0).is_err());
        assert!(sample("[0;1]", None, 0.0, (MAX_STEPS + 1) as f64, 1.0).is_err());
    }

    #[test]
    fn empty_scenario_has_no_columns() {
        let samples = sample("", None, 0.0, 1.0, 0.5).unwrap();
        assert_eq!(samples.columns, 0);
        assert_eq!(samples.to_csv(), "time\n0\n0.5\n1\n");
    }
}
