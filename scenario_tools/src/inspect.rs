use crate::{ScenarioSource, write_output};
use anyhow::{Context, Result};
use clap::Args;
use scenario::{EngineConfig, TimeSeriesSet, parse};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: ScenarioSource,

    /// Parse at most this many columns
    #[arg(long)]
    pub max_columns: Option<usize>,

    /// Output file; stdout if omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// What the engine makes of a scenario.
#[derive(Debug, Serialize)]
pub struct Report {
    pub config: EngineConfig,
    pub columns: usize,
    pub samples: usize,
    pub series: TimeSeriesSet,
    pub warnings: Vec<String>,
}

pub fn inspect(scenario: &str, interpolation: &str, config: EngineConfig) -> Report {
    let parsed = parse(scenario, interpolation, config.max_columns());
    Report {
        config,
        columns: parsed.series.num_columns(),
        samples: parsed.series.time_axis().len(),
        warnings: parsed.warnings.iter().map(ToString::to_string).collect(),
        series: parsed.series,
    }
}

pub fn run(args: InspectArgs) -> Result<()> {
    let mut config = EngineConfig::default();
    if let Some(max_columns) = args.max_columns {
        config = config.with_max_columns(max_columns);
    }
    let scenario = args.source.scenario_text()?.unwrap_or_default();
    let interpolation = args.source.interpolation_text().unwrap_or_default();

    let report = inspect(&scenario, &interpolation, config);
    let mut json = serde_json::to_string_pretty(&report).context("serializing report")?;
    json.push('\n');
    write_output(args.output.as_deref(), &json)
}
