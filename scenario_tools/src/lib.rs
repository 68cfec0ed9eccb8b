//! Authoring utilities for scenario FMUs.
//!
//! Each subcommand of `scenario-tools` lives in its own module with a clap argument
//! struct, a `run` entry point, and the plain functions behind it.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

pub mod describe;
pub mod inspect;
pub mod package;
pub mod params;
pub mod sample;
mod xml;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,scenario_tools=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Where the scenario and interpolation text come from.
#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioSource {
    /// Scenario text, e.g. "[0;0;0][1;4;5]"
    #[arg(long, conflicts_with = "scenario_file")]
    pub scenario: Option<String>,

    /// File holding the scenario text
    #[arg(long)]
    pub scenario_file: Option<PathBuf>,

    /// Interpolation text, e.g. "[;L;ZOH]"
    #[arg(long)]
    pub interpolation: Option<String>,
}

impl ScenarioSource {
    pub fn scenario_text(&self) -> Result<Option<String>> {
        match (&self.scenario, &self.scenario_file) {
            (Some(text), _) => Ok(Some(text.clone())),
            (None, Some(path)) => fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("reading scenario from {}", path.display())),
            (None, None) => Ok(None),
        }
    }

    pub fn interpolation_text(&self) -> Option<String> {
        self.interpolation.clone()
    }
}

/// Writes `contents` to `path`, or to stdout when there is no path.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
