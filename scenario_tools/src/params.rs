use crate::xml::XmlWriter;
use crate::{ScenarioSource, write_output};
use anyhow::{Result, bail};
use clap::Args;
use scenario::references::{Parameter, REFERENCES};
use std::path::PathBuf;

const SSV_NAMESPACE: &str = "http://ssp-standard.org/SSP1/ParameterValues";

#[derive(Args, Debug)]
pub struct ParamsArgs {
    #[command(flatten)]
    pub source: ScenarioSource,

    /// Name of the parameter set
    #[arg(long, default_value = "Default")]
    pub name: String,

    /// Output file; stdout if omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// An SSP 1.0 parameter set (`.ssv`) holding string parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSet {
    pub name: String,
    pub strings: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new(name: impl Into<String>) -> Self {
        ParameterSet {
            name: name.into(),
            strings: Vec::new(),
        }
    }

    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.push((name.into(), value.into()));
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::new();
        xml.open(
            "ssv:ParameterSet",
            &[
                ("xmlns:ssv", SSV_NAMESPACE),
                ("version", "1.0"),
                ("name", self.name.as_str()),
            ],
        );
        xml.open("ssv:Parameters", &[]);
        for (name, value) in &self.strings {
            xml.open("ssv:Parameter", &[("name", name.as_str())]);
            xml.empty("ssv:String", &[("value", value.as_str())]);
            xml.close();
        }
        xml.finish()
    }
}

/// A parameter set with whichever of the two scenario parameters are given.
pub fn parameter_set(args: &ParamsArgs) -> Result<ParameterSet> {
    let scenario = args.source.scenario_text()?;
    let interpolation = args.source.interpolation_text();
    if scenario.is_none() && interpolation.is_none() {
        bail!("nothing to write: give a scenario, an interpolation, or both");
    }

    let mut set = ParameterSet::new(&args.name);
    for (_, parameter) in REFERENCES.parameters() {
        let value = match parameter {
            Parameter::ScenarioText => &scenario,
            Parameter::InterpolationText => &interpolation,
        };
        if let Some(value) = value {
            set = set.with_string(parameter.name(), value);
        }
    }
    Ok(set)
}

pub fn run(args: ParamsArgs) -> Result<()> {
    let set = parameter_set(&args)?;
    write_output(args.output.as_deref(), &set.to_xml())
}
