use crate::xml::XmlWriter;
use crate::{ScenarioSource, write_output};
use anyhow::{Result, ensure};
use clap::Args;
use scenario::references::{Parameter, REFERENCES, Variable};
use scenario::{MAX_OUTPUTS, parse};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Shared library name of the FMU, which FMI calls the model identifier.
pub const MODEL_IDENTIFIER: &str = "scenario_fmu";

/// What goes into a model description. Shared by `describe` and `package`.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Number of real outputs. Defaults to the number of columns in the scenario.
    #[arg(short = 'n', long)]
    pub outputs: Option<usize>,

    #[command(flatten)]
    pub source: ScenarioSource,

    #[arg(long, default_value = "scenario")]
    pub model_name: String,

    /// GUID to embed. A random one is generated if not given.
    #[arg(long)]
    pub guid: Option<String>,

    #[arg(long, default_value = "0.1.0")]
    pub model_version: String,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Output file; stdout if omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// The contents of a `modelDescription.xml` for the scenario FMU.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelDescription {
    pub model_name: String,
    pub guid: String,
    pub version: String,
    pub outputs: usize,
    pub scenario: Option<String>,
    pub interpolation: Option<String>,
}

impl ModelDescription {
    pub fn to_xml(&self) -> String {
        let mut xml = XmlWriter::new();
        xml.open(
            "fmiModelDescription",
            &[
                ("fmiVersion", "2.0"),
                ("modelName", self.model_name.as_str()),
                ("guid", self.guid.as_str()),
                ("version", self.version.as_str()),
                ("generationTool", "scenario-tools"),
                ("variableNamingConvention", "flat"),
                ("numberOfEventIndicators", "0"),
            ],
        );
        xml.empty(
            "CoSimulation",
            &[
                ("modelIdentifier", MODEL_IDENTIFIER),
                ("canHandleVariableCommunicationStepSize", "true"),
                ("canInterpolateInputs", "false"),
                ("needsExecutionTool", "false"),
                ("canBeInstantiatedOnlyOncePerProcess", "false"),
                ("canNotUseMemoryManagementFunctions", "true"),
                ("canGetAndSetFMUstate", "false"),
                ("canSerializeFMUstate", "false"),
                ("providesDirectionalDerivative", "false"),
            ],
        );
        xml.empty("DefaultExperiment", &[("startTime", "0.0")]);

        xml.open("ModelVariables", &[]);
        for (reference, parameter) in REFERENCES.parameters() {
            let start = match parameter {
                Parameter::ScenarioText => self.scenario.as_deref(),
                Parameter::InterpolationText => self.interpolation.as_deref(),
            };
            let reference = reference.to_string();
            xml.open(
                "ScalarVariable",
                &[
                    ("name", parameter.name()),
                    ("valueReference", reference.as_str()),
                    ("causality", "parameter"),
                    ("variability", "tunable"),
                ],
            );
            match start {
                Some(start) => xml.empty("String", &[("start", start)]),
                None => xml.empty("String", &[]),
            }
            xml.close();
        }
        for column in 0..self.outputs {
            let name = format!("y{}", column + 1);
            let reference = REFERENCES
                .reference_of(Variable::Output(column))
                .map(|r| r.to_string())
                .unwrap_or_default();
            xml.open(
                "ScalarVariable",
                &[
                    ("name", name.as_str()),
                    ("valueReference", reference.as_str()),
                    ("causality", "output"),
                    ("variability", "continuous"),
                ],
            );
            xml.empty("Real", &[]);
            xml.close();
        }
        xml.close();

        // Indices into ModelVariables are 1-based, and the outputs follow the parameters.
        let first_output_index = REFERENCES.parameters().len() + 1;
        xml.open("ModelStructure", &[]);
        xml.open("Outputs", &[]);
        for column in 0..self.outputs {
            let index = (first_output_index + column).to_string();
            xml.empty("Unknown", &[("index", index.as_str())]);
        }
        xml.close();
        xml.close();

        xml.finish()
    }
}

pub fn describe(args: &ModelArgs) -> Result<ModelDescription> {
    let scenario = args.source.scenario_text()?;
    let interpolation = args.source.interpolation_text();

    let outputs = match (args.outputs, &scenario) {
        (Some(outputs), _) => outputs,
        (None, Some(text)) => {
            let parsed = parse(text, interpolation.as_deref().unwrap_or(""), MAX_OUTPUTS);
            for warning in &parsed.warnings {
                tracing::warn!("{warning}");
            }
            parsed.series.num_columns()
        }
        (None, None) => anyhow::bail!("give either --outputs or a scenario to count columns from"),
    };
    ensure!(
        outputs <= MAX_OUTPUTS,
        "{outputs} outputs requested, at most {MAX_OUTPUTS} are addressable"
    );

    Ok(ModelDescription {
        model_name: args.model_name.clone(),
        guid: args
            .guid
            .clone()
            .unwrap_or_else(|| format!("{{{}}}", Uuid::new_v4())),
        version: args.model_version.clone(),
        outputs,
        scenario,
        interpolation,
    })
}

pub fn run(args: DescribeArgs) -> Result<()> {
    let description = describe(&args.model)?;
    info!(
        outputs = description.outputs,
        guid = %description.guid,
        "generated model description"
    );
    write_output(args.output.as_deref(), &description.to_xml())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(scenario: Option<&str>, outputs: Option<usize>) -> ModelArgs {
        ModelArgs {
            outputs,
            source: ScenarioSource {
                scenario: scenario.map(str::to_string),
                interpolation: Some("[;L;ZOH]".to_string()),
                ..Default::default()
            },
            model_name: "scenario".to_string(),
            guid: Some("{1234}".to_string()),
            model_version: "0.1.0".to_string(),
        }
    }

    #[test]
    fn counts_columns_from_the_scenario() {
        let description = describe(&args(Some("[0;0;0][1;4;5]"), None)).unwrap();
        assert_eq!(description.outputs, 2);
        assert_eq!(description.guid, "{1234}");
    }

    #[test]
    fn explicit_outputs_win() {
        let description = describe(&args(Some("[0;0;0][1;4;5]"), Some(5))).unwrap();
        assert_eq!(description.outputs, 5);
    }

    #[test]
    fn needs_something_to_count() {
        assert!(describe(&args(None, None)).is_err());
        assert!(describe(&args(None, Some(MAX_OUTPUTS + 1))).is_err());
    }

    #[test]
    fn generated_guid_is_braced() {
        let mut args = args(None, Some(1));
        args.guid = None;
        let guid = describe(&args).unwrap().guid;
        assert!(guid.starts_with('{') && guid.ends_with('}'));
        assert_eq!(guid.len(), 38);
    }

    #[test]
    fn variables_and_structure() {
        let xml = describe(&args(Some("[0;0;0][1;4;5]"), None))
            .unwrap()
            .to_xml();

        assert!(xml.contains(r#"<CoSimulation modelIdentifier="scenario_fmu""#));
        assert!(xml.contains(
            r#"<ScalarVariable name="scenario_input" valueReference="0" causality="parameter" variability="tunable">"#
        ));
        assert!(xml.contains(r#"<String start="[0;0;0][1;4;5]"/>"#));
        assert!(xml.contains(r#"<String start="[;L;ZOH]"/>"#));
        assert!(xml.contains(r#"<ScalarVariable name="y1" valueReference="2" causality="output""#));
        assert!(xml.contains(r#"<ScalarVariable name="y2" valueReference="3" causality="output""#));
        assert!(!xml.contains(r#"name="y3""#));
        assert!(xml.contains(r#"<Unknown index="3"/>"#));
        assert!(xml.contains(r#"<Unknown index="4"/>"#));
        assert!(xml.ends_with("</fmiModelDescription>\n"));
    }
}
