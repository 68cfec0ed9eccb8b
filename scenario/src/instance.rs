use crate::config::EngineConfig;
use crate::diagnostics::{ScenarioWarning, Status};
use crate::parse::parse;
use crate::references::{Parameter, REFERENCES, ValueReference, Variable};
use crate::series::Signals;
use tracing::{debug, warn};

/// Everything one component instance owns.
///
/// Raw parameter text is stored verbatim. The first parse happens when the host leaves
/// initialization; after that, any write to either parameter replaces the parsed
/// signals wholesale.
#[derive(Clone, Debug)]
pub struct Instance {
    config: EngineConfig,
    scenario_text: Option<String>,
    interpolation_text: Option<String>,
    signals: Option<Signals>,
    time: f64,
    warnings: Vec<ScenarioWarning>,
}

impl Default for Instance {
    fn default() -> Self {
        Instance::new(EngineConfig::default())
    }
}

impl Instance {
    pub fn new(config: EngineConfig) -> Self {
        Instance {
            config,
            scenario_text: None,
            interpolation_text: None,
            signals: None,
            time: config.start_time(),
            warnings: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current time, as last set by the host.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn signals(&self) -> Option<&Signals> {
        self.signals.as_ref()
    }

    pub fn is_parsed(&self) -> bool {
        self.signals.is_some()
    }

    /// Warnings from the most recent parse.
    pub fn warnings(&self) -> &[ScenarioWarning] {
        &self.warnings
    }

    pub fn setup_experiment(&mut self, start_time: f64) {
        self.time = start_time;
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Writes string parameters. Re-parses once at the end if already initialized.
    pub fn set_strings<'a>(
        &mut self,
        values: impl IntoIterator<Item = (ValueReference, &'a str)>,
    ) -> Status {
        let mut status = Status::Ok;
        let mut changed = false;

        for (reference, value) in values {
            let slot = match REFERENCES.resolve(reference) {
                Some(Variable::Parameter(Parameter::ScenarioText)) => &mut self.scenario_text,
                Some(Variable::Parameter(Parameter::InterpolationText)) => {
                    &mut self.interpolation_text
                }
                _ => {
                    let warning = ScenarioWarning::NotAStringParameter { reference };
                    warn!("{warning}");
                    status = status.and(Status::Warning);
                    continue;
                }
            };
            *slot = Some(value.to_string());
            changed = true;
        }

        if changed && self.is_parsed() {
            status = status.and(self.reparse());
        }
        status
    }

    pub fn set_string(&mut self, reference: ValueReference, value: &str) -> Status {
        self.set_strings([(reference, value)])
    }

    pub fn get_string(&self, reference: ValueReference) -> Option<&str> {
        match REFERENCES.resolve(reference)? {
            Variable::Parameter(Parameter::ScenarioText) => {
                Some(self.scenario_text.as_deref().unwrap_or(""))
            }
            Variable::Parameter(Parameter::InterpolationText) => {
                Some(self.interpolation_text.as_deref().unwrap_or(""))
            }
            Variable::Output(_) => None,
        }
    }

    /// Parses the stored parameters for the first time.
    pub fn exit_initialization(&mut self) -> Status {
        self.reparse()
    }

    fn reparse(&mut self) -> Status {
        let parsed = parse(
            self.scenario_text.as_deref().unwrap_or(""),
            self.interpolation_text.as_deref().unwrap_or(""),
            self.config.max_columns(),
        );
        let status = parsed.status();
        debug!(
            columns = parsed.series.num_columns(),
            samples = parsed.series.time_axis().len(),
            ?status,
            "replaced signals"
        );
        self.warnings = parsed.warnings;
        self.signals = Some(Signals::new(parsed.series));
        status
    }

    /// Advances to `communication_point + step_size`.
    pub fn do_step(&mut self, communication_point: f64, step_size: f64) -> Status {
        self.time = communication_point + step_size;
        Status::Ok
    }

    /// Reads the output at `reference` for the current time. Anything that is not a
    /// parsed output reads 0.0 with a warning.
    pub fn get_real(&mut self, reference: ValueReference) -> (f64, Status) {
        let Some(signals) = self.signals.as_mut() else {
            warn!(reference, "{}", ScenarioWarning::MissingInput);
            return (0.0, Status::Warning);
        };

        let value = match REFERENCES.resolve(reference) {
            Some(Variable::Output(column)) => signals.value_at(column, self.time),
            _ => None,
        };
        match value {
            Some(value) => (value, Status::Ok),
            None => {
                warn!("{}", ScenarioWarning::UnknownReference { reference });
                (0.0, Status::Warning)
            }
        }
    }

    /// Reads one output per reference into `values`. The two slices must have the same
    /// length; if they don't, nothing is written and the call is an error.
    pub fn get_reals(&mut self, references: &[ValueReference], values: &mut [f64]) -> Status {
        if references.len() != values.len() {
            warn!(
                references = references.len(),
                values = values.len(),
                "reference and value counts differ"
            );
            return Status::Error;
        }
        references
            .iter()
            .zip(values.iter_mut())
            .map(|(reference, value)| {
                let (read, status) = self.get_real(*reference);
                *value = read;
                status
            })
            .collect()
    }

    /// Back to the freshly instantiated state, keeping the configuration.
    pub fn reset(&mut self) {
        *self = Instance::new(self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_waits_for_initialization() {
        let mut instance = Instance::default();
        assert_eq!(instance.set_string(0, "[0;1][1;2]"), Status::Ok);
        assert!(!instance.is_parsed());
        assert_eq!(instance.get_real(2), (0.0, Status::Warning));

        assert_eq!(instance.exit_initialization(), Status::Ok);
        assert_eq!(instance.signals().unwrap().num_columns(), 1);
    }

    #[test]
    fn rewrite_after_initialization_reparses() {
        let mut instance = Instance::default();
        instance.set_string(0, "[0;1][1;2]");
        instance.exit_initialization();
        instance.do_step(0.0, 1.0);
        assert_eq!(instance.get_real(2), (2.0, Status::Ok));

        instance.set_string(0, "[0;5][1;6][2;7]");
        assert_eq!(instance.get_real(2), (6.0, Status::Ok));
        assert_eq!(instance.signals().unwrap().series().time_axis().len(), 3);
    }

    #[test]
    fn missing_input_is_a_warning() {
        let mut instance = Instance::default();
        assert_eq!(instance.exit_initialization(), Status::Warning);
        assert_eq!(instance.warnings(), &[ScenarioWarning::MissingInput]);
        assert_eq!(instance.get_real(2), (0.0, Status::Warning));
    }

    #[test]
    fn strings_to_outputs_are_rejected() {
        let mut instance = Instance::default();
        assert_eq!(instance.set_string(2, "[0;1]"), Status::Warning);
        assert_eq!(instance.get_string(0), Some(""));
        assert_eq!(instance.get_string(2), None);
    }

    #[test]
    fn get_reals_rejects_mismatched_lengths() {
        let mut instance = Instance::default();
        instance.set_string(0, "[0;1;2]");
        instance.exit_initialization();

        let mut values = [9.0; 1];
        assert_eq!(instance.get_reals(&[2, 3], &mut values), Status::Error);
        assert_eq!(values, [9.0]);

        let mut values = [0.0; 2];
        assert_eq!(instance.get_reals(&[2, 3], &mut values), Status::Ok);
        assert_eq!(values, [1.0, 2.0]);
    }

    #[test]
    fn reset_clears_parameters() {
        let config = EngineConfig::default().with_start_time(3.0);
        let mut instance = Instance::new(config);
        instance.set_string(1, "[;ZOH]");
        instance.do_step(3.0, 1.0);
        instance.reset();
        assert_eq!(instance.time(), 3.0);
        assert_eq!(instance.get_string(1), Some(""));
        assert!(!instance.is_parsed());
    }
}
