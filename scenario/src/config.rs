use crate::references::MAX_OUTPUTS;

/// Per-instance engine settings.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    max_columns: usize,
    start_time: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_columns: MAX_OUTPUTS,
            start_time: 0.0,
        }
    }
}

impl EngineConfig {
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns.min(MAX_OUTPUTS);
        self
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Columns past this are never parsed. Never more than [MAX_OUTPUTS], since
    /// outputs past that have no value reference.
    pub fn max_columns(&self) -> usize {
        self.max_columns.min(MAX_OUTPUTS)
    }

    /// Time an instance starts at when the host does not set up an experiment.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }
}
