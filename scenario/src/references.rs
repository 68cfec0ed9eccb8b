//! Value reference addressing.
//!
//! FMI hosts address every parameter and output of an instance by a small integer.
//! All of that addressing goes through [REFERENCES]; nothing else in the workspace does
//! arithmetic on reference numbers.

pub type ValueReference = u32;

/// Upper bound on the number of output columns an instance exposes.
pub const MAX_OUTPUTS: usize = 1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Raw scenario text, `[t;v1;v2;...]...`.
    ScenarioText,
    /// Raw interpolation text, `[;tok1;tok2;...]`.
    InterpolationText,
}

impl Parameter {
    /// Variable name used in model descriptions and parameter sets.
    pub const fn name(self) -> &'static str {
        match self {
            Parameter::ScenarioText => "scenario_input",
            Parameter::InterpolationText => "interpolation",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variable {
    Parameter(Parameter),
    /// Zero-based output column.
    Output(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReferenceTable {
    parameters: &'static [(ValueReference, Parameter)],
    first_output: ValueReference,
    max_outputs: usize,
}

pub const REFERENCES: ReferenceTable = ReferenceTable {
    parameters: &[
        (0, Parameter::ScenarioText),
        (1, Parameter::InterpolationText),
    ],
    first_output: 2,
    max_outputs: MAX_OUTPUTS,
};

impl ReferenceTable {
    pub fn resolve(&self, reference: ValueReference) -> Option<Variable> {
        if let Some((_, parameter)) = self.parameters.iter().find(|(r, _)| *r == reference) {
            return Some(Variable::Parameter(*parameter));
        }
        let column = reference.checked_sub(self.first_output)? as usize;
        (column < self.max_outputs).then_some(Variable::Output(column))
    }

    pub fn reference_of(&self, variable: Variable) -> Option<ValueReference> {
        match variable {
            Variable::Parameter(parameter) => self
                .parameters
                .iter()
                .find(|(_, p)| *p == parameter)
                .map(|(r, _)| *r),
            Variable::Output(column) if column < self.max_outputs => {
                Some(self.first_output + column as ValueReference)
            }
            Variable::Output(_) => None,
        }
    }

    pub fn parameters(&self) -> &'static [(ValueReference, Parameter)] {
        self.parameters
    }

    pub fn first_output(&self) -> ValueReference {
        self.first_output
    }

    pub fn max_outputs(&self) -> usize {
        self.max_outputs
    }
}
