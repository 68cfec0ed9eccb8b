//! # Scenario
//!
//! A signal source for co-simulation. A scenario is written as compact text, one bracket
//! group per sample time, and each output column is reconstructed between samples with
//! its own interpolation policy:
//!
//! ```text
//! scenario:       [0;0;0][1;4;5][2;3;3][2.5;;4][3;4;3]
//! interpolation:  [;L;ZOH]
//! ```
//!
//! The first field of each group is the time; the rest are column values. An empty field
//! means the column has no new sample at that time, so it keeps its last value. The
//! interpolation text names one policy per column (`L`, `ZOH` or `NN`) after an ignored
//! time slot.
//!
//! ## Evaluating
//!
//! ```
//! use scenario::{Signals, parse};
//!
//! let parsed = parse("[0;0;0][1;4;5][2;3;3][2.5;;4][3;4;3]", "[;L;ZOH]", 1000);
//! assert!(parsed.warnings.is_empty());
//!
//! let mut signals = Signals::new(parsed.series);
//! assert_eq!(signals.value_at(0, 1.5), Some(3.5));
//! assert_eq!(signals.value_at(1, 1.5), Some(5.0));
//! // Past the end, the last value holds.
//! assert_eq!(signals.value_at(0, 5.5), Some(4.0));
//! ```
//!
//! Queries may jump around in time. Each column remembers where its last lookup landed,
//! which makes the common case of a host stepping forward constant-time, but results
//! never depend on that memory.
//!
//! ## Instances
//!
//! [Instance] is the state behind one co-simulation component: the raw parameter text,
//! the parsed [Signals], and the current time. The `scenario_fmu` crate exposes it
//! through the FMI 2.0 C interface; value references are resolved through
//! [REFERENCES][references::REFERENCES].
//!
//! ## Diagnostics
//!
//! Nothing in a scenario is fatal. Bad groups are dropped, bad values are treated as
//! missing, and mismatched interpolation text falls back on [Interpolation::DEFAULT].
//! Each of these is reported as a [ScenarioWarning] and logged through `tracing`.

pub mod config;
pub mod diagnostics;
pub mod eval;
pub mod instance;
pub mod interpolation;
pub mod parse;
pub mod references;
pub mod series;
pub mod text;

pub use config::EngineConfig;
pub use diagnostics::{ScenarioWarning, Status};
pub use eval::eval;
pub use instance::Instance;
pub use interpolation::Interpolation;
pub use parse::{Parsed, parse};
pub use references::{MAX_OUTPUTS, ValueReference};
pub use series::{Column, SearchHints, Signals, TimeSeriesSet};
