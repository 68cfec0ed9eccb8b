//! # Scenario FMU
//!
//! The FMI 2.0 co-simulation interface for [scenario]. Building this crate produces a
//! shared library exporting every `fmi2*` function, ready to be zipped into an FMU next
//! to a `modelDescription.xml` (see `scenario-tools describe`).
//!
//! The model has two string parameters and up to [MAX_OUTPUTS][scenario::MAX_OUTPUTS]
//! real outputs:
//!
//! | value reference | variable          |
//! |-----------------|-------------------|
//! | 0               | `scenario_input`  |
//! | 1               | `interpolation`   |
//! | 2..             | `y1`, `y2`, ...   |
//!
//! Parameters are parsed when the host leaves initialization mode, and again whenever
//! the host rewrites one of them afterwards. Outputs are evaluated at the time reached by
//! the last `fmi2DoStep`.
//!
//! ## Logging
//!
//! Each component installs its own `tracing` dispatcher for the duration of every call,
//! forwarding events to the host's logger callback. Warnings and errors are always
//! forwarded; everything else only while debug logging is on.
//!
//! Model exchange is not supported. Its functions exist so that the library links
//! against hosts that expect the full API, but `fmi2Instantiate` refuses to create a
//! model-exchange component.

pub mod api;
pub mod component;
pub mod fmi2;
pub mod logger;

pub use api::*;
pub use component::{Component, Phase};
