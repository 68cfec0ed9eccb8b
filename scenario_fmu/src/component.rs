use crate::fmi2::fmi2String;
use crate::logger::{self, LogSink};
use parking_lot::Mutex;
use scenario::{EngineConfig, Instance, Status, ValueReference};
use std::ffi::CString;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Dispatch, error};

/// Where a component is in the co-simulation lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Instantiated,
    InitializationMode,
    StepComplete,
    Terminated,
}

/// What `fmi2Instantiate` hands back to the host as an opaque pointer.
///
/// The host may call in from any thread, but never concurrently for one component. The
/// lock makes that assumption checked rather than trusted.
pub struct Component {
    name: String,
    logging_on: Arc<AtomicBool>,
    dispatch: Dispatch,
    state: Mutex<State>,
}

impl Component {
    pub fn new(name: &str, sink: impl LogSink, logging_on: bool, config: EngineConfig) -> Self {
        let logging_on = Arc::new(AtomicBool::new(logging_on));
        Component {
            name: name.to_string(),
            dispatch: logger::dispatch(sink, logging_on.clone()),
            logging_on,
            state: Mutex::new(State::new(config)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_logging(&self, on: bool) {
        self.logging_on.store(on, Ordering::Relaxed);
    }

    /// Runs `f` with this component's logger installed, outside the lock.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Runs `f` on the locked state with this component's logger installed.
    ///
    /// A panic inside `f` is logged and turned into `on_panic`.
    pub fn call<R>(&self, function: &'static str, on_panic: R, f: impl FnOnce(&mut State) -> R) -> R {
        self.in_scope(|| {
            let mut state = self.state.lock();
            match catch_unwind(AssertUnwindSafe(|| f(&mut state))) {
                Ok(result) => result,
                Err(payload) => {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .copied()
                        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                        .unwrap_or("unknown");
                    error!(function, reason, "panicked");
                    on_panic
                }
            }
        })
    }
}

/// Everything behind the lock.
pub struct State {
    instance: Instance,
    phase: Phase,
    /// Backing storage for the last `fmi2GetString`.
    strings: Vec<CString>,
}

impl State {
    fn new(config: EngineConfig) -> Self {
        State {
            instance: Instance::new(config),
            phase: Phase::Instantiated,
            strings: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    fn allowed(&self, function: &'static str, phases: &[Phase]) -> Result<(), Status> {
        if phases.contains(&self.phase) {
            Ok(())
        } else {
            error!(function, phase = ?self.phase, "not allowed in this phase");
            Err(Status::Error)
        }
    }

    pub fn setup_experiment(&mut self, start_time: f64) -> Status {
        if let Err(status) = self.allowed("fmi2SetupExperiment", &[Phase::Instantiated]) {
            return status;
        }
        self.instance.setup_experiment(start_time);
        Status::Ok
    }

    pub fn enter_initialization_mode(&mut self) -> Status {
        if let Err(status) = self.allowed("fmi2EnterInitializationMode", &[Phase::Instantiated]) {
            return status;
        }
        self.phase = Phase::InitializationMode;
        Status::Ok
    }

    pub fn exit_initialization_mode(&mut self) -> Status {
        if let Err(status) =
            self.allowed("fmi2ExitInitializationMode", &[Phase::InitializationMode])
        {
            return status;
        }
        self.phase = Phase::StepComplete;
        self.instance.exit_initialization()
    }

    pub fn terminate(&mut self) -> Status {
        if let Err(status) = self.allowed(
            "fmi2Terminate",
            &[Phase::InitializationMode, Phase::StepComplete],
        ) {
            return status;
        }
        self.phase = Phase::Terminated;
        Status::Ok
    }

    /// Back to [Phase::Instantiated] with no parameters set. Allowed from anywhere.
    pub fn reset(&mut self) -> Status {
        self.instance.reset();
        self.strings.clear();
        self.phase = Phase::Instantiated;
        Status::Ok
    }

    pub fn set_time(&mut self, time: f64) -> Status {
        if let Err(status) = self.allowed(
            "fmi2SetTime",
            &[Phase::Instantiated, Phase::InitializationMode, Phase::StepComplete],
        ) {
            return status;
        }
        self.instance.set_time(time);
        Status::Ok
    }

    pub fn set_strings<'a>(
        &mut self,
        values: impl IntoIterator<Item = (ValueReference, &'a str)>,
    ) -> Status {
        if let Err(status) = self.allowed(
            "fmi2SetString",
            &[Phase::Instantiated, Phase::InitializationMode, Phase::StepComplete],
        ) {
            return status;
        }
        self.instance.set_strings(values)
    }

    /// Fills `out` with pointers into storage that lives until the next call here.
    pub fn get_strings(&mut self, references: &[ValueReference], out: &mut [fmi2String]) -> Status {
        let mut status = Status::Ok;
        self.strings.clear();
        for reference in references {
            let text = match self.instance.get_string(*reference) {
                Some(text) => text,
                None => {
                    error!(reference, "not a string parameter");
                    status = status.and(Status::Error);
                    ""
                }
            };
            self.strings.push(CString::new(text).unwrap_or_default());
        }
        for (slot, text) in out.iter_mut().zip(&self.strings) {
            *slot = text.as_ptr();
        }
        status
    }

    /// Outputs read 0.0 with a warning until the scenario has been parsed.
    pub fn get_reals(&mut self, references: &[ValueReference], out: &mut [f64]) -> Status {
        self.instance.get_reals(references, out)
    }

    pub fn do_step(&mut self, communication_point: f64, step_size: f64) -> Status {
        if let Err(status) = self.allowed("fmi2DoStep", &[Phase::StepComplete]) {
            return status;
        }
        if step_size < 0.0 || step_size.is_nan() {
            error!(step_size, "negative step size");
            return Status::Error;
        }
        self.instance.do_step(communication_point, step_size)
    }

    /// Time reached by the last completed step.
    pub fn last_successful_time(&self) -> f64 {
        self.instance.time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmi2::fmi2Status;
    use crate::logger::tests::Capture;
    use std::ffi::CStr;

    const SCENARIO: &str = "[0;0;0][1;4;5][2;3;3][2.5;;4][3;4;3]";

    fn component() -> (Component, Capture) {
        let capture = Capture::default();
        let component = Component::new("inst", capture.clone(), false, EngineConfig::default());
        (component, capture)
    }

    #[test]
    fn lifecycle() {
        let (component, _) = component();
        component.call("test", (), |state| {
            assert_eq!(state.set_strings([(0, SCENARIO), (1, "[;L;ZOH]")]), Status::Ok);
            assert_eq!(state.setup_experiment(0.0), Status::Ok);
            assert_eq!(state.enter_initialization_mode(), Status::Ok);
            assert_eq!(state.exit_initialization_mode(), Status::Ok);
            assert_eq!(state.phase(), Phase::StepComplete);

            assert_eq!(state.do_step(1.0, 0.5), Status::Ok);
            let mut out = [0.0; 2];
            assert_eq!(state.get_reals(&[2, 3], &mut out), Status::Ok);
            assert_eq!(out, [3.5, 5.0]);
            assert_eq!(state.last_successful_time(), 1.5);

            assert_eq!(state.terminate(), Status::Ok);
            assert_eq!(state.do_step(1.5, 0.5), Status::Error);
        });
    }

    #[test]
    fn step_before_initialization_is_an_error() {
        let (component, capture) = component();
        let status = component.call("test", Status::Error, |state| state.do_step(0.0, 1.0));
        assert_eq!(status, Status::Error);

        let logged = capture.take();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].0, fmi2Status::fmi2Error);
        assert!(logged[0].2.contains("fmi2DoStep"));
    }

    #[test]
    fn outputs_before_initialization_warn() {
        let (component, capture) = component();
        let mut out = [1.0];
        let status = component.call("test", Status::Error, |state| state.get_reals(&[2], &mut out));
        assert_eq!(status, Status::Warning);
        assert_eq!(out, [0.0]);
        assert_eq!(capture.take()[0].0, fmi2Status::fmi2Warning);
    }

    #[test]
    fn reset_returns_to_instantiated() {
        let (component, _) = component();
        component.call("test", (), |state| {
            state.set_strings([(0, SCENARIO)]);
            state.enter_initialization_mode();
            state.exit_initialization_mode();
            state.terminate();
            assert_eq!(state.reset(), Status::Ok);
            assert_eq!(state.phase(), Phase::Instantiated);
            assert!(!state.instance().is_parsed());
            assert_eq!(state.enter_initialization_mode(), Status::Ok);
        });
    }

    #[test]
    fn strings_read_back() {
        let (component, _) = component();
        component.call("test", (), |state| {
            state.set_strings([(0, SCENARIO)]);
            let mut out = [std::ptr::null(); 3];
            assert_eq!(state.get_strings(&[0, 1, 2], &mut out), Status::Error);
            let read: Vec<&str> = out
                .iter()
                .map(|p| unsafe { CStr::from_ptr(*p) }.to_str().unwrap())
                .collect();
            assert_eq!(read, [SCENARIO, "", ""]);
        });
    }

    #[test]
    fn panics_become_the_fallback() {
        let (component, capture) = component();
        let status = component.call("test", Status::Error, |_| -> Status { panic!("boom") });
        assert_eq!(status, Status::Error);
        assert!(capture.take()[0].2.contains("boom"));

        // The lock is released and the component keeps working.
        let phase = component.call("test", None, |state| Some(state.phase()));
        assert_eq!(phase, Some(Phase::Instantiated));
    }

    #[test]
    fn logging_flag_gates_debug_output() {
        let (component, capture) = component();
        component.call("test", (), |state| {
            state.set_strings([(0, SCENARIO)]);
            state.enter_initialization_mode();
            state.exit_initialization_mode();
        });
        assert!(capture.take().is_empty());

        component.set_logging(true);
        component.call("test", (), |state| {
            state.set_strings([(1, "[;NN;NN]")]);
        });
        let logged = capture.take();
        assert!(!logged.is_empty());
        assert!(logged.iter().all(|(status, _, _)| *status == fmi2Status::fmi2OK));
        assert!(logged.iter().any(|(_, _, message)| message.starts_with("replaced signals")));
    }
}
