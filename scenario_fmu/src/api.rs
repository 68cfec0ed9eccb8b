//! The exported `fmi2*` symbols.
//!
//! Each function checks its pointers, then hands off to [Component::call]. Nothing here
//! panics across the boundary: a panic inside a call becomes `fmi2Fatal`.

#![allow(non_snake_case)]

use crate::component::{Component, State};
use crate::fmi2::*;
use crate::logger::{CATEGORY_ALL, CATEGORY_ERROR, CATEGORY_WARNING, CallbackSink};
use scenario::EngineConfig;
use std::borrow::Cow;
use std::ffi::{CStr, c_char, c_int};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, error, warn};

/// # Safety
/// `pointer` is null or a NUL-terminated string.
unsafe fn text<'a>(pointer: fmi2String) -> Cow<'a, str> {
    if pointer.is_null() {
        Cow::Borrowed("")
    } else {
        unsafe { CStr::from_ptr(pointer) }.to_string_lossy()
    }
}

/// # Safety
/// `pointer` is null or points to `len` readable values.
unsafe fn slice<'a, T>(pointer: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        Some(&[])
    } else if pointer.is_null() {
        None
    } else {
        Some(unsafe { std::slice::from_raw_parts(pointer, len) })
    }
}

/// # Safety
/// `pointer` is null or points to `len` writable values.
unsafe fn slice_mut<'a, T>(pointer: *mut T, len: usize) -> Option<&'a mut [T]> {
    if len == 0 {
        Some(&mut [])
    } else if pointer.is_null() {
        None
    } else {
        Some(unsafe { std::slice::from_raw_parts_mut(pointer, len) })
    }
}

/// Runs `f` against the component behind `c`, or fails if there is none.
///
/// # Safety
/// `c` is null or a pointer returned by [fmi2Instantiate] and not yet freed.
unsafe fn with_component(
    c: fmi2Component,
    function: &'static str,
    f: impl FnOnce(&mut State) -> fmi2Status,
) -> fmi2Status {
    match unsafe { (c as *const Component).as_ref() } {
        Some(component) => component.call(function, fmi2Status::fmi2Fatal, f),
        None => fmi2Status::fmi2Error,
    }
}

fn null_argument(function: &'static str) -> fmi2Status {
    error!(function, "null array argument");
    fmi2Status::fmi2Error
}

fn no_variables_of_type(function: &'static str, count: usize) -> fmi2Status {
    if count == 0 {
        fmi2Status::fmi2OK
    } else {
        error!(function, count, "no variables of this type");
        fmi2Status::fmi2Error
    }
}

fn unsupported(function: &'static str) -> fmi2Status {
    error!(function, "not supported");
    fmi2Status::fmi2Error
}

// Inquire platform and version

#[unsafe(no_mangle)]
pub extern "C" fn fmi2GetTypesPlatform() -> *const c_char {
    fmi2TypesPlatform.as_ptr()
}

#[unsafe(no_mangle)]
pub extern "C" fn fmi2GetVersion() -> *const c_char {
    fmi2Version.as_ptr()
}

// Creation and destruction

/// # Safety
/// String arguments are null or NUL-terminated. `functions` is null or points to a
/// valid callback table.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2Instantiate(
    instanceName: fmi2String,
    fmuType: c_int,
    fmuGUID: fmi2String,
    _fmuResourceLocation: fmi2String,
    functions: *const fmi2CallbackFunctions,
    _visible: fmi2Boolean,
    loggingOn: fmi2Boolean,
) -> fmi2Component {
    let callbacks = unsafe { functions.as_ref() }.copied().unwrap_or_default();
    let name = unsafe { text(instanceName) }.into_owned();
    let guid = unsafe { text(fmuGUID) }.into_owned();

    let created = catch_unwind(AssertUnwindSafe(|| {
        let sink = CallbackSink::new(callbacks.logger, callbacks.componentEnvironment, &name);
        let component = Component::new(&name, sink, loggingOn != fmi2False, EngineConfig::default());
        if fmi2Type::from_raw(fmuType) != Some(fmi2Type::fmi2CoSimulation) {
            component.in_scope(|| error!(fmuType, "only co-simulation is supported"));
            return None;
        }
        component.in_scope(|| debug!(instance = component.name(), guid = %guid, "instantiated"));
        Some(Box::new(component))
    }));

    match created {
        Ok(Some(component)) => Box::into_raw(component) as fmi2Component,
        _ => std::ptr::null_mut(),
    }
}

/// # Safety
/// `c` is null or a pointer returned by [fmi2Instantiate] and not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2FreeInstance(c: fmi2Component) {
    if !c.is_null() {
        drop(unsafe { Box::from_raw(c as *mut Component) });
    }
}

/// # Safety
/// As [fmi2FreeInstance], and `categories` points to `nCategories` strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetDebugLogging(
    c: fmi2Component,
    loggingOn: fmi2Boolean,
    nCategories: usize,
    categories: *const fmi2String,
) -> fmi2Status {
    let Some(component) = (unsafe { (c as *const Component).as_ref() }) else {
        return fmi2Status::fmi2Error;
    };
    component.set_logging(loggingOn != fmi2False);

    let Some(categories) = (unsafe { slice(categories, nCategories) }) else {
        return component.in_scope(|| null_argument("fmi2SetDebugLogging"));
    };
    let mut status = fmi2Status::fmi2OK;
    for category in categories {
        let category = unsafe { text(*category) };
        if ![CATEGORY_ALL, CATEGORY_ERROR, CATEGORY_WARNING].contains(&category.as_ref()) {
            component.in_scope(|| warn!(%category, "unknown log category"));
            status = fmi2Status::fmi2Warning;
        }
    }
    status
}

// Initialization, termination and resetting

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetupExperiment(
    c: fmi2Component,
    _toleranceDefined: fmi2Boolean,
    _tolerance: fmi2Real,
    startTime: fmi2Real,
    _stopTimeDefined: fmi2Boolean,
    _stopTime: fmi2Real,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2SetupExperiment", |state| {
            state.setup_experiment(startTime).into()
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2EnterInitializationMode(c: fmi2Component) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2EnterInitializationMode", |state| {
            state.enter_initialization_mode().into()
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2ExitInitializationMode(c: fmi2Component) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2ExitInitializationMode", |state| {
            state.exit_initialization_mode().into()
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2Terminate(c: fmi2Component) -> fmi2Status {
    unsafe { with_component(c, "fmi2Terminate", |state| state.terminate().into()) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2Reset(c: fmi2Component) -> fmi2Status {
    unsafe { with_component(c, "fmi2Reset", |state| state.reset().into()) }
}

// Getting and setting variable values

/// # Safety
/// As [fmi2FreeInstance], and `vr` and `value` point to `nvr` elements.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetReal(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *mut fmi2Real,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetReal", |state| {
            match (slice(vr, nvr), slice_mut(value, nvr)) {
                (Some(references), Some(values)) => state.get_reals(references, values).into(),
                _ => null_argument("fmi2GetReal"),
            }
        })
    }
}

/// # Safety
/// As [fmi2GetReal].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetInteger(
    c: fmi2Component,
    _vr: *const fmi2ValueReference,
    nvr: usize,
    _value: *mut fmi2Integer,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetInteger", |_| {
            no_variables_of_type("fmi2GetInteger", nvr)
        })
    }
}

/// # Safety
/// As [fmi2GetReal].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetBoolean(
    c: fmi2Component,
    _vr: *const fmi2ValueReference,
    nvr: usize,
    _value: *mut fmi2Boolean,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetBoolean", |_| {
            no_variables_of_type("fmi2GetBoolean", nvr)
        })
    }
}

/// The returned pointers stay valid until the next `fmi2GetString` or `fmi2Reset` on the
/// same component.
///
/// # Safety
/// As [fmi2GetReal].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetString(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *mut fmi2String,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetString", |state| {
            match (slice(vr, nvr), slice_mut(value, nvr)) {
                (Some(references), Some(values)) => state.get_strings(references, values).into(),
                _ => null_argument("fmi2GetString"),
            }
        })
    }
}

/// # Safety
/// As [fmi2GetReal].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetReal(
    c: fmi2Component,
    _vr: *const fmi2ValueReference,
    nvr: usize,
    _value: *const fmi2Real,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2SetReal", |_| no_variables_of_type("fmi2SetReal", nvr)) }
}

/// # Safety
/// As [fmi2GetReal].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetInteger(
    c: fmi2Component,
    _vr: *const fmi2ValueReference,
    nvr: usize,
    _value: *const fmi2Integer,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2SetInteger", |_| {
            no_variables_of_type("fmi2SetInteger", nvr)
        })
    }
}

/// # Safety
/// As [fmi2GetReal].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetBoolean(
    c: fmi2Component,
    _vr: *const fmi2ValueReference,
    nvr: usize,
    _value: *const fmi2Boolean,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2SetBoolean", |_| {
            no_variables_of_type("fmi2SetBoolean", nvr)
        })
    }
}

/// Writing either parameter after initialization replaces the signals at once.
///
/// # Safety
/// As [fmi2GetReal], and every element of `value` is null or NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetString(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *const fmi2String,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2SetString", |state| {
            let (Some(references), Some(values)) = (slice(vr, nvr), slice(value, nvr)) else {
                return null_argument("fmi2SetString");
            };
            let values: Vec<Cow<str>> = values.iter().map(|v| text(*v)).collect();
            state
                .set_strings(references.iter().copied().zip(values.iter().map(Cow::as_ref)))
                .into()
        })
    }
}

// FMU state

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetFMUstate(
    c: fmi2Component,
    _FMUstate: *mut fmi2FMUstate,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2GetFMUstate", |_| unsupported("fmi2GetFMUstate")) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetFMUstate(c: fmi2Component, _FMUstate: fmi2FMUstate) -> fmi2Status {
    unsafe { with_component(c, "fmi2SetFMUstate", |_| unsupported("fmi2SetFMUstate")) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2FreeFMUstate(
    c: fmi2Component,
    _FMUstate: *mut fmi2FMUstate,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2FreeFMUstate", |_| unsupported("fmi2FreeFMUstate")) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SerializedFMUstateSize(
    c: fmi2Component,
    _FMUstate: fmi2FMUstate,
    _size: *mut usize,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2SerializedFMUstateSize", |_| {
            unsupported("fmi2SerializedFMUstateSize")
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SerializeFMUstate(
    c: fmi2Component,
    _FMUstate: fmi2FMUstate,
    _serializedState: *mut fmi2Byte,
    _size: usize,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2SerializeFMUstate", |_| {
            unsupported("fmi2SerializeFMUstate")
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2DeSerializeFMUstate(
    c: fmi2Component,
    _serializedState: *const fmi2Byte,
    _size: usize,
    _FMUstate: *mut fmi2FMUstate,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2DeSerializeFMUstate", |_| {
            unsupported("fmi2DeSerializeFMUstate")
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetDirectionalDerivative(
    c: fmi2Component,
    _vUnknown_ref: *const fmi2ValueReference,
    _nUnknown: usize,
    _vKnown_ref: *const fmi2ValueReference,
    _nKnown: usize,
    _dvKnown: *const fmi2Real,
    _dvUnknown: *mut fmi2Real,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetDirectionalDerivative", |_| {
            unsupported("fmi2GetDirectionalDerivative")
        })
    }
}

// Model exchange. This FMU has no continuous states or event indicators, so these
// calls do nothing.

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2EnterEventMode(c: fmi2Component) -> fmi2Status {
    unsafe { with_component(c, "fmi2EnterEventMode", |_| fmi2Status::fmi2OK) }
}

/// # Safety
/// As [fmi2FreeInstance], and `eventInfo` is null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2NewDiscreteStates(
    c: fmi2Component,
    eventInfo: *mut fmi2EventInfo,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2NewDiscreteStates", |_| {
            if let Some(info) = eventInfo.as_mut() {
                *info = fmi2EventInfo::default();
            }
            fmi2Status::fmi2OK
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2EnterContinuousTimeMode(c: fmi2Component) -> fmi2Status {
    unsafe { with_component(c, "fmi2EnterContinuousTimeMode", |_| fmi2Status::fmi2OK) }
}

/// # Safety
/// As [fmi2FreeInstance], and the flag pointers are null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2CompletedIntegratorStep(
    c: fmi2Component,
    _noSetFMUStatePriorToCurrentPoint: fmi2Boolean,
    enterEventMode: *mut fmi2Boolean,
    terminateSimulation: *mut fmi2Boolean,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2CompletedIntegratorStep", |_| {
            if let Some(flag) = enterEventMode.as_mut() {
                *flag = fmi2False;
            }
            if let Some(flag) = terminateSimulation.as_mut() {
                *flag = fmi2False;
            }
            fmi2Status::fmi2OK
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetTime(c: fmi2Component, time: fmi2Real) -> fmi2Status {
    unsafe { with_component(c, "fmi2SetTime", |state| state.set_time(time).into()) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetContinuousStates(
    c: fmi2Component,
    _x: *const fmi2Real,
    _nx: usize,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2SetContinuousStates", |_| fmi2Status::fmi2OK) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetDerivatives(
    c: fmi2Component,
    _derivatives: *mut fmi2Real,
    _nx: usize,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2GetDerivatives", |_| fmi2Status::fmi2OK) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetEventIndicators(
    c: fmi2Component,
    _eventIndicators: *mut fmi2Real,
    _ni: usize,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2GetEventIndicators", |_| fmi2Status::fmi2OK) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetContinuousStates(
    c: fmi2Component,
    _x: *mut fmi2Real,
    _nx: usize,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2GetContinuousStates", |_| fmi2Status::fmi2OK) }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetNominalsOfContinuousStates(
    c: fmi2Component,
    _x_nominal: *mut fmi2Real,
    _nx: usize,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2GetNominalsOfContinuousStates", |_| fmi2Status::fmi2OK) }
}

// Co-simulation

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2SetRealInputDerivatives(
    c: fmi2Component,
    _vr: *const fmi2ValueReference,
    nvr: usize,
    _order: *const fmi2Integer,
    _value: *const fmi2Real,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2SetRealInputDerivatives", |_| {
            no_variables_of_type("fmi2SetRealInputDerivatives", nvr)
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetRealOutputDerivatives(
    c: fmi2Component,
    _vr: *const fmi2ValueReference,
    nvr: usize,
    _order: *const fmi2Integer,
    _value: *mut fmi2Real,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetRealOutputDerivatives", |_| {
            if nvr == 0 {
                fmi2Status::fmi2OK
            } else {
                unsupported("fmi2GetRealOutputDerivatives")
            }
        })
    }
}

/// Steps are computed synchronously; `noSetFMUStatePriorToCurrentPoint` changes nothing.
///
/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2DoStep(
    c: fmi2Component,
    currentCommunicationPoint: fmi2Real,
    communicationStepSize: fmi2Real,
    _noSetFMUStatePriorToCurrentPoint: fmi2Boolean,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2DoStep", |state| {
            state
                .do_step(currentCommunicationPoint, communicationStepSize)
                .into()
        })
    }
}

/// # Safety
/// As [fmi2FreeInstance].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2CancelStep(c: fmi2Component) -> fmi2Status {
    unsafe { with_component(c, "fmi2CancelStep", |_| unsupported("fmi2CancelStep")) }
}

/// # Safety
/// As [fmi2FreeInstance], and `value` is writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetStatus(
    c: fmi2Component,
    s: c_int,
    value: *mut fmi2Status,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetStatus", |_| {
            let Some(value) = value.as_mut() else {
                return null_argument("fmi2GetStatus");
            };
            match fmi2StatusKind::from_raw(s) {
                Some(fmi2StatusKind::fmi2DoStepStatus) => {
                    *value = fmi2Status::fmi2OK;
                    fmi2Status::fmi2OK
                }
                _ => fmi2Status::fmi2Discard,
            }
        })
    }
}

/// # Safety
/// As [fmi2GetStatus].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetRealStatus(
    c: fmi2Component,
    s: c_int,
    value: *mut fmi2Real,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetRealStatus", |state| {
            let Some(value) = value.as_mut() else {
                return null_argument("fmi2GetRealStatus");
            };
            match fmi2StatusKind::from_raw(s) {
                Some(fmi2StatusKind::fmi2LastSuccessfulTime) => {
                    *value = state.last_successful_time();
                    fmi2Status::fmi2OK
                }
                _ => fmi2Status::fmi2Discard,
            }
        })
    }
}

/// # Safety
/// As [fmi2GetStatus].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetIntegerStatus(
    c: fmi2Component,
    _s: c_int,
    _value: *mut fmi2Integer,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2GetIntegerStatus", |_| fmi2Status::fmi2Discard) }
}

/// # Safety
/// As [fmi2GetStatus].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetBooleanStatus(
    c: fmi2Component,
    s: c_int,
    value: *mut fmi2Boolean,
) -> fmi2Status {
    unsafe {
        with_component(c, "fmi2GetBooleanStatus", |_| {
            let Some(value) = value.as_mut() else {
                return null_argument("fmi2GetBooleanStatus");
            };
            match fmi2StatusKind::from_raw(s) {
                Some(fmi2StatusKind::fmi2Terminated) => {
                    *value = fmi2False;
                    fmi2Status::fmi2OK
                }
                _ => fmi2Status::fmi2Discard,
            }
        })
    }
}

/// # Safety
/// As [fmi2GetStatus].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmi2GetStringStatus(
    c: fmi2Component,
    _s: c_int,
    _value: *mut fmi2String,
) -> fmi2Status {
    unsafe { with_component(c, "fmi2GetStringStatus", |_| fmi2Status::fmi2Discard) }
}
