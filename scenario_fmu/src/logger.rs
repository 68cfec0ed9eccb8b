//! Forwarding `tracing` events to the host.
//!
//! Every component owns a [Dispatch] built from a bare registry and a [ForwardLayer]. The
//! layer renders each event to a single line and hands it to a [LogSink], which for a
//! real host is the `logger` callback passed to `fmi2Instantiate`.

use crate::fmi2::{fmi2CallbackLogger, fmi2ComponentEnvironment, fmi2Status};
use std::ffi::CString;
use std::fmt::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub const CATEGORY_ERROR: &str = "logStatusError";
pub const CATEGORY_WARNING: &str = "logStatusWarning";
pub const CATEGORY_ALL: &str = "logAll";

/// Somewhere to put a rendered log line.
pub trait LogSink: Send + Sync + 'static {
    fn log(&self, status: fmi2Status, category: &str, message: &str);
}

/// The host's `logger` callback together with what it needs to identify the instance.
pub struct CallbackSink {
    logger: fmi2CallbackLogger,
    environment: Environment,
    instance_name: CString,
}

/// The host's opaque environment pointer. It is only ever passed back to the host.
struct Environment(fmi2ComponentEnvironment);

// SAFETY: the pointer is never dereferenced on this side of the ABI.
unsafe impl Send for Environment {}
unsafe impl Sync for Environment {}

impl CallbackSink {
    pub fn new(
        logger: fmi2CallbackLogger,
        environment: fmi2ComponentEnvironment,
        instance_name: &str,
    ) -> Self {
        CallbackSink {
            logger,
            environment: Environment(environment),
            instance_name: to_c_string(instance_name),
        }
    }
}

impl LogSink for CallbackSink {
    fn log(&self, status: fmi2Status, category: &str, message: &str) {
        let Some(logger) = self.logger else {
            return;
        };
        let category = to_c_string(category);
        let message = to_c_string(message);
        // The message goes through "%s" so that a literal '%' in it is never read as a
        // conversion.
        unsafe {
            logger(
                self.environment.0,
                self.instance_name.as_ptr(),
                status,
                category.as_ptr(),
                c"%s".as_ptr(),
                message.as_ptr(),
            );
        }
    }
}

fn to_c_string(text: &str) -> CString {
    CString::new(text.replace('\0', " ")).unwrap_or_default()
}

/// Renders events and forwards them to a [LogSink].
///
/// Warnings and errors always go through. Info and debug only go through while
/// `logging_on` is set. Trace never does.
pub struct ForwardLayer<K> {
    sink: K,
    logging_on: Arc<AtomicBool>,
}

impl<K: LogSink> ForwardLayer<K> {
    pub fn new(sink: K, logging_on: Arc<AtomicBool>) -> Self {
        ForwardLayer { sink, logging_on }
    }

    fn forwards(&self, level: Level) -> bool {
        if level <= Level::WARN {
            true
        } else if level <= Level::DEBUG {
            self.logging_on.load(Ordering::Relaxed)
        } else {
            false
        }
    }
}

impl<S: Subscriber, K: LogSink> Layer<S> for ForwardLayer<K> {
    fn max_level_hint(&self) -> Option<LevelFilter> {
        Some(LevelFilter::DEBUG)
    }

    // Filtering happens here rather than in `enabled`: callsite interest is cached
    // process-wide, and `logging_on` changes at runtime.
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if !self.forwards(level) {
            return;
        }

        let mut line = Line::default();
        event.record(&mut line);

        let (status, category) = match level {
            Level::ERROR => (fmi2Status::fmi2Error, CATEGORY_ERROR),
            Level::WARN => (fmi2Status::fmi2Warning, CATEGORY_WARNING),
            _ => (fmi2Status::fmi2OK, CATEGORY_ALL),
        };
        self.sink.log(status, category, &line.finish());
    }
}

/// `message key=value key=value`
#[derive(Default)]
struct Line {
    message: String,
    fields: String,
}

impl Line {
    fn finish(self) -> String {
        if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for Line {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

/// A dispatcher that sends everything recorded under it to `sink`.
pub fn dispatch(sink: impl LogSink, logging_on: Arc<AtomicBool>) -> Dispatch {
    Dispatch::new(Registry::default().with(ForwardLayer::new(sink, logging_on)))
}
