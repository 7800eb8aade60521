//! Errors shared by the host and by module code.
//!
//! Module authors return [`InvocationFailure`] from constructor and method
//! bodies; the host reports its message verbatim in the `error` lifecycle
//! event. I/O errors are wrapped in `Arc` so the enums stay `Clone` and small.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::types::{TypeName, json_kind};

/// A value could not be converted to a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {found} value {value} to {target}")]
pub struct ConversionError {
    found: &'static str,
    value: String,
    target: TypeName,
}

impl ConversionError {
    /// Builds a conversion error for `value` and the type it failed to meet.
    #[must_use]
    pub fn new(value: &Value, target: TypeName) -> Self {
        Self {
            found: json_kind(value),
            value: value.to_string(),
            target,
        }
    }

    /// JSON kind of the rejected value.
    #[must_use]
    pub const fn found(&self) -> &'static str {
        self.found
    }

    /// Rendered form of the rejected value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Type the value was expected to satisfy.
    #[must_use]
    pub const fn target(&self) -> TypeName {
        self.target
    }
}

/// A module raised an event the host cannot forward.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The event is not declared on the raising type.
    #[error("type '{declaring_type}' declares no event named '{event}'")]
    UnknownEvent {
        /// Type that raised the event.
        declaring_type: String,
        /// Event name that was raised.
        event: String,
    },

    /// The event was raised with the wrong number of arguments.
    #[error("event '{event}' expects {expected} argument(s) but received {actual}")]
    ArgumentCount {
        /// Event name.
        event: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// An event argument did not match its declared type.
    #[error("event '{event}' argument {position}: {source}")]
    Conversion {
        /// Event name.
        event: String,
        /// Zero-based argument position.
        position: usize,
        /// Underlying conversion failure.
        #[source]
        source: ConversionError,
    },
}

/// Failure raised by a constructor or method body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvocationFailure {
    message: String,
}

impl InvocationFailure {
    /// Creates a failure carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Runs `body`, reporting a panic as a failure carrying the panic message.
    ///
    /// Module code runs behind this guard: an unwind must not cross the
    /// module boundary because the host links its own standard library.
    pub fn guard<R>(body: impl FnOnce() -> Result<R, Self>) -> Result<R, Self> {
        panic::catch_unwind(AssertUnwindSafe(body))
            .unwrap_or_else(|payload| Err(Self::from_panic(payload.as_ref())))
    }

    /// Failure describing a panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "module code panicked".to_owned());
        Self::new(message)
    }
}

impl From<ConversionError> for InvocationFailure {
    fn from(error: ConversionError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<EventError> for InvocationFailure {
    fn from(error: EventError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<serde_json::Error> for InvocationFailure {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Errors raised by transport implementations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The channel was used after it closed.
    #[error("transport '{name}' is closed")]
    Closed {
        /// Transport name.
        name: String,
    },

    /// Initialisation parameters were rejected.
    #[error("transport '{name}' rejected its parameters: {message}")]
    InvalidParameters {
        /// Transport name.
        name: String,
        /// Description of the problem.
        message: String,
    },

    /// An outbound payload could not be encoded.
    #[error("transport '{name}' could not encode a payload: {message}")]
    Serialize {
        /// Transport name.
        name: String,
        /// Encoder message.
        message: String,
    },

    /// The underlying stream failed.
    #[error("I/O error on transport '{name}': {source}")]
    Io {
        /// Transport name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl TransportError {
    /// Wraps an I/O error raised by the transport named `name`.
    #[must_use]
    pub fn io(name: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source: Arc::new(source),
        }
    }
}
