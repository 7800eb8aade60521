//! Lifecycle events and their observers.
//!
//! Every invocation reports its progress as [`RuntimeLifecycleEvent`]s:
//! `execute` before the method body runs, `error` when anything fails, and
//! exactly one `finality` at the end. Events raised by the invoked instance
//! are relayed with the event's own name. Host-level [`LifecycleObserver`]s
//! see each event before it is queued for the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::RunnerError;

/// Source reported when a failure precedes class resolution.
pub const HOST_SOURCE: &str = "Plugfy.Runner";

/// Event emitted just before a method body runs.
pub const EXECUTE_EVENT: &str = "execute";

/// Event emitted when an invocation fails.
pub const ERROR_EVENT: &str = "error";

/// Event emitted once at the end of every invocation.
pub const FINALITY_EVENT: &str = "finality";

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Out-of-band notification sent to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeLifecycleEvent {
    source: String,
    event_name: String,
    message: String,
    data: Value,
}

impl RuntimeLifecycleEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        event_name: impl Into<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            source: source.into(),
            event_name: event_name.into(),
            message: message.into(),
            data,
        }
    }

    /// `execute` event announcing `method`.
    #[must_use]
    pub fn execute(source: &str, method: &str, request: Value) -> Self {
        Self::new(
            source,
            EXECUTE_EVENT,
            format!("Executing method '{method}'..."),
            request,
        )
    }

    /// `error` event describing `error`.
    #[must_use]
    pub fn error(source: &str, error: &RunnerError) -> Self {
        Self::new(
            source,
            ERROR_EVENT,
            error.innermost_message(),
            FailurePayload::from_error(error).into_value(),
        )
    }

    /// Successful `finality` event carrying the return value.
    #[must_use]
    pub fn succeeded(source: &str, method: &str, result: Value) -> Self {
        Self::new(
            source,
            FINALITY_EVENT,
            format!("Method '{method}' executed successfully."),
            result,
        )
    }

    /// Failed `finality` event.
    #[must_use]
    pub fn failed(source: &str, method: &str) -> Self {
        Self::new(
            source,
            FINALITY_EVENT,
            format!("Method '{method}' failed."),
            Value::Null,
        )
    }

    /// Originator, e.g. `Sample.Calculator.Add` or `Plugfy.Runner`.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Event name.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Opaque payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Serialises the event for the transport.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "source": self.source,
            "eventName": self.event_name,
            "message": self.message,
            "data": self.data,
        })
    }
}

/// Structured failure sent in place of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePayload {
    kind: String,
    message: String,
}

impl FailurePayload {
    /// Describes `error`.
    #[must_use]
    pub fn from_error(error: &RunnerError) -> Self {
        Self {
            kind: error.kind().to_owned(),
            message: error.innermost_message(),
        }
    }

    /// Taxonomy name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Serialises the payload for the transport.
    #[must_use]
    pub fn into_value(self) -> Value {
        serde_json::json!({ "kind": self.kind, "message": self.message })
    }
}

/// Host-level observer notified of every lifecycle event.
#[cfg_attr(test, mockall::automock)]
pub trait LifecycleObserver: Send + Sync {
    /// Invoked before the event is queued for the transport.
    fn on_event(&self, event: &RuntimeLifecycleEvent);
}

/// Observer that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLifecycleObserver;

impl TracingLifecycleObserver {
    /// Builds a new observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleObserver for TracingLifecycleObserver {
    fn on_event(&self, event: &RuntimeLifecycleEvent) {
        if event.event_name() == ERROR_EVENT {
            warn!(
                target: LIFECYCLE_TARGET,
                source = event.source(),
                event = event.event_name(),
                message = event.message(),
                "invocation failed"
            );
        } else {
            info!(
                target: LIFECYCLE_TARGET,
                source = event.source(),
                event = event.event_name(),
                message = event.message(),
                "lifecycle event"
            );
        }
    }
}
