//! Routing of inbound commands.
//!
//! The [`Dispatcher`] maps a [`CommandEnvelope`] to the introspector or the
//! invocation engine and writes every outcome to the transport. Errors are
//! sent as failure payloads; nothing a command does can stop the host.

mod envelope;

use std::sync::Arc;

use plugfy_sdk::Transport;
use serde_json::Value;
use tracing::{debug, info, warn};

pub use self::envelope::{CommandEnvelope, CommandKind, CommandParameters};
use crate::error::RunnerError;
use crate::introspect::Introspector;
use crate::invoke::InvocationEngine;
use crate::lifecycle::FailurePayload;
use crate::request::MethodCallRequest;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Parameter naming the module described by `info`.
pub const ASSEMBLY_NAME_PARAMETER: &str = "AssemblyName";

/// Reply sent when `info` lacks its module name.
pub const MISSING_ASSEMBLY_NAME: &str = "Error: 'AssemblyName' parameter is missing.";

/// Acknowledgement sent before the channel closes on `exit`.
pub const EXIT_ACKNOWLEDGEMENT: &str = "Runner received exit command. Shutting down...";

/// Routes commands to the introspector and the invocation engine.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    introspector: Introspector,
    engine: InvocationEngine,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(introspector: Introspector, engine: InvocationEngine) -> Self {
        Self {
            introspector,
            engine,
        }
    }

    /// Executes `envelope`, writing its outcome to `transport`.
    pub fn dispatch(&self, envelope: &CommandEnvelope, transport: &Arc<dyn Transport>) {
        debug!(target: DISPATCH_TARGET, command = %envelope.kind(), "dispatching");
        match envelope.kind() {
            CommandKind::List => self.list(transport),
            CommandKind::Info => self.info(envelope.parameters(), transport),
            CommandKind::Run => self.run(envelope.parameters(), transport),
            CommandKind::Exit => {
                info!(target: DISPATCH_TARGET, "exit requested");
                send(transport, &Value::from(EXIT_ACKNOWLEDGEMENT));
                transport.close();
            }
            CommandKind::Unknown(kind) => {
                send(transport, &Value::from(format!("Unknown command: {kind}")));
            }
        }
    }

    /// Parses `text` as an envelope and dispatches it.
    ///
    /// Malformed text is answered with a failure payload.
    pub fn dispatch_text(&self, text: &str, transport: &Arc<dyn Transport>) {
        match CommandEnvelope::parse(text) {
            Ok(envelope) => self.dispatch(&envelope, transport),
            Err(error) => send_failure(transport, &error),
        }
    }

    fn list(&self, transport: &Arc<dyn Transport>) {
        match self.introspector.list_modules() {
            Ok(names) => send(transport, &Value::from(names)),
            Err(error) => send_failure(transport, &error),
        }
    }

    fn info(&self, parameters: &CommandParameters, transport: &Arc<dyn Transport>) {
        let Some(name) = parameters.text(ASSEMBLY_NAME_PARAMETER) else {
            send(transport, &Value::from(MISSING_ASSEMBLY_NAME));
            return;
        };
        let described = self
            .introspector
            .describe_module(name)
            .and_then(|descriptor| {
                serde_json::to_value(descriptor).map_err(|error| {
                    RunnerError::invalid_command(format!("cannot encode descriptor: {error}"))
                })
            });
        match described {
            Ok(descriptor) => send(transport, &descriptor),
            Err(error) => send_failure(transport, &error),
        }
    }

    fn run(&self, parameters: &CommandParameters, transport: &Arc<dyn Transport>) {
        let request = match MethodCallRequest::from_parameters(parameters.as_map()) {
            Ok(request) => request,
            Err(error) => {
                send_failure(transport, &error);
                return;
            }
        };
        let result = self.engine.invoke(&request, transport);
        if let Some(value) = result.filter(|value| !value.is_null()) {
            send(transport, &value);
        }
    }
}

/// Writes `payload`, logging rather than propagating send failures.
pub(crate) fn send(transport: &Arc<dyn Transport>, payload: &Value) {
    if let Err(error) = transport.send(payload) {
        warn!(target: DISPATCH_TARGET, %error, "cannot send reply");
    }
}

/// Writes the failure payload describing `error`.
pub(crate) fn send_failure(transport: &Arc<dyn Transport>, error: &RunnerError) {
    warn!(target: DISPATCH_TARGET, kind = error.kind(), %error, "command failed");
    send(transport, &FailurePayload::from_error(error).into_value());
}
