//! Dynamic invocation of module methods.
//!
//! The engine loads the requested module, builds a fresh instance, attaches a
//! relay for every event the class declares, coerces the arguments, and calls
//! the method. Progress is reported as lifecycle events through an
//! [`Outbox`]; failures never escape [`InvocationEngine::invoke`].

use std::sync::Arc;

use plugfy_sdk::{
    Arguments, ClassDefinition, EventEmitter, Instance, InvocationFailure, ParameterDescriptor,
    Transport,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::library::{LoadedModule, ModuleDirectory};
use crate::lifecycle::{HOST_SOURCE, LifecycleObserver, RuntimeLifecycleEvent};
use crate::outbox::{Outbox, OutboxSender};
use crate::request::MethodCallRequest;

const INVOKE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::invoke");

/// Runs method-call requests against modules in the libraries directory.
#[derive(Clone)]
pub struct InvocationEngine {
    modules: ModuleDirectory,
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl InvocationEngine {
    /// Creates an engine with no observers.
    #[must_use]
    pub const fn new(modules: ModuleDirectory) -> Self {
        Self {
            modules,
            observers: Vec::new(),
        }
    }

    /// Registers an observer notified of every lifecycle event.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Invokes the method named by `request`.
    ///
    /// Lifecycle events are written to `transport` before this returns.
    /// Returns the method's return value on success and `None` on any
    /// failure; failures are reported as `error` and `finality` events.
    pub fn invoke(
        &self,
        request: &MethodCallRequest,
        transport: &Arc<dyn Transport>,
    ) -> Option<Value> {
        let outbox = Outbox::spawn(Arc::clone(transport));
        let publisher = Publisher {
            observers: self.observers.clone(),
            outbox: outbox.sender(),
        };
        let result = self.run(request, &publisher);
        outbox.drain();
        outbox.shutdown();
        result
    }

    fn run(&self, request: &MethodCallRequest, publisher: &Publisher) -> Option<Value> {
        let module = match self.modules.load(request.module()) {
            Ok(module) => module,
            Err(error) => {
                publisher.fail(HOST_SOURCE, request.method(), &error);
                return None;
            }
        };

        let Some(class) = module.class(request.class()) else {
            let error = RunnerError::ClassNotFound {
                module: request.module().to_owned(),
                class: request.class().to_owned(),
            };
            publisher.fail(HOST_SOURCE, request.method(), &error);
            return None;
        };

        let source = format!("{}.{}", class.name(), request.method());
        match call(&module, class, request, publisher, &source) {
            Ok(value) => {
                debug!(target: INVOKE_TARGET, source = %source, "method succeeded");
                publisher.publish(&RuntimeLifecycleEvent::succeeded(
                    &source,
                    request.method(),
                    value.clone(),
                ));
                Some(value)
            }
            Err(error) => {
                publisher.fail(&source, request.method(), &error);
                None
            }
        }
    }
}

impl std::fmt::Debug for InvocationEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("InvocationEngine")
            .field("modules", &self.modules)
            .field("observers", &self.observers.len())
            .finish()
    }
}

fn call(
    module: &LoadedModule,
    class: &ClassDefinition,
    request: &MethodCallRequest,
    publisher: &Publisher,
    source: &str,
) -> Result<Value, RunnerError> {
    let emitter = class.new_emitter();
    let mut instance = construct(class, request.constructor_parameters(), &emitter)?;
    attach_relays(&emitter, module.file_name(), publisher);

    let method = class
        .method(request.method())
        .ok_or_else(|| RunnerError::MethodNotFound {
            class: class.name().to_owned(),
            method: request.method().to_owned(),
        })?;
    let overloads = class.methods_named(request.method());
    if overloads > 1 {
        warn!(
            target: INVOKE_TARGET,
            class = class.name(),
            method = request.method(),
            overloads,
            "method name is ambiguous; using the first declaration"
        );
    }

    let arguments = coerce_arguments(source, method.descriptor().parameters(), request.parameters())?;
    publisher.publish(&RuntimeLifecycleEvent::execute(
        source,
        request.method(),
        request.to_value(),
    ));
    guarded(source, || method.call(&mut instance, &arguments))
}

fn construct(
    class: &ClassDefinition,
    supplied: Option<&[Value]>,
    emitter: &EventEmitter,
) -> Result<Instance, RunnerError> {
    let values = supplied.unwrap_or_default();
    let constructor = class
        .constructor_with_arity(values.len())
        .ok_or_else(|| RunnerError::ConstructorNotFound {
            class: class.name().to_owned(),
            arity: values.len(),
        })?;
    let member = format!("{} constructor", class.name());
    let arguments = coerce_arguments(&member, constructor.parameters(), values)?;
    guarded(&member, || constructor.construct(&arguments, emitter))
}

/// Subscribes one relay per declared event.
fn attach_relays(emitter: &EventEmitter, module_file: &str, publisher: &Publisher) {
    for event in emitter.events() {
        let source = format!("{}.{}", emitter.declaring_type(), event.name());
        let name = event.name().to_owned();
        let message = module_file.to_owned();
        let relay = publisher.clone();
        let subscribed = emitter.subscribe(
            event.name(),
            Arc::new(move |arguments: &[Value]| {
                relay.publish(&RuntimeLifecycleEvent::new(
                    source.as_str(),
                    name.as_str(),
                    message.as_str(),
                    Value::Array(arguments.to_vec()),
                ));
            }),
        );
        if let Err(error) = subscribed {
            warn!(target: INVOKE_TARGET, %error, "cannot relay event");
        }
    }
}

/// Converts `values` to the declared parameter types.
fn coerce_arguments(
    member: &str,
    parameters: &[ParameterDescriptor],
    values: &[Value],
) -> Result<Arguments, RunnerError> {
    if parameters.len() != values.len() {
        return Err(RunnerError::ParameterCountMismatch {
            member: member.to_owned(),
            expected: parameters.len(),
            actual: values.len(),
        });
    }
    parameters
        .iter()
        .zip(values)
        .enumerate()
        .map(|(position, (parameter, value))| {
            parameter
                .type_name()
                .coerce(value.clone())
                .map_err(|source| RunnerError::ArgumentConversion {
                    member: member.to_owned(),
                    position,
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Arguments::new)
}

/// Runs module code, turning its failures into [`RunnerError`].
///
/// Panics never reach this point: class bodies contain them on the module
/// side and report them as failures.
fn guarded<T>(
    member: &str,
    body: impl FnOnce() -> Result<T, InvocationFailure>,
) -> Result<T, RunnerError> {
    body().map_err(|source| RunnerError::Invocation {
        member: member.to_owned(),
        source,
    })
}

/// Notifies observers, then queues the event for the transport.
#[derive(Clone)]
struct Publisher {
    observers: Vec<Arc<dyn LifecycleObserver>>,
    outbox: OutboxSender,
}

impl Publisher {
    fn publish(&self, event: &RuntimeLifecycleEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
        if !self.outbox.push(event.to_value()) {
            debug!(
                target: INVOKE_TARGET,
                source = event.source(),
                event = event.event_name(),
                "outbox closed; event not delivered"
            );
        }
    }

    fn fail(&self, source: &str, method: &str, error: &RunnerError) {
        self.publish(&RuntimeLifecycleEvent::error(source, error));
        self.publish(&RuntimeLifecycleEvent::failed(source, method));
    }
}
