//! Event raising for module classes.
//!
//! A class declares its events up front; each instance receives an
//! [`EventEmitter`] bound to those declarations. Module code raises events by
//! name with positional arguments, which are checked against the declared
//! parameters before every subscribed handler is called. The host subscribes
//! one relay handler per declared event before invoking a method.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::descriptor::EventDescriptor;
use crate::error::EventError;

/// Callback receiving the arguments of a raised event.
pub type EventHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

struct Subscription {
    event: String,
    handler: EventHandler,
}

struct EventTable {
    declaring_type: String,
    events: Vec<EventDescriptor>,
    subscriptions: RwLock<Vec<Subscription>>,
}

/// Raises the declared events of one class instance.
///
/// Cloning an emitter shares its subscriptions, so a class may keep a clone
/// inside its instance state and raise events from any method.
#[derive(Clone)]
pub struct EventEmitter {
    table: Arc<EventTable>,
}

impl EventEmitter {
    /// Creates an emitter for `declaring_type` with the given declarations.
    #[must_use]
    pub fn new(declaring_type: impl Into<String>, events: &[EventDescriptor]) -> Self {
        Self {
            table: Arc::new(EventTable {
                declaring_type: declaring_type.into(),
                events: events.to_vec(),
                subscriptions: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Name of the type whose events this emitter raises.
    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.table.declaring_type
    }

    /// Declared events in declaration order.
    #[must_use]
    pub fn events(&self) -> &[EventDescriptor] {
        &self.table.events
    }

    /// Attaches `handler` to `event`. Handlers are never detached.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEvent`] when `event` is not declared.
    pub fn subscribe(&self, event: &str, handler: EventHandler) -> Result<(), EventError> {
        self.declaration(event)?;
        self.table
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                event: event.to_owned(),
                handler,
            });
        Ok(())
    }

    /// Raises `event` with positional `arguments`.
    ///
    /// Arguments are coerced to the declared parameter types before any
    /// handler runs. Handlers are called in subscription order on the calling
    /// thread.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] when the event is undeclared, the argument count
    /// differs from the declaration, or an argument cannot be converted.
    pub fn raise(&self, event: &str, arguments: Vec<Value>) -> Result<(), EventError> {
        let declaration = self.declaration(event)?;
        let expected = declaration.parameters().len();
        if arguments.len() != expected {
            return Err(EventError::ArgumentCount {
                event: event.to_owned(),
                expected,
                actual: arguments.len(),
            });
        }

        let coerced = arguments
            .into_iter()
            .zip(declaration.parameters())
            .enumerate()
            .map(|(position, (argument, parameter))| {
                parameter
                    .type_name()
                    .coerce(argument)
                    .map_err(|source| EventError::Conversion {
                        event: event.to_owned(),
                        position,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for handler in self.handlers_for(event) {
            handler(&coerced);
        }
        Ok(())
    }

    /// Number of handlers attached to `event`.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.table
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|subscription| subscription.event == event)
            .count()
    }

    fn declaration(&self, event: &str) -> Result<&EventDescriptor, EventError> {
        self.table
            .events
            .iter()
            .find(|candidate| candidate.name() == event)
            .ok_or_else(|| EventError::UnknownEvent {
                declaring_type: self.table.declaring_type.clone(),
                event: event.to_owned(),
            })
    }

    // Handlers are cloned out of the lock so a handler may subscribe or raise.
    fn handlers_for(&self, event: &str) -> Vec<EventHandler> {
        self.table
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|subscription| subscription.event == event)
            .map(|subscription| Arc::clone(&subscription.handler))
            .collect()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EventEmitter")
            .field("declaring_type", &self.table.declaring_type)
            .field("events", &self.table.events)
            .finish_non_exhaustive()
    }
}
