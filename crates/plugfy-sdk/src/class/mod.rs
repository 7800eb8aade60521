//! Class definitions backed by closures.
//!
//! A module describes each exported class with a [`ClassBuilder`], supplying
//! constructors and methods as closures over a concrete state type. The
//! builder erases that type so the host can construct instances and call
//! methods by name through a [`ClassDefinition`] without knowing it.
//! Bodies run behind [`InvocationFailure::guard`], so a panicking body
//! surfaces as a failed invocation.
//!
//! ```
//! use plugfy_sdk::class::ClassBuilder;
//! use plugfy_sdk::types::TypeName;
//! use serde_json::json;
//!
//! struct Counter(i64);
//!
//! let class = ClassBuilder::<Counter>::new("Demo.Counter")
//!     .constructor(&[], |_, _| Ok(Counter(0)))
//!     .method("Next", &[], TypeName::I64, |counter, _| {
//!         counter.0 += 1;
//!         Ok(json!(counter.0))
//!     })
//!     .build();
//! assert_eq!(class.name(), "Demo.Counter");
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::descriptor::{
    EventDescriptor, FieldDescriptor, MethodDescriptor, ParameterDescriptor, TypeDescriptor,
    parameters,
};
use crate::error::InvocationFailure;
use crate::event::EventEmitter;
use crate::types::TypeName;

/// Type-erased instance state.
pub type Instance = Box<dyn Any + Send>;

type ConstructorBody =
    Box<dyn Fn(&Arguments, &EventEmitter) -> Result<Instance, InvocationFailure> + Send + Sync>;
type MethodBody =
    Box<dyn Fn(&mut Instance, &Arguments) -> Result<Value, InvocationFailure> + Send + Sync>;

/// Positional arguments after coercion to the declared parameter types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    /// Wraps positional values.
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Number of arguments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no arguments were supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw value at `position`.
    #[must_use]
    pub fn value(&self, position: usize) -> Option<&Value> {
        self.0.get(position)
    }

    /// Deserialises the argument at `position` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationFailure`] when the argument is missing or does not
    /// deserialise into `T`.
    pub fn get<T: DeserializeOwned>(&self, position: usize) -> Result<T, InvocationFailure> {
        let value = self
            .0
            .get(position)
            .ok_or_else(|| InvocationFailure::new(format!("missing argument {position}")))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// All arguments in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// A constructor selected by parameter count.
pub struct Constructor {
    parameters: Vec<ParameterDescriptor>,
    body: ConstructorBody,
}

impl Constructor {
    /// Declared parameters.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Number of declared parameters.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Runs the constructor body.
    ///
    /// # Errors
    ///
    /// Propagates the failure returned by the body.
    pub fn construct(
        &self,
        arguments: &Arguments,
        emitter: &EventEmitter,
    ) -> Result<Instance, InvocationFailure> {
        (self.body)(arguments, emitter)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A callable method.
pub struct Method {
    descriptor: MethodDescriptor,
    body: MethodBody,
}

impl Method {
    /// Public description of the method.
    #[must_use]
    pub const fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Runs the method body against `instance`.
    ///
    /// # Errors
    ///
    /// Propagates the failure returned by the body, or fails when `instance`
    /// was not built by this method's class.
    pub fn call(
        &self,
        instance: &mut Instance,
        arguments: &Arguments,
    ) -> Result<Value, InvocationFailure> {
        (self.body)(instance, arguments)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Method")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A class registered by a module.
#[derive(Debug)]
pub struct ClassDefinition {
    name: String,
    constructors: Vec<Constructor>,
    methods: Vec<Method>,
    fields: Vec<FieldDescriptor>,
    events: Vec<EventDescriptor>,
}

impl ClassDefinition {
    /// Fully qualified class name, e.g. `Sample.Calculator`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Projects the class onto its public descriptor.
    #[must_use]
    pub fn describe(&self) -> TypeDescriptor {
        TypeDescriptor::new(
            self.name.clone(),
            self.methods
                .iter()
                .map(|method| method.descriptor.clone())
                .collect(),
            self.fields.clone(),
            self.events.clone(),
        )
    }

    /// Constructors in declaration order.
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// First declared constructor taking exactly `arity` parameters.
    #[must_use]
    pub fn constructor_with_arity(&self, arity: usize) -> Option<&Constructor> {
        self.constructors
            .iter()
            .find(|constructor| constructor.arity() == arity)
    }

    /// First declared method called `name`.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|method| method.descriptor.name() == name)
    }

    /// Number of methods declared under `name`.
    #[must_use]
    pub fn methods_named(&self, name: &str) -> usize {
        self.methods
            .iter()
            .filter(|method| method.descriptor.name() == name)
            .count()
    }

    /// Declared events in declaration order.
    #[must_use]
    pub fn events(&self) -> &[EventDescriptor] {
        &self.events
    }

    /// Creates an emitter bound to this class's events.
    #[must_use]
    pub fn new_emitter(&self) -> EventEmitter {
        EventEmitter::new(self.name.clone(), &self.events)
    }
}

/// Builds a [`ClassDefinition`] over the instance state type `T`.
pub struct ClassBuilder<T> {
    name: String,
    constructors: Vec<Constructor>,
    methods: Vec<Method>,
    fields: Vec<FieldDescriptor>,
    events: Vec<EventDescriptor>,
    state: PhantomData<fn() -> T>,
}

impl<T: Any + Send> ClassBuilder<T> {
    /// Starts a class called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            events: Vec::new(),
            state: PhantomData,
        }
    }

    /// Declares a constructor with the given parameters.
    #[must_use]
    pub fn constructor<F>(mut self, signature: &[(&str, TypeName)], body: F) -> Self
    where
        F: Fn(&Arguments, &EventEmitter) -> Result<T, InvocationFailure> + Send + Sync + 'static,
    {
        let erased: ConstructorBody = Box::new(move |arguments: &Arguments, emitter: &EventEmitter| {
            InvocationFailure::guard(|| body(arguments, emitter))
                .map(|state| Box::new(state) as Instance)
        });
        self.constructors.push(Constructor {
            parameters: parameters(signature),
            body: erased,
        });
        self
    }

    /// Declares an instance method.
    #[must_use]
    pub fn method<F>(
        mut self,
        name: &str,
        signature: &[(&str, TypeName)],
        returns: TypeName,
        body: F,
    ) -> Self
    where
        F: Fn(&mut T, &Arguments) -> Result<Value, InvocationFailure> + Send + Sync + 'static,
    {
        let class = self.name.clone();
        let erased: MethodBody = Box::new(move |instance: &mut Instance, arguments: &Arguments| {
            let state = (**instance).downcast_mut::<T>().ok_or_else(|| {
                InvocationFailure::new(format!("instance is not a '{class}'"))
            })?;
            InvocationFailure::guard(|| body(state, arguments))
        });
        self.methods.push(Method {
            descriptor: MethodDescriptor::new(name, returns, parameters(signature), false),
            body: erased,
        });
        self
    }

    /// Declares a method that does not read instance state.
    #[must_use]
    pub fn static_method<F>(
        mut self,
        name: &str,
        signature: &[(&str, TypeName)],
        returns: TypeName,
        body: F,
    ) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, InvocationFailure> + Send + Sync + 'static,
    {
        let erased: MethodBody = Box::new(move |_instance: &mut Instance, arguments: &Arguments| {
            InvocationFailure::guard(|| body(arguments))
        });
        self.methods.push(Method {
            descriptor: MethodDescriptor::new(name, returns, parameters(signature), true),
            body: erased,
        });
        self
    }

    /// Declares an instance field.
    #[must_use]
    pub fn field(mut self, name: &str, field_type: TypeName) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, field_type, false));
        self
    }

    /// Declares a static field.
    #[must_use]
    pub fn static_field(mut self, name: &str, field_type: TypeName) -> Self {
        self.fields.push(FieldDescriptor::new(name, field_type, true));
        self
    }

    /// Declares an event raised with the given parameters.
    #[must_use]
    pub fn event(mut self, name: &str, signature: &[(&str, TypeName)]) -> Self {
        self.events
            .push(EventDescriptor::new(name, parameters(signature)));
        self
    }

    /// Finishes the class.
    #[must_use]
    pub fn build(self) -> ClassDefinition {
        ClassDefinition {
            name: self.name,
            constructors: self.constructors,
            methods: self.methods,
            fields: self.fields,
            events: self.events,
        }
    }
}
