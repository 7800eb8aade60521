//! Collects what a module registers.

use crate::class::ClassDefinition;
use crate::error::InvocationFailure;
use crate::transport::TransportFactory;
use crate::{ModuleDeclaration, ModuleRegistrar};

/// Classes and transport factories registered by one module.
#[derive(Debug, Default)]
pub struct Registrations {
    classes: Vec<ClassDefinition>,
    transports: Vec<TransportFactory>,
    failure: Option<InvocationFailure>,
}

impl Registrations {
    /// Creates an empty set of registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the declaration's registration function and gathers the result.
    #[must_use]
    pub fn collect(declaration: &ModuleDeclaration) -> Self {
        let mut registrations = Self::new();
        declaration.register_into(&mut registrations);
        registrations
    }

    /// Registered classes in registration order.
    #[must_use]
    pub fn classes(&self) -> &[ClassDefinition] {
        &self.classes
    }

    /// Registered transport factories in registration order.
    #[must_use]
    pub fn transports(&self) -> &[TransportFactory] {
        &self.transports
    }

    /// Why registration stopped early, if it did.
    #[must_use]
    pub const fn failure(&self) -> Option<&InvocationFailure> {
        self.failure.as_ref()
    }

    /// Splits into classes and transport factories.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ClassDefinition>, Vec<TransportFactory>) {
        (self.classes, self.transports)
    }
}

impl ModuleRegistrar for Registrations {
    fn register_class(&mut self, class: ClassDefinition) {
        self.classes.push(class);
    }

    fn register_transport(&mut self, factory: TransportFactory) {
        self.transports.push(factory);
    }

    fn abort(&mut self, failure: InvocationFailure) {
        self.failure = Some(failure);
    }
}
