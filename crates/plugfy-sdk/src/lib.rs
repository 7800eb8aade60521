//! Authoring contract for Plugfy modules.
//!
//! A Plugfy module is a dynamic library built against this crate. It exports
//! one [`ModuleDeclaration`] through [`export_module!`]; the runner loads the
//! library, checks that the declaration was built by the same SDK and
//! compiler, and calls its registration function to discover classes and
//! transports.
//!
//! ```
//! use plugfy_sdk::ModuleRegistrar;
//! use plugfy_sdk::class::ClassBuilder;
//! use plugfy_sdk::types::TypeName;
//! use serde_json::json;
//!
//! struct Greeter;
//!
//! fn register(registrar: &mut dyn ModuleRegistrar) {
//!     registrar.register_class(
//!         ClassBuilder::<Greeter>::new("Demo.Greeter")
//!             .constructor(&[], |_, _| Ok(Greeter))
//!             .method("Hello", &[("name", TypeName::String)], TypeName::String, |_, args| {
//!                 Ok(json!(format!("Hello, {}", args.get::<String>(0)?)))
//!             })
//!             .build(),
//!     );
//! }
//!
//! plugfy_sdk::export_module!(name: "demo", version: "1.0.0", register: register);
//!
//! let registrations = plugfy_sdk::registry::Registrations::collect(&PLUGFY_MODULE_DECLARATION);
//! assert_eq!(registrations.classes().len(), 1);
//! ```

pub mod class;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod registry;
pub mod transport;
pub mod types;

use std::fmt;

pub use class::{Arguments, ClassBuilder, ClassDefinition, Instance};
pub use descriptor::{
    EventDescriptor, FieldDescriptor, MethodDescriptor, ModuleDescriptor, ParameterDescriptor,
    TypeDescriptor,
};
pub use error::{ConversionError, EventError, InvocationFailure, TransportError};
pub use event::{EventEmitter, EventHandler};
pub use transport::{MessageHandler, Transport, TransportFactory};
pub use types::TypeName;

/// Version of this SDK compiled into hosts and modules.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compiler that built this SDK.
pub const RUSTC_VERSION: &str = env!("PLUGFY_RUSTC_VERSION");

/// Symbol under which a module exports its declaration.
pub const DECLARATION_SYMBOL: &[u8] = b"PLUGFY_MODULE_DECLARATION\0";

/// Receives the classes and transports a module provides.
pub trait ModuleRegistrar {
    /// Adds a class.
    fn register_class(&mut self, class: ClassDefinition);

    /// Adds a transport factory.
    fn register_transport(&mut self, factory: TransportFactory);

    /// Records that registration stopped early with `failure`.
    fn abort(&mut self, failure: InvocationFailure);
}

/// Identity and entry point exported by every module.
#[derive(Clone, Copy)]
pub struct ModuleDeclaration {
    sdk_version: &'static str,
    rustc_version: &'static str,
    name: &'static str,
    version: &'static str,
    register: fn(&mut dyn ModuleRegistrar),
}

impl ModuleDeclaration {
    /// Creates a declaration stamped with this SDK's version and compiler.
    #[must_use]
    pub const fn new(
        name: &'static str,
        version: &'static str,
        register: fn(&mut dyn ModuleRegistrar),
    ) -> Self {
        Self {
            sdk_version: SDK_VERSION,
            rustc_version: RUSTC_VERSION,
            name,
            version,
            register,
        }
    }

    /// Module name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Module version.
    #[must_use]
    pub const fn version(&self) -> &'static str {
        self.version
    }

    /// SDK version the module was built against.
    #[must_use]
    pub const fn sdk_version(&self) -> &'static str {
        self.sdk_version
    }

    /// Compiler the module was built with.
    #[must_use]
    pub const fn rustc_version(&self) -> &'static str {
        self.rustc_version
    }

    /// Identity string, e.g. `plugfy-sample, Version=0.1.0`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}, Version={}", self.name, self.version)
    }

    /// Whether the module was built by this SDK version and compiler.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.sdk_version == SDK_VERSION && self.rustc_version == RUSTC_VERSION
    }

    /// Calls the module's registration function.
    ///
    /// Declarations exported with [`export_module!`] contain panics raised
    /// during registration and report them through [`ModuleRegistrar::abort`].
    pub fn register_into(&self, registrar: &mut dyn ModuleRegistrar) {
        (self.register)(registrar);
    }
}

impl fmt::Debug for ModuleDeclaration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ModuleDeclaration")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("sdk_version", &self.sdk_version)
            .field("rustc_version", &self.rustc_version)
            .finish_non_exhaustive()
    }
}

/// Runs `register` against `registrar`, turning a panic into
/// [`ModuleRegistrar::abort`].
///
/// [`export_module!`] routes registration through here so the unwind is
/// caught by the module's own runtime.
pub fn register_guarded(
    registrar: &mut dyn ModuleRegistrar,
    register: fn(&mut dyn ModuleRegistrar),
) {
    let outcome = InvocationFailure::guard(|| {
        register(&mut *registrar);
        Ok(())
    });
    if let Err(failure) = outcome {
        registrar.abort(failure);
    }
}

/// Exports a module declaration from a `cdylib`.
///
/// ```ignore
/// plugfy_sdk::export_module!(name: "plugfy-sample", version: "0.1.0", register: register);
/// ```
#[macro_export]
macro_rules! export_module {
    (name: $name:expr, version: $version:expr, register: $register:path $(,)?) => {
        #[doc(hidden)]
        fn __plugfy_register(registrar: &mut dyn $crate::ModuleRegistrar) {
            $crate::register_guarded(registrar, $register);
        }

        #[doc(hidden)]
        #[unsafe(no_mangle)]
        pub static PLUGFY_MODULE_DECLARATION: $crate::ModuleDeclaration =
            $crate::ModuleDeclaration::new($name, $version, __plugfy_register);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registrations;

    fn register(registrar: &mut dyn ModuleRegistrar) {
        registrar.register_class(ClassBuilder::<()>::new("Demo.Empty").build());
    }

    #[test]
    fn declaration_is_stamped_with_sdk_identity() {
        let declaration = ModuleDeclaration::new("demo", "2.1.0", register);
        assert!(declaration.is_compatible());
        assert_eq!(declaration.full_name(), "demo, Version=2.1.0");
        assert_eq!(declaration.sdk_version(), SDK_VERSION);
    }

    #[test]
    fn collect_runs_registration() {
        let declaration = ModuleDeclaration::new("demo", "2.1.0", register);
        let registrations = Registrations::collect(&declaration);
        let names: Vec<_> = registrations
            .classes()
            .iter()
            .map(ClassDefinition::name)
            .collect();
        assert_eq!(names, ["Demo.Empty"]);
        assert!(registrations.transports().is_empty());
    }

    fn register_then_panic(registrar: &mut dyn ModuleRegistrar) {
        register(registrar);
        panic!("registration exploded");
    }

    #[test]
    fn guarded_registration_reports_panics() {
        let mut registrations = Registrations::new();
        register_guarded(&mut registrations, register_then_panic);
        assert_eq!(
            registrations.failure().map(InvocationFailure::message),
            Some("registration exploded")
        );
    }

    mod exported {
        use super::register_then_panic;

        crate::export_module!(name: "broken", version: "0.0.1", register: register_then_panic);
    }

    #[test]
    fn exported_declaration_guards_registration() {
        let registrations = Registrations::collect(&exported::PLUGFY_MODULE_DECLARATION);
        assert!(registrations.failure().is_some());
        assert_eq!(registrations.classes().len(), 1);
    }

    #[test]
    fn declaration_symbol_is_nul_terminated() {
        assert_eq!(DECLARATION_SYMBOL.last(), Some(&0));
    }
}
