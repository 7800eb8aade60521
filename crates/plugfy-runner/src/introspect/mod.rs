//! Read-only structural introspection of modules.

use plugfy_sdk::ModuleDescriptor;
use tracing::debug;

use crate::error::RunnerError;
use crate::library::ModuleDirectory;

const INTROSPECT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::introspect");

/// Lists and describes the modules in the libraries directory.
#[derive(Debug, Clone)]
pub struct Introspector {
    modules: ModuleDirectory,
}

impl Introspector {
    /// Creates an introspector over `modules`.
    #[must_use]
    pub const fn new(modules: ModuleDirectory) -> Self {
        Self { modules }
    }

    /// File names of every module, in directory-enumeration order.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::DirectoryNotFound`] when the libraries directory
    /// is missing.
    pub fn list_modules(&self) -> Result<Vec<String>, RunnerError> {
        let names = self.modules.list()?;
        debug!(
            target: INTROSPECT_TARGET,
            directory = %self.modules.path(),
            count = names.len(),
            "listed modules"
        );
        Ok(names)
    }

    /// Describes every class the module called `name` registers.
    ///
    /// The module is loaded afresh on every call.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidModuleName`],
    /// [`RunnerError::ModuleNotFound`] or [`RunnerError::ModuleLoad`].
    pub fn describe_module(&self, name: &str) -> Result<ModuleDescriptor, RunnerError> {
        let module = self.modules.load(name)?;
        let types = module.classes().iter().map(|class| class.describe()).collect();
        debug!(
            target: INTROSPECT_TARGET,
            module = name,
            full_name = module.full_name(),
            "described module"
        );
        Ok(ModuleDescriptor::new(module.full_name(), types))
    }
}

#[cfg(test)]
mod tests;
