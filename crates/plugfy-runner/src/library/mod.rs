//! Loading modules from disk.
//!
//! A [`ModuleLoader`] turns a file path into a [`LoadedModule`]: the module's
//! identity plus the classes and transport factories its declaration
//! registers. [`DynamicLibraryLoader`] opens native libraries with
//! `libloading`; tests substitute in-process loaders. [`ModuleDirectory`]
//! resolves module names against the configured libraries directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use libloading::{Library, Symbol};
use plugfy_sdk::registry::Registrations;
use plugfy_sdk::{ClassDefinition, DECLARATION_SYMBOL, ModuleDeclaration, TransportFactory};
use tracing::debug;

use crate::error::RunnerError;

const LIBRARY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::library");

/// A module whose registrations have been collected.
///
/// Fields drop in declaration order, so registrations are released before the
/// library that contains their code.
#[derive(Debug)]
pub struct LoadedModule {
    file_name: String,
    full_name: String,
    classes: Vec<ClassDefinition>,
    transports: Vec<TransportFactory>,
    library: Option<Library>,
}

impl LoadedModule {
    /// Collects the registrations of `declaration`.
    ///
    /// `library` is the native library holding the declaration, if any; it
    /// stays loaded for as long as the module lives.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ModuleLoad`] when the module aborts its own
    /// registration.
    pub fn from_declaration(
        file_name: impl Into<String>,
        declaration: &ModuleDeclaration,
        library: Option<Library>,
    ) -> Result<Self, RunnerError> {
        let file_name = file_name.into();
        let registrations = Registrations::collect(declaration);
        if let Some(failure) = registrations.failure() {
            return Err(RunnerError::module_load(
                &file_name,
                format!("registration failed: {}", failure.message()),
            ));
        }
        let (classes, transports) = registrations.into_parts();
        Ok(Self {
            file_name,
            full_name: declaration.full_name(),
            classes,
            transports,
            library,
        })
    }

    /// File name the module was loaded from.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Module identity, e.g. `plugfy-sample, Version=0.1.0`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Registered classes in registration order.
    #[must_use]
    pub fn classes(&self) -> &[ClassDefinition] {
        &self.classes
    }

    /// Class registered under exactly `name`.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.iter().find(|class| class.name() == name)
    }

    /// Registered transport factories in registration order.
    #[must_use]
    pub fn transport_factories(&self) -> &[TransportFactory] {
        &self.transports
    }

    /// Keeps the backing library mapped until the process exits.
    ///
    /// Transport plugins run background threads whose code lives in the
    /// library, so their libraries must never be unloaded.
    pub fn keep_resident(&mut self) {
        if let Some(library) = self.library.take() {
            std::mem::forget(library);
        }
    }
}

/// Opens module files.
pub trait ModuleLoader: Send + Sync {
    /// Loads the module stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ModuleLoad`] when the file cannot be opened,
    /// lacks a declaration, or was built by an incompatible SDK.
    fn load(&self, path: &Path) -> Result<LoadedModule, RunnerError>;

    /// Whether `path` names a loadable module file.
    fn is_module_file(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|extension| extension == std::env::consts::DLL_EXTENSION)
    }
}

/// Loads native dynamic libraries built against `plugfy-sdk`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicLibraryLoader;

impl ModuleLoader for DynamicLibraryLoader {
    fn load(&self, path: &Path) -> Result<LoadedModule, RunnerError> {
        let file_name = display_file_name(path);
        debug!(target: LIBRARY_TARGET, module = %file_name, "opening library");

        // SAFETY: opening a library runs its initialisers. Modules are trusted
        // to the extent the operator placed them in a configured directory.
        let library = unsafe { Library::new(path) }
            .map_err(|error| RunnerError::module_load(&file_name, error.to_string()))?;

        // SAFETY: the symbol is exported by `export_module!` with this type.
        // The declaration is copied out before the symbol borrow ends.
        let declaration = unsafe {
            let symbol: Symbol<'_, *const ModuleDeclaration> = library
                .get(DECLARATION_SYMBOL)
                .map_err(|error| RunnerError::module_load(&file_name, error.to_string()))?;
            **symbol
        };

        if !declaration.is_compatible() {
            return Err(RunnerError::module_load(
                &file_name,
                format!(
                    "built with plugfy-sdk {} ({}), runner uses {} ({})",
                    declaration.sdk_version(),
                    declaration.rustc_version(),
                    plugfy_sdk::SDK_VERSION,
                    plugfy_sdk::RUSTC_VERSION,
                ),
            ));
        }

        LoadedModule::from_declaration(file_name, &declaration, Some(library))
    }
}

/// The configured libraries directory.
#[derive(Clone)]
pub struct ModuleDirectory {
    path: Utf8PathBuf,
    loader: Arc<dyn ModuleLoader>,
}

impl ModuleDirectory {
    /// Creates a directory view backed by `loader`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            path: path.into(),
            loader,
        }
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loader used to open modules.
    #[must_use]
    pub fn loader(&self) -> &dyn ModuleLoader {
        self.loader.as_ref()
    }

    /// File names of every module in the directory, in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::DirectoryNotFound`] when the directory is
    /// missing.
    pub fn list(&self) -> Result<Vec<String>, RunnerError> {
        let files = module_files(self.path.as_std_path(), self.loader.as_ref()).map_err(
            |error| match error.kind() {
                io::ErrorKind::NotFound => RunnerError::DirectoryNotFound {
                    path: self.path.clone(),
                },
                _ => RunnerError::configuration(format!(
                    "cannot read libraries directory '{}': {error}",
                    self.path
                )),
            },
        )?;
        Ok(files.iter().map(|path| display_file_name(path)).collect())
    }

    /// Resolves `name` to an existing module file.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidModuleName`] when `name` is not a plain
    /// file name and [`RunnerError::ModuleNotFound`] when no such file exists.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, RunnerError> {
        validate_module_name(name)?;
        let path = self.path.as_std_path().join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(RunnerError::ModuleNotFound {
                name: name.to_owned(),
            })
        }
    }

    /// Resolves and loads the module called `name`.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures and [`RunnerError::ModuleLoad`].
    pub fn load(&self, name: &str) -> Result<LoadedModule, RunnerError> {
        let path = self.resolve(name)?;
        self.loader.load(&path)
    }
}

impl std::fmt::Debug for ModuleDirectory {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ModuleDirectory")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Lists loadable module files in `directory`, in enumeration order.
///
/// # Errors
///
/// Returns the I/O error raised while reading the directory.
pub fn module_files(directory: &Path, loader: &dyn ModuleLoader) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() && loader.is_module_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

/// Rejects names that are not a single plain file name.
///
/// # Errors
///
/// Returns [`RunnerError::InvalidModuleName`] for empty names, names with
/// directory components, and `.`/`..`.
pub fn validate_module_name(name: &str) -> Result<(), RunnerError> {
    let candidate = Path::new(name);
    let plain = candidate.components().count() == 1
        && candidate
            .file_name()
            .is_some_and(|file_name| file_name == name);
    if plain {
        Ok(())
    } else {
        Err(RunnerError::InvalidModuleName {
            name: name.to_owned(),
        })
    }
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
}

#[cfg(test)]
mod tests;
