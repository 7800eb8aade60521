//! Transport discovery.
//!
//! Transport plugins are modules that register transport factories. The
//! loader scans the directory configured for the requested transport,
//! instantiates every factory it finds, and keeps the first channel whose
//! self-reported name matches.

use std::path::Path;

use plugfy_sdk::{MessageHandler, Transport, TransportError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::RunnerError;
use crate::library::{LoadedModule, ModuleLoader, module_files};

const EXTENSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::extension");

/// A transport together with the module that provides it.
pub struct LoadedTransport {
    transport: Box<dyn Transport>,
    module: LoadedModule,
}

impl LoadedTransport {
    fn new(transport: Box<dyn Transport>, mut module: LoadedModule) -> Self {
        module.keep_resident();
        Self { transport, module }
    }

    /// File name of the module providing the transport.
    #[must_use]
    pub fn module_file_name(&self) -> &str {
        self.module.file_name()
    }
}

impl std::fmt::Debug for LoadedTransport {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LoadedTransport")
            .field("name", &self.transport.name())
            .field("module", &self.module.file_name())
            .finish()
    }
}

impl Transport for LoadedTransport {
    fn name(&self) -> &str {
        self.transport.name()
    }

    fn initialize(&self, parameters: Option<&str>) -> Result<(), TransportError> {
        self.transport.initialize(parameters)
    }

    fn send(&self, payload: &Value) -> Result<(), TransportError> {
        self.transport.send(payload)
    }

    fn subscribe(&self, handler: MessageHandler) -> Result<(), TransportError> {
        self.transport.subscribe(handler)
    }

    fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    fn close(&self) {
        self.transport.close();
    }
}

/// Finds the transport called `name` among the modules in `directory`.
///
/// Names match case-insensitively; the first match in directory order wins.
/// Modules that fail to load are skipped.
///
/// # Errors
///
/// Returns [`RunnerError::Configuration`] when no directory is configured or
/// it does not exist, and [`RunnerError::UnsupportedTransport`] when no module
/// provides the transport.
pub fn load_transport(
    loader: &dyn ModuleLoader,
    name: &str,
    directory: Option<&Path>,
) -> Result<LoadedTransport, RunnerError> {
    let directory = directory.ok_or_else(|| {
        RunnerError::configuration(format!(
            "no plugin directory is configured for transport '{name}'"
        ))
    })?;
    if !directory.is_dir() {
        return Err(RunnerError::configuration(format!(
            "plugin directory '{}' for transport '{name}' does not exist",
            directory.display()
        )));
    }

    let candidates = module_files(directory, loader).map_err(|error| {
        RunnerError::configuration(format!(
            "cannot read plugin directory '{}': {error}",
            directory.display()
        ))
    })?;

    for path in candidates {
        let module = match loader.load(&path) {
            Ok(module) => module,
            Err(error) => {
                warn!(
                    target: EXTENSION_TARGET,
                    path = %path.display(),
                    %error,
                    "skipping transport module"
                );
                continue;
            }
        };

        let factories = module.transport_factories().to_vec();
        for factory in factories {
            let transport = factory();
            debug!(
                target: EXTENSION_TARGET,
                module = module.file_name(),
                candidate = transport.name(),
                "instantiated transport"
            );
            if transport.name().eq_ignore_ascii_case(name) {
                info!(
                    target: EXTENSION_TARGET,
                    module = module.file_name(),
                    transport = transport.name(),
                    "transport selected"
                );
                return Ok(LoadedTransport::new(transport, module));
            }
        }
    }

    Err(RunnerError::UnsupportedTransport {
        name: name.to_owned(),
    })
}
