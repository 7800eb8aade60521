//! Process-level collaborators the CLI depends on.

use std::sync::Arc;

use plugfy_config::Config;
use plugfy_sdk::Transport;

use crate::error::RunnerError;
use crate::extension::load_transport;
use crate::library::{DynamicLibraryLoader, ModuleLoader};
use crate::telemetry::{self, LogSettings, TelemetryError};

/// Supplies the module loader, transport, and logging for one run.
pub(crate) trait Host {
    /// Loader used for target modules.
    fn module_loader(&self) -> Arc<dyn ModuleLoader>;

    /// Opens the transport called `name` using the configured directories.
    fn open_transport(&self, name: &str, config: &Config)
    -> Result<Arc<dyn Transport>, RunnerError>;

    /// Installs logging.
    fn install_telemetry(&self, settings: &LogSettings) -> Result<(), TelemetryError>;
}

/// Host backed by native libraries and the global tracing subscriber.
pub(crate) struct NativeHost;

impl Host for NativeHost {
    fn module_loader(&self) -> Arc<dyn ModuleLoader> {
        Arc::new(DynamicLibraryLoader)
    }

    fn open_transport(
        &self,
        name: &str,
        config: &Config,
    ) -> Result<Arc<dyn Transport>, RunnerError> {
        let directory = config.transport_directory(name);
        let transport = load_transport(
            &DynamicLibraryLoader,
            name,
            directory.as_ref().map(|path| path.as_std_path()),
        )?;
        Ok(Arc::new(transport))
    }

    fn install_telemetry(&self, settings: &LogSettings) -> Result<(), TelemetryError> {
        telemetry::initialise(settings).map(|_| ())
    }
}
