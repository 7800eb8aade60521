//! In-process collaborators for driving the CLI.

use std::ffi::OsString;
use std::sync::{Arc, Mutex};

use plugfy_config::Config;
use plugfy_sdk::Transport;

use super::{RecordingTransport, StaticModuleLoader};
use crate::cli::{AppError, ConfigLoader, Host};
use crate::error::RunnerError;
use crate::library::ModuleLoader;
use crate::telemetry::{LogSettings, TelemetryError};

/// Returns a fixed configuration regardless of the flags.
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Host serving one recording transport and in-process modules.
pub struct TestHost {
    loader: Arc<StaticModuleLoader>,
    transport: Arc<RecordingTransport>,
    settings: Mutex<Option<LogSettings>>,
}

impl TestHost {
    pub fn new(loader: StaticModuleLoader) -> Self {
        Self {
            loader: Arc::new(loader),
            transport: RecordingTransport::new(),
            settings: Mutex::new(None),
        }
    }

    /// The transport handed to the runner.
    pub fn transport(&self) -> &Arc<RecordingTransport> {
        &self.transport
    }

    /// Logging settings the runner asked for.
    pub fn settings(&self) -> Option<LogSettings> {
        self.settings.lock().expect("settings mutex poisoned").clone()
    }
}

impl Host for TestHost {
    fn module_loader(&self) -> Arc<dyn ModuleLoader> {
        self.loader.clone()
    }

    fn open_transport(
        &self,
        name: &str,
        _config: &Config,
    ) -> Result<Arc<dyn Transport>, RunnerError> {
        if name.eq_ignore_ascii_case(self.transport.name()) {
            Ok(self.transport.clone())
        } else {
            Err(RunnerError::UnsupportedTransport {
                name: name.to_owned(),
            })
        }
    }

    fn install_telemetry(&self, settings: &LogSettings) -> Result<(), TelemetryError> {
        *self.settings.lock().expect("settings mutex poisoned") = Some(settings.clone());
        Ok(())
    }
}
