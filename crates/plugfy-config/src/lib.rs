//! Layered configuration for the Plugfy runner.
//!
//! Values resolve from defaults, then a TOML file (`--config-path` or
//! `PLUGFY_CONFIG_PATH`), then `PLUGFY_*` environment variables, then
//! command-line flags placed before the runner's verb.

mod defaults;
mod logging;
mod transport;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_COMMUNICATION_TYPE, DEFAULT_LIBRARIES_PATH, DEFAULT_LOG_FILTER,
    default_libraries_path, default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use transport::{TransportDirective, TransportDirectiveParseError, TransportDirectories};

/// Resolved runner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PLUGFY")]
pub struct Config {
    /// Directory holding the target modules (`LibrariesPath`).
    #[ortho_config(default = default_libraries_path())]
    pub libraries_path: Utf8PathBuf,
    /// Transport plugin directories as `<name>=<directory>` directives.
    #[serde(default)]
    #[ortho_config(merge_strategy = "append")]
    pub transports: Vec<TransportDirective>,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            libraries_path: default_libraries_path(),
            transports: Vec::new(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Directory holding the target modules.
    #[must_use]
    pub fn libraries_path(&self) -> &Utf8Path {
        &self.libraries_path
    }

    /// Transport directories keyed case-insensitively; the last directive per
    /// name wins.
    #[must_use]
    pub fn transport_directories(&self) -> TransportDirectories {
        TransportDirectories::from_directives(&self.transports)
    }

    /// Directory configured for the transport called `name`.
    #[must_use]
    pub fn transport_directory(&self, name: &str) -> Option<Utf8PathBuf> {
        self.transport_directories()
            .directory_for(name)
            .map(Utf8Path::to_path_buf)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
