//! Structured telemetry initialisation for the runner.
//!
//! Logs always go to standard error: standard output belongs to the
//! `STDInOut` channel.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use plugfy_config::{Config, LogFormat};
use serde::Deserialize;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The `--log` argument is not a valid settings object.
    #[error("invalid logging parameters: {0}")]
    Parameters(String),
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogOverrides {
    filter: Option<String>,
    format: Option<String>,
}

/// Effective logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    filter: String,
    format: LogFormat,
}

impl LogSettings {
    /// Settings taken from configuration alone.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            filter: config.log_filter().to_owned(),
            format: config.log_format(),
        }
    }

    /// Applies the `--log` JSON object; either key overrides configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Parameters`] for invalid JSON, unknown keys,
    /// or an unknown format.
    pub fn with_overrides(mut self, parameters: Option<&str>) -> Result<Self, TelemetryError> {
        let Some(text) = parameters else {
            return Ok(self);
        };
        let overrides: LogOverrides = serde_json::from_str(text)
            .map_err(|error| TelemetryError::Parameters(error.to_string()))?;
        if let Some(filter) = overrides.filter {
            self.filter = filter;
        }
        if let Some(format) = overrides.format {
            self.format = format
                .parse()
                .map_err(|_| TelemetryError::Parameters(format!("unknown log format '{format}'")))?;
        }
        Ok(self)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching the global
/// state again.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or another
/// subscriber is already installed.
pub fn initialise(settings: &LogSettings) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(settings))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(settings: &LogSettings) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(settings.filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |env_filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match settings.format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
