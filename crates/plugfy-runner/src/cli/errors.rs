//! Setup failures reported by the CLI before a channel is serving commands.

use std::sync::Arc;

use thiserror::Error;

use crate::error::RunnerError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to configure logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("invalid {verb} content: {message}")]
    Content { verb: &'static str, message: String },
    #[error(transparent)]
    Runner(#[from] RunnerError),
}
