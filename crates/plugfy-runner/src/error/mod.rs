//! Failure taxonomy for the runner.
//!
//! Every failure the runner can report carries a stable taxonomy name via
//! [`RunnerError::kind`]; controllers receive that name in failure payloads
//! and `error` lifecycle events. Loader errors are flattened to messages so
//! the enum stays `Clone`.

use camino::Utf8PathBuf;
use plugfy_sdk::{ConversionError, InvocationFailure, TransportError};
use thiserror::Error;

/// Errors raised while resolving, loading, or invoking modules.
#[derive(Debug, Clone, Error)]
pub enum RunnerError {
    /// A required setting is missing or unusable.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// The libraries directory does not exist.
    #[error("libraries directory '{path}' does not exist")]
    DirectoryNotFound {
        /// Directory that was checked.
        path: Utf8PathBuf,
    },

    /// The named module file does not exist.
    #[error("module '{name}' was not found")]
    ModuleNotFound {
        /// Module file name that was requested.
        name: String,
    },

    /// The module name is not a plain file name.
    #[error("module name '{name}' must be a plain file name")]
    InvalidModuleName {
        /// Rejected name.
        name: String,
    },

    /// The module file exists but could not be loaded.
    #[error("module '{name}' could not be loaded: {message}")]
    ModuleLoad {
        /// Module file name.
        name: String,
        /// Loader message.
        message: String,
    },

    /// The module declares no class with the requested name.
    #[error("class '{class}' was not found in module '{module}'")]
    ClassNotFound {
        /// Module file name.
        module: String,
        /// Requested class.
        class: String,
    },

    /// The class declares no method with the requested name.
    #[error("method '{method}' was not found on class '{class}'")]
    MethodNotFound {
        /// Class name.
        class: String,
        /// Requested method.
        method: String,
    },

    /// No constructor accepts the supplied argument count.
    #[error("class '{class}' has no constructor taking {arity} argument(s)")]
    ConstructorNotFound {
        /// Class name.
        class: String,
        /// Number of constructor arguments supplied.
        arity: usize,
    },

    /// An argument could not be converted to its declared type.
    #[error("argument {position} of '{member}': {source}")]
    ArgumentConversion {
        /// Constructor or method being called.
        member: String,
        /// Zero-based argument position.
        position: usize,
        /// Underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// The argument count differs from the declared parameter count.
    #[error("'{member}' expects {expected} argument(s) but received {actual}")]
    ParameterCountMismatch {
        /// Constructor or method being called.
        member: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// No transport plugin reports the requested name.
    #[error("transport '{name}' is not supported")]
    UnsupportedTransport {
        /// Requested transport name.
        name: String,
    },

    /// Module code failed or panicked.
    #[error("'{member}' failed: {source}")]
    Invocation {
        /// Constructor or method being called.
        member: String,
        /// Failure raised by the module.
        #[source]
        source: InvocationFailure,
    },

    /// An inbound command could not be understood.
    #[error("invalid command: {message}")]
    InvalidCommand {
        /// Description of the problem.
        message: String,
    },

    /// The interactive queue is full.
    #[error("runner is busy: {pending} command(s) already queued")]
    Busy {
        /// Queue capacity that was exhausted.
        pending: usize,
    },

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RunnerError {
    /// Taxonomy name reported to controllers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "ConfigurationError",
            Self::DirectoryNotFound { .. } => "DirectoryNotFoundError",
            Self::ModuleNotFound { .. } => "ModuleNotFoundError",
            Self::InvalidModuleName { .. } => "InvalidModuleNameError",
            Self::ModuleLoad { .. } => "ModuleLoadError",
            Self::ClassNotFound { .. } => "ClassNotFoundError",
            Self::MethodNotFound { .. } => "MethodNotFoundError",
            Self::ConstructorNotFound { .. } => "ConstructorNotFoundError",
            Self::ArgumentConversion { .. } => "ArgumentConversionError",
            Self::ParameterCountMismatch { .. } => "ParameterCountMismatchError",
            Self::UnsupportedTransport { .. } => "UnsupportedTransportError",
            Self::Invocation { .. } => "InvocationFailure",
            Self::InvalidCommand { .. } => "InvalidCommandError",
            Self::Busy { .. } => "RunnerBusyError",
            Self::Transport(_) => "TransportError",
        }
    }

    /// Message of the innermost failure.
    ///
    /// Module failures report the module's own message and conversion
    /// failures the converter's; every other error reports its full
    /// description.
    #[must_use]
    pub fn innermost_message(&self) -> String {
        match self {
            Self::Invocation { source, .. } => source.message().to_owned(),
            Self::ArgumentConversion { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    /// Builds a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Builds an invalid command error.
    #[must_use]
    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Builds a module load error.
    #[must_use]
    pub fn module_load(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModuleLoad {
            name: name.into(),
            message: message.into(),
        }
    }
}
