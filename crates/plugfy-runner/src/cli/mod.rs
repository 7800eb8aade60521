//! Command-line entry point for the runner.
//!
//! The CLI loads configuration, installs logging, opens the requested
//! transport, and hands the verb's command to a [`Session`]. Setup failures
//! are written to standard error and end the process with a failure code;
//! once the transport is open, every outcome travels over the channel.

mod config;
mod errors;
mod host;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use plugfy_config::DEFAULT_COMMUNICATION_TYPE;
use serde_json::{Map, Value};
use tracing::info;

pub(crate) use self::config::ConfigLoader;
use self::config::{OrthoConfigLoader, prepare_cli_arguments, split_config_arguments};
pub(crate) use self::errors::AppError;
pub(crate) use self::host::Host;
use self::host::NativeHost;
use crate::dispatch::{CommandEnvelope, CommandKind, CommandParameters, Dispatcher};
use crate::error::RunnerError;
use crate::introspect::Introspector;
use crate::invoke::InvocationEngine;
use crate::library::ModuleDirectory;
use crate::lifecycle::TracingLifecycleObserver;
use crate::session::Session;
use crate::telemetry::LogSettings;

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cli");

/// Dynamic execution host for Plugfy modules.
#[derive(Parser, Debug)]
#[command(name = "plugfy-runner", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Transport used to talk to the controller.
    #[arg(
        short = 't',
        long = "communicationType",
        global = true,
        default_value = DEFAULT_COMMUNICATION_TYPE
    )]
    pub(crate) communication_type: String,
    /// Keeps the channel open and serves inbound commands.
    #[arg(short = 'i', long = "interactive", global = true)]
    pub(crate) interactive: bool,
    /// JSON parameters forwarded to transport initialisation.
    #[arg(short = 'c', long = "caller", global = true)]
    pub(crate) caller: Option<String>,
    /// JSON logging parameters: `{"filter": ..., "format": ...}`.
    #[arg(short = 'l', long = "log", global = true)]
    pub(crate) log: Option<String>,
    /// Verb to execute.
    #[command(subcommand)]
    pub(crate) verb: Verb,
}

/// Runner verbs.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Verb {
    /// Lists the modules in the libraries directory.
    List,
    /// Describes one module.
    Info {
        /// JSON object carrying `AssemblyName`.
        #[arg(value_name = "JSON_CONTENT")]
        json_content: String,
    },
    /// Invokes a method.
    Run {
        /// JSON object carrying `Assembly`, `Class`, `Method`, and arguments.
        #[arg(value_name = "JSON_CONTENT")]
        json_content: String,
    },
}

impl Verb {
    /// Builds the envelope the verb stands for.
    pub(crate) fn to_envelope(&self) -> Result<CommandEnvelope, AppError> {
        match self {
            Self::List => Ok(CommandEnvelope::new(
                CommandKind::List,
                CommandParameters::default(),
            )),
            Self::Info { json_content } => Ok(CommandEnvelope::new(
                CommandKind::Info,
                content_parameters("info", json_content)?,
            )),
            Self::Run { json_content } => Ok(CommandEnvelope::new(
                CommandKind::Run,
                content_parameters("run", json_content)?,
            )),
        }
    }
}

fn content_parameters(verb: &'static str, text: &str) -> Result<CommandParameters, AppError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Ok(CommandParameters::new(object)),
        Ok(Value::Null) => Ok(CommandParameters::new(Map::new())),
        Ok(_) => Err(AppError::Content {
            verb,
            message: "expected a JSON object".to_owned(),
        }),
        Err(error) => Err(AppError::Content {
            verb,
            message: error.to_string(),
        }),
    }
}

struct CliRunner<'a, W: Write, E: Write> {
    stdout: &'a mut W,
    stderr: &'a mut E,
    loader: &'a dyn ConfigLoader,
    host: &'a dyn Host,
}

impl<W: Write, E: Write> CliRunner<'_, W, E> {
    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);
        let cli = match Cli::try_parse_from(prepare_cli_arguments(&args, &split)) {
            Ok(cli) => cli,
            Err(error) if is_informational(&error) => {
                return match write!(self.stdout, "{error}") {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(_) => ExitCode::FAILURE,
                };
            }
            Err(error) => return self.fail(&AppError::CliUsage(error)),
        };

        match self.execute(&cli, &split.config_arguments) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => self.fail(&error),
        }
    }

    fn execute(&self, cli: &Cli, config_arguments: &[OsString]) -> Result<(), AppError> {
        let config = self.loader.load(config_arguments)?;
        let settings = LogSettings::from_config(&config).with_overrides(cli.log.as_deref())?;
        self.host.install_telemetry(&settings)?;
        let envelope = cli.verb.to_envelope()?;

        let transport = self.host.open_transport(&cli.communication_type, &config)?;
        transport
            .initialize(cli.caller.as_deref())
            .map_err(RunnerError::from)?;
        info!(
            target: CLI_TARGET,
            transport = transport.name(),
            libraries = %config.libraries_path(),
            interactive = cli.interactive,
            "runner started"
        );

        let modules = ModuleDirectory::new(
            config.libraries_path().to_path_buf(),
            self.host.module_loader(),
        );
        let engine = InvocationEngine::new(modules.clone())
            .with_observer(Arc::new(TracingLifecycleObserver::new()));
        let session = Session::new(Dispatcher::new(Introspector::new(modules), engine), transport);
        if cli.interactive {
            // `list` only opens the channel; `info` and `run` serve their content first.
            let initial = (envelope.kind() != &CommandKind::List).then_some(envelope);
            session.run_interactive(initial)?;
        } else {
            session.run_once(&envelope);
        }
        Ok(())
    }

    fn fail(&mut self, error: &AppError) -> ExitCode {
        let message = error.to_string();
        let _ = writeln!(self.stderr, "{}", message.trim_end());
        ExitCode::FAILURE
    }
}

fn is_informational(error: &clap::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(args, stdout, stderr, &OrthoConfigLoader, &NativeHost)
}

/// Runs the CLI with substitute configuration and host collaborators.
pub(crate) fn run_with<I, W, E>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &dyn ConfigLoader,
    host: &dyn Host,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    CliRunner {
        stdout,
        stderr,
        loader,
        host,
    }
    .run(args)
}
