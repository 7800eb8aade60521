//! Inbound command envelopes.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::RunnerError;

/// Command named by an envelope's `Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Enumerate the libraries directory.
    List,
    /// Describe one module.
    Info,
    /// Invoke a method.
    Run,
    /// Close the channel.
    Exit,
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl FromStr for CommandKind {
    type Err = Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let kind = match input.to_ascii_lowercase().as_str() {
            "list" => Self::List,
            "info" => Self::Info,
            "run" => Self::Run,
            "exit" => Self::Exit,
            _ => Self::Unknown(input.to_owned()),
        };
        Ok(kind)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => formatter.write_str("list"),
            Self::Info => formatter.write_str("info"),
            Self::Run => formatter.write_str("run"),
            Self::Exit => formatter.write_str("exit"),
            Self::Unknown(kind) => formatter.write_str(kind),
        }
    }
}

/// Named command parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandParameters(Map<String, Value>);

impl CommandParameters {
    /// Wraps a parameter object.
    #[must_use]
    pub const fn new(parameters: Map<String, Value>) -> Self {
        Self(parameters)
    }

    /// Value under `key`, falling back to a case-insensitive match.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).or_else(|| {
            self.0
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
    }

    /// Non-empty string under `key`.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
    }

    /// The underlying object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// A command with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    kind: CommandKind,
    parameters: CommandParameters,
}

impl CommandEnvelope {
    /// Creates an envelope.
    #[must_use]
    pub const fn new(kind: CommandKind, parameters: CommandParameters) -> Self {
        Self { kind, parameters }
    }

    /// Parses `{"Type": ..., "Parameters": {...}}`; keys match
    /// case-insensitively and `Parameters` may be omitted.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidCommand`] for malformed JSON, a missing
    /// or non-string `Type`, or non-object `Parameters`.
    pub fn parse(text: &str) -> Result<Self, RunnerError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|error| RunnerError::invalid_command(format!("malformed JSON: {error}")))?;
        let Value::Object(object) = value else {
            return Err(RunnerError::invalid_command("expected a JSON object"));
        };
        let fields = CommandParameters::new(object);

        let kind = fields
            .get("Type")
            .and_then(Value::as_str)
            .ok_or_else(|| RunnerError::invalid_command("missing string field 'Type'"))?;
        let parameters = match fields.get("Parameters") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(parameters)) => parameters.clone(),
            Some(_) => {
                return Err(RunnerError::invalid_command(
                    "field 'Parameters' must be an object",
                ));
            }
        };

        Ok(Self::new(
            kind.parse::<CommandKind>()
                .unwrap_or_else(|never| match never {}),
            CommandParameters::new(parameters),
        ))
    }

    /// Command kind.
    #[must_use]
    pub const fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// Command parameters.
    #[must_use]
    pub const fn parameters(&self) -> &CommandParameters {
        &self.parameters
    }
}
