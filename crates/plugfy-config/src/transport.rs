use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing [`TransportDirective`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportDirectiveParseError {
    /// The `=` separating name and directory was missing.
    #[error("transport directive '{0}' is missing the assignment '='")]
    MissingAssignment(String),
    /// The transport name was empty.
    #[error("transport directive '{0}' has an empty transport name")]
    EmptyName(String),
    /// The plugin directory was empty.
    #[error("transport directive '{0}' has an empty directory")]
    EmptyDirectory(String),
}

/// Maps a transport name to the directory holding its plugin libraries.
///
/// Directives are written as `<name>=<directory>`, for example
/// `STDInOut=./transports`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransportDirective {
    name: String,
    directory: Utf8PathBuf,
}

impl TransportDirective {
    /// Creates a new directive.
    #[must_use]
    pub fn new(name: impl Into<String>, directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }

    /// Transport name as written.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plugin directory for the transport.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }
}

impl fmt::Display for TransportDirective {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}={}", self.name, self.directory)
    }
}

impl FromStr for TransportDirective {
    type Err = TransportDirectiveParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (name, directory) = input
            .split_once('=')
            .ok_or_else(|| TransportDirectiveParseError::MissingAssignment(input.to_owned()))?;
        let trimmed_name = name.trim();
        if trimmed_name.is_empty() {
            return Err(TransportDirectiveParseError::EmptyName(input.to_owned()));
        }
        let trimmed_directory = directory.trim();
        if trimmed_directory.is_empty() {
            return Err(TransportDirectiveParseError::EmptyDirectory(
                input.to_owned(),
            ));
        }
        Ok(Self::new(trimmed_name, trimmed_directory))
    }
}

impl TryFrom<String> for TransportDirective {
    type Error = TransportDirectiveParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransportDirective> for String {
    fn from(directive: TransportDirective) -> Self {
        directive.to_string()
    }
}

/// Transport directories keyed by case-folded name.
///
/// Later directives replace earlier ones for the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportDirectories {
    directories: BTreeMap<String, Utf8PathBuf>,
}

impl TransportDirectories {
    /// Builds the table from directives in precedence order.
    #[must_use]
    pub fn from_directives<'a, I>(directives: I) -> Self
    where
        I: IntoIterator<Item = &'a TransportDirective>,
    {
        let directories = directives
            .into_iter()
            .map(|directive| (normalise_key(directive.name()), directive.directory.clone()))
            .collect();
        Self { directories }
    }

    /// Directory configured for `name`, matched case-insensitively.
    #[must_use]
    pub fn directory_for(&self, name: &str) -> Option<&Utf8Path> {
        self.directories
            .get(&normalise_key(name))
            .map(Utf8PathBuf::as_path)
    }

    /// Number of configured transports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.directories.len()
    }

    /// Whether no transport is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

fn normalise_key(key: &str) -> String {
    key.trim().to_lowercase()
}
