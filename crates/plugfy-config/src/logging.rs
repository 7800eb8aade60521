//! Log line format for the runner's diagnostics.
//!
//! Diagnostics are written to standard error; standard output belongs to the
//! `STDInOut` transport and never carries log lines.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the runner renders its diagnostic log lines.
///
/// Configuration layers use the lower-case spelling; the runner's `--log`
/// override parses the name in any letter case.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with fields flattened, for log collectors
    /// watching the controller's child process.
    #[default]
    Json,
    /// Terse single-line text for a person running the runner by hand.
    Compact,
}

/// Rejected log format name.
pub type LogFormatParseError = strum::ParseError;
