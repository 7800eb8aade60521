use camino::Utf8PathBuf;

/// Directory scanned for target modules when none is configured.
pub const DEFAULT_LIBRARIES_PATH: &str = "./libraries";

/// Default log filter expression used by the runner.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default transport requested when the caller names none.
pub const DEFAULT_COMMUNICATION_TYPE: &str = "STDInOut";

/// Default directory of target modules.
#[must_use]
pub fn default_libraries_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_LIBRARIES_PATH)
}

/// Default log filter expression used by the runner.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the runner.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
