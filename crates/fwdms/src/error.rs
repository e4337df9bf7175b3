//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fwdms_config::ConfigError;
use fwdms_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const STORAGE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the DMS: {message}")]
    #[diagnostic(
        code(fwdms::connection_failed),
        help(
            "Check that the service is up and that --server (or the profile's\n\
             `server`) points at it. Try: fwdms watch <DEVICE_ID>"
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request to the DMS timed out: {message}")]
    #[diagnostic(
        code(fwdms::timeout),
        help("Increase the timeout with --timeout or check service responsiveness.")
    )]
    Timeout { message: String },

    // ── Service ──────────────────────────────────────────────────────

    #[error("DMS rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(fwdms::service_error))]
    Service { status: u16, message: String },

    #[error("Firmware version '{version}' not found")]
    #[diagnostic(
        code(fwdms::not_found),
        help("Run: fwdms list <DEVICE_ID> to see the versions offered for the device")
    )]
    NotFound { version: String },

    #[error("DMS sent an unexpected response: {message}")]
    #[diagnostic(
        code(fwdms::malformed_response),
        help("Run with -vv to log the request URL; the server may not be a DMS.")
    )]
    MalformedResponse { message: String },

    // ── Local ────────────────────────────────────────────────────────

    #[error("Could not write firmware image to {path}: {message}")]
    #[diagnostic(
        code(fwdms::storage),
        help("Check free space and permissions, or pick another --download-dir.")
    )]
    Storage { path: String, message: String },

    #[error("Cannot start reachability monitor: {reason}")]
    #[diagnostic(code(fwdms::monitor_init))]
    MonitorInit { reason: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fwdms::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fwdms::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fwdms --profile {name} --server <URL> config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No DMS server configured")]
    #[diagnostic(
        code(fwdms::no_config),
        help(
            "Pass --server <URL>, set FWDMS_SERVER, or create a profile with:\n\
             fwdms --server <URL> config init\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(fwdms::config))]
    Config { message: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(fwdms::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(fwdms::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Storage { .. } => exit_code::STORAGE,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { message, timed_out } => {
                if timed_out {
                    CliError::Timeout { message }
                } else {
                    CliError::ConnectionFailed { message }
                }
            }
            CoreError::Service { status, message } => CliError::Service { status, message },
            CoreError::Parse { message } => CliError::MalformedResponse { message },
            CoreError::Storage { path, message } => CliError::Storage { path, message },
            CoreError::NotFound { version } => CliError::NotFound { version },
            CoreError::MonitorInit { reason } => CliError::MonitorInit { reason },
            CoreError::InvalidArgument { message } => CliError::Validation {
                field: "argument".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
