// ── Core error types ──
//
// Caller-facing errors from fwdms-core. Consumers see one of a small set
// of kinds (network, service, parse, storage, not-found) rather than raw
// HTTP or JSON failures. The `From<fwdms_api::Error>` impl does the
// translation.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session construction ─────────────────────────────────────────
    #[error("Cannot start reachability monitor: {reason}")]
    MonitorInit { reason: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// Transient transport failure; the caller may retry.
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    /// The service answered but rejected the request.
    #[error("Service rejected request (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// The service answered with something that is not a firmware catalog.
    #[error("Malformed service response: {message}")]
    Parse { message: String },

    /// Writing the firmware image locally failed.
    #[error("Storage error at {path}: {message}")]
    Storage { path: String, message: String },

    #[error("Firmware version not found: {version}")]
    NotFound { version: String },
}

impl CoreError {
    /// Returns `true` if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the request gave up waiting on the service.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network { timed_out: true, .. })
    }

    pub(crate) fn monitor_init(reason: impl Into<String>) -> Self {
        Self::MonitorInit {
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fwdms_api::Error> for CoreError {
    fn from(err: fwdms_api::Error) -> Self {
        match err {
            fwdms_api::Error::Transport(ref e) => {
                if e.is_decode() {
                    CoreError::Parse {
                        message: e.to_string(),
                    }
                } else if let Some(status) = e.status() {
                    CoreError::Service {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    CoreError::Network {
                        message: e.to_string(),
                        timed_out: e.is_timeout(),
                    }
                }
            }
            fwdms_api::Error::Timeout { timeout } => CoreError::Network {
                message: format!("request timed out after {timeout:?}"),
                timed_out: true,
            },
            e @ fwdms_api::Error::Truncated { .. } => CoreError::Network {
                message: e.to_string(),
                timed_out: false,
            },
            fwdms_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            fwdms_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            fwdms_api::Error::Status { status, message } => CoreError::Service { status, message },
            fwdms_api::Error::NotFound { version } => CoreError::NotFound { version },
            fwdms_api::Error::Deserialization { message, body: _ } => CoreError::Parse { message },
            fwdms_api::Error::Io { path, source } => CoreError::Storage {
                path,
                message: source.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_caller_kinds() {
        let not_found = CoreError::from(fwdms_api::Error::NotFound {
            version: "9.9.9".into(),
        });
        assert!(matches!(not_found, CoreError::NotFound { ref version } if version == "9.9.9"));

        let service = CoreError::from(fwdms_api::Error::Status {
            status: 502,
            message: "bad gateway".into(),
        });
        assert!(matches!(service, CoreError::Service { status: 502, .. }));
        assert!(service.is_transient());

        let parse = CoreError::from(fwdms_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        });
        assert!(matches!(parse, CoreError::Parse { .. }));
        assert!(!parse.is_transient());

        let truncated = CoreError::from(fwdms_api::Error::Truncated {
            expected: 10,
            received: 4,
        });
        assert!(matches!(truncated, CoreError::Network { .. }));
        assert!(!truncated.is_timeout());

        let timeout = CoreError::from(fwdms_api::Error::Timeout {
            timeout: std::time::Duration::from_millis(500),
        });
        assert!(timeout.is_timeout());
        assert!(timeout.to_string().contains("500ms"), "{timeout}");
        assert!(timeout.is_transient());

        let storage = CoreError::from(fwdms_api::Error::Io {
            path: "/tmp/x".into(),
            source: std::io::Error::other("disk full"),
        });
        assert!(matches!(storage, CoreError::Storage { ref path, .. } if path == "/tmp/x"));
    }
}
