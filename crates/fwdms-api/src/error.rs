use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `fwdms-api` crate.
///
/// Covers every failure mode of the DMS wire surface: transport,
/// service-side rejections, payload decoding, and local file I/O during
/// image downloads. `fwdms-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The body ended before the advertised `Content-Length` was reached.
    #[error("Download truncated: expected {expected} bytes, received {received}")]
    Truncated { expected: u64, received: u64 },

    // ── Service ─────────────────────────────────────────────────────
    /// Non-success HTTP status from the DMS.
    #[error("DMS error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// The requested firmware version does not exist for this device.
    #[error("Firmware version {version} not found")]
    NotFound { version: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Local storage ───────────────────────────────────────────────
    /// Writing the downloaded image to disk failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            Self::Timeout { .. } | Self::Truncated { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
