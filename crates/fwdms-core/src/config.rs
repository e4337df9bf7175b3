// ── Runtime session configuration ──
//
// These types describe *how* to reach the DMS and where to put downloaded
// images. They never touch disk; the CLI (via fwdms-config) builds a
// `SessionConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use fwdms_api::transport::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default for the public service.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed staging servers).
    DangerAcceptInvalid,
}

/// Configuration shared by every session talking to one DMS instance.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service root, e.g. `https://dms.example.com`.
    pub base_url: Url,
    /// Optional API key sent as `X-API-Key`.
    pub api_key: Option<SecretString>,
    /// Root directory for downloaded images.
    /// Images land at `{download_dir}/{device_id}/{version}.bin`.
    pub download_dir: PathBuf,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout. Expiry surfaces as a network error.
    pub timeout: Duration,
    /// How often the reachability monitor probes the service host.
    pub probe_interval: Duration,
    /// How long a single reachability probe may take.
    pub probe_timeout: Duration,
}

impl SessionConfig {
    /// Configuration for `base_url` with default tuning.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            download_dir: std::env::temp_dir().join("fwdms"),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            probe_interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(3),
        }
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Translate into the api-level transport settings.
    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            api_key: self.api_key.clone(),
        }
    }
}
