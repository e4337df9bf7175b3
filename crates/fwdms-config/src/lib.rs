//! Configuration for the fwdms CLI.
//!
//! TOML profiles, API key resolution (env + keyring + plaintext), and
//! translation to `fwdms_core::SessionConfig`. The CLI layers its
//! command-line overrides on top of what this crate produces.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fwdms_core::{SessionConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("keyring error: {message}")]
    Keyring { message: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named DMS profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn active_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    /// Root for downloaded images when a profile doesn't set one.
    pub download_dir: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            probe_interval_secs: default_probe_interval(),
            download_dir: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_probe_interval() -> u64 {
    10
}

/// A named DMS profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// DMS base URL (e.g., "https://dms.example.com").
    pub server: String,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Override download directory.
    pub download_dir: Option<PathBuf>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Override reachability probe interval (seconds).
    pub probe_interval_secs: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "fwdms", "fwdms")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default root for downloaded firmware images: the platform cache dir.
pub fn default_download_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".cache").join("firmware"),
        |dirs| dirs.cache_dir().join("firmware"),
    )
}

fn home_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("fwdms");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` layered over defaults, with `FWDMS_*`
/// environment variables on top. A missing file is not an error.
///
/// Nested keys use a double underscore, e.g.
/// `FWDMS_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FWDMS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

const KEYRING_SERVICE: &str = "fwdms";

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
}

/// Store an API key for `profile_name` in the system keyring.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)
        .and_then(|entry| entry.set_password(key))
        .map_err(|e| ConfigError::Keyring {
            message: e.to_string(),
        })
}

/// Resolve an API key from the credential chain.
///
/// The DMS accepts anonymous requests, so no key is not an error.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's api_key_env -> env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile.api_key.clone().map(SecretString::from)
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `SessionConfig` from a profile and the global defaults.
pub fn profile_to_session_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let base_url = parse_server(&profile.server)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = positive_secs("timeout", profile.timeout.unwrap_or(defaults.timeout))?;
    let probe_interval = positive_secs(
        "probe_interval_secs",
        profile.probe_interval_secs.unwrap_or(defaults.probe_interval_secs),
    )?;

    let download_dir = profile
        .download_dir
        .clone()
        .or_else(|| defaults.download_dir.clone())
        .unwrap_or_else(default_download_dir);

    let mut config = SessionConfig::new(base_url)
        .with_download_dir(download_dir)
        .with_probe_interval(probe_interval);
    config.tls = tls;
    config.timeout = timeout;
    config.api_key = resolve_api_key(profile, profile_name);
    Ok(config)
}

/// Parse and validate a DMS server URL.
pub fn parse_server(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("expected an http or https URL, got '{raw}'"),
        });
    }
    Ok(url)
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
