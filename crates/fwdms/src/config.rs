//! CLI configuration: thin wrapper around `fwdms_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--server, --api-key, etc.).

use secrecy::SecretString;

use fwdms_core::SessionConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use fwdms_config::{
    Config, Profile, config_path, load_config_or_default, parse_server, save_config,
    store_api_key,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
///
/// Flag values win over the profile. Without a profile the server must
/// come from `--server` / `FWDMS_SERVER`; an explicitly requested profile
/// that doesn't exist is an error.
pub fn build_session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(p) => p.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&cfg),
                name: profile_name,
            });
        }
        None => Profile::default(),
    };

    // 1. Server URL (flag > env > profile)
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if profile.server.is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }

    // 2. Transport and storage overrides
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if let Some(ref dir) = global.download_dir {
        profile.download_dir = Some(dir.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }

    let mut session = fwdms_config::profile_to_session_config(&profile, &profile_name, &cfg.defaults)?;

    // 3. API key (flag takes priority over the resolution chain)
    if let Some(ref key) = global.api_key {
        session.api_key = Some(SecretString::from(key.clone()));
    }

    Ok(session)
}
