//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "probe_interval_secs = {}", cfg.defaults.probe_interval_secs);
    if let Some(ref dir) = cfg.defaults.download_dir {
        let _ = writeln!(out, "download_dir = \"{}\"", dir.display());
    }

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref dir) = p.download_dir {
            let _ = writeln!(out, "download_dir = \"{}\"", dir.display());
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = p.probe_interval_secs {
            let _ = writeln!(out, "probe_interval_secs = {interval}");
        }
    }

    out
}

/// Same config with plaintext keys masked, for JSON output.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("****".into());
        }
    }
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |c| {
                c.active_profile_name().to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init {
            api_key_env,
            plaintext_key,
            force,
        } => {
            let server = global.server.clone().ok_or_else(|| CliError::Validation {
                field: "server".into(),
                reason: "pass the DMS URL with --server".into(),
            })?;
            config::parse_server(&server)?;

            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            if cfg.profiles.contains_key(&profile_name) && !force {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: format!("profile '{profile_name}' already exists; use --force to replace it"),
                });
            }

            let mut profile = Profile {
                server,
                api_key_env,
                timeout: global.timeout,
                download_dir: global.download_dir.clone(),
                insecure: global.insecure.then_some(true),
                ..Profile::default()
            };

            if let Some(ref key) = global.api_key {
                if plaintext_key {
                    profile.api_key = Some(key.clone());
                } else {
                    config::store_api_key(&profile_name, key)?;
                    if !global.quiet {
                        eprintln!("   ✓ API key stored in system keyring");
                    }
                }
            }

            if cfg.profiles.is_empty() {
                cfg.default_profile = Some(profile_name.clone());
            }
            cfg.profiles.insert(profile_name.clone(), profile);
            config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!(
                    "✓ Profile '{profile_name}' written to {}",
                    config::config_path().display()
                );
                eprintln!("  Test it: fwdms --profile {profile_name} list <DEVICE_ID>");
            }
            Ok(())
        }
    }
}
