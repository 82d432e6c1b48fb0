//! CLI configuration: thin wrapper around `macgate_config`.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--url, --client-id, --client-secret, ...).

use std::time::Duration;

use secrecy::SecretString;

use macgate_core::{PlatformConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use macgate_config::{
    Config, Defaults, Profile, config_path, load_config, load_config_or_default,
    store_client_secret,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `PlatformConfig` from the config file, active profile and flags.
pub fn build_platform_config(global: &GlobalOpts) -> Result<PlatformConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
            path: config_path().display().to_string(),
        });
    }

    // No profile: flags and env alone.
    if global.url.is_none() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    resolve_profile(&Profile::default(), &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into a `PlatformConfig`.
///
/// CLI flag overrides take priority over profile values, which take
/// priority over `[defaults]`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<PlatformConfig, CliError> {
    // 1. Base URL (flag > env > profile)
    let url = global.url.clone().unwrap_or_else(|| profile.url.clone());
    macgate_config::validate_url(&url)?;

    // 2. Client id (flag > env > profile)
    let client_id = global
        .client_id
        .clone()
        .or_else(|| profile.client_id.clone())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 3. Client secret (flag > credential chain)
    let client_secret = match global.client_secret {
        Some(ref secret) => SecretString::from(secret.clone()),
        None => macgate_config::resolve_client_secret(profile, profile_name)?,
    };

    // 4. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        macgate_config::profile_tls(profile, defaults)
    };

    // 5. Timing
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(defaults.timeout);
    let settle_delay_ms = global
        .settle_delay_ms
        .or(profile.settle_delay_ms)
        .unwrap_or(defaults.settle_delay_ms);

    Ok(PlatformConfig {
        url,
        client_id,
        client_secret,
        tls,
        timeout: Duration::from_secs(timeout),
        settle_delay: Duration::from_millis(settle_delay_ms),
    })
}
