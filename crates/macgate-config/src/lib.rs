//! Configuration for the macgate CLI.
//!
//! TOML profiles, client-secret resolution (env + keyring + plaintext),
//! and translation to `macgate_core::PlatformConfig`. The CLI layers its
//! flag overrides on top.

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

use macgate_core::{PlatformConfig, TlsVerification};

/// Keyring service name; entries are keyed `<profile>/client-secret`.
pub const KEYRING_SERVICE: &str = "macgate";

/// Environment variable consulted after a profile's `client_secret_env`.
pub const CLIENT_SECRET_ENV: &str = "MACGATE_CLIENT_SECRET";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no client secret configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {message}")]
    Keyring { message: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

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

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring {
            message: err.to_string(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named platform profiles.
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

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_settle_delay_ms() -> u64 {
    2000
}

/// A named platform profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Platform base URL (e.g., "https://clearpass.example.com").
    #[serde(default)]
    pub url: String,

    /// OAuth client id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth client secret (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override the wait between a write and its verification read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_delay_ms: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "macgate", "macgate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("macgate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file yields the defaults; `MACGATE_`-prefixed variables
/// override file values (`MACGATE_PROFILES_LAB_URL` → `profiles.lab.url`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MACGATE_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/client-secret")
}

/// Resolve a client secret from the credential chain (no CLI flag step).
pub fn resolve_client_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's client_secret_env → env var lookup
    if let Some(ref env_name) = profile.client_secret_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(val) = std::env::var(CLIENT_SECRET_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref secret) = profile.client_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's client secret in the system keyring.
pub fn store_client_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))?;
    entry.set_password(secret)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// TLS strategy for a profile: insecure wins over a custom CA.
pub fn profile_tls(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Reject a base URL that does not parse.
pub fn validate_url(raw: &str) -> Result<(), ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: "is empty".into(),
        });
    }
    url::Url::parse(raw).map_err(|e| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    Ok(())
}

/// Build a `PlatformConfig` from a profile, no CLI flag overrides.
pub fn profile_to_platform_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PlatformConfig, ConfigError> {
    validate_url(&profile.url)?;

    let client_id = profile
        .client_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ConfigError::Validation {
            field: "client_id".into(),
            reason: format!("missing from profile '{profile_name}'"),
        })?;
    let client_secret = resolve_client_secret(profile, profile_name)?;

    Ok(PlatformConfig {
        url: profile.url.clone(),
        client_id,
        client_secret,
        tls: profile_tls(profile, defaults),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        settle_delay: Duration::from_millis(
            profile.settle_delay_ms.unwrap_or(defaults.settle_delay_ms),
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
        default_profile = "lab"

        [defaults]
        timeout = 45
        settle_delay_ms = 500

        [profiles.lab]
        url = "https://cppm.lab.example"
        client_id = "macgate"
        client_secret = "plain-secret"
        timeout = 10

        [profiles.edge]
        url = "https://edge.example/api"
        client_id = "edge"
        client_secret_env = "EDGE_SECRET"
        insecure = true
        ca_cert = "/etc/ssl/edge.pem"
    "#;

    #[test]
    fn loads_profiles_and_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
            assert_eq!(cfg.defaults.timeout, 45);
            assert_eq!(cfg.defaults.output, "table");
            assert_eq!(cfg.profiles.len(), 2);
            assert_eq!(cfg.profiles["lab"].timeout, Some(10));
            assert_eq!(cfg.profiles["edge"].client_secret_env.as_deref(), Some("EDGE_SECRET"));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("absent.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert!(cfg.profiles.is_empty());
            assert_eq!(cfg.defaults.settle_delay_ms, 2000);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("MACGATE_PROFILES_LAB_URL", "https://override.example");
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.profiles["lab"].url, "https://override.example");
            Ok(())
        });
    }

    #[test]
    fn profile_translates_to_platform_config() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            let platform =
                profile_to_platform_config(&cfg.profiles["lab"], "lab", &cfg.defaults).unwrap();

            assert_eq!(platform.url, "https://cppm.lab.example");
            assert_eq!(platform.client_id, "macgate");
            assert_eq!(platform.client_secret.expose_secret(), "plain-secret");
            assert_eq!(platform.tls, TlsVerification::SystemDefaults);
            assert_eq!(platform.timeout, Duration::from_secs(10));
            assert_eq!(platform.settle_delay, Duration::from_millis(500));
            Ok(())
        });
    }

    #[test]
    fn secret_env_and_insecure_flag_are_honoured() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("EDGE_SECRET", "from-env");
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            let platform =
                profile_to_platform_config(&cfg.profiles["edge"], "edge", &cfg.defaults).unwrap();

            assert_eq!(platform.client_secret.expose_secret(), "from-env");
            assert_eq!(platform.tls, TlsVerification::DangerAcceptInvalid);
            assert_eq!(platform.timeout, Duration::from_secs(45));
            Ok(())
        });
    }

    #[test]
    fn missing_client_id_is_a_validation_error() {
        let profile = Profile {
            url: "https://cppm.example".into(),
            client_secret: Some("s".into()),
            ..Profile::default()
        };
        let err = profile_to_platform_config(&profile, "bare", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "client_id"));
    }

    #[test]
    fn bad_url_is_rejected() {
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("").is_err());
        assert!(validate_url("https://cppm.example/api").is_ok());
    }

    #[test]
    fn custom_ca_used_when_not_insecure() {
        let profile = Profile {
            ca_cert: Some("/etc/ssl/ca.pem".into()),
            ..Profile::default()
        };
        assert_eq!(
            profile_tls(&profile, &Defaults::default()),
            TlsVerification::CustomCa("/etc/ssl/ca.pem".into())
        );
    }

    #[test]
    fn saved_config_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                url: "https://cppm.example".into(),
                client_id: Some("macgate".into()),
                settle_delay_ms: Some(0),
                ..Profile::default()
            },
        );
        save_config_to(&path, &cfg).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[profiles.lab]"), "{written}");
        assert!(!written.contains("client_secret"), "{written}");

        let reloaded = load_config_from(&path).unwrap();
        assert_eq!(reloaded.profiles["lab"].client_id.as_deref(), Some("macgate"));
        assert_eq!(reloaded.profiles["lab"].settle_delay_ms, Some(0));
    }
}
