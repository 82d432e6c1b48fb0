// ── Runtime connection configuration ──
//
// These types describe how to reach one platform deployment. They carry
// credential data and connection tuning, but never touch disk: the CLI
// builds a `PlatformConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use macgate_api::{ClientCredentials, PlatformUrls, TlsMode, TransportConfig};
use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;

/// Delay between a 2xx write and its verification read.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed appliance certificates).
    DangerAcceptInvalid,
}

/// Configuration for one platform deployment.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Base URL, with or without the trailing `/api`.
    pub url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Wait after a 2xx mutation before re-reading state.
    pub settle_delay: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            client_id: String::new(),
            client_secret: SecretString::from(String::new()),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl PlatformConfig {
    /// Reject missing base URL or credentials before any network call.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut missing = Vec::new();
        if self.url.trim().is_empty() {
            missing.push("url");
        }
        if self.client_id.trim().is_empty() {
            missing.push("client_id");
        }
        if self.client_secret.expose_secret().trim().is_empty() {
            missing.push("client_secret");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Configuration {
                message: format!("missing {}", missing.join(", ")),
            })
        }
    }

    pub(crate) fn urls(&self) -> Result<PlatformUrls, CoreError> {
        Ok(PlatformUrls::parse(&self.url)?)
    }

    pub(crate) fn credentials(&self) -> ClientCredentials {
        ClientCredentials::new(self.client_id.clone(), self.client_secret.clone())
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_reports_every_missing_field() {
        let err = PlatformConfig::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: missing url, client_id, client_secret"
        );
    }

    #[test]
    fn complete_config_validates() {
        let config = PlatformConfig {
            url: "https://nac.example.com".into(),
            client_id: "macgate".into(),
            client_secret: SecretString::from("s".to_owned()),
            ..PlatformConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
