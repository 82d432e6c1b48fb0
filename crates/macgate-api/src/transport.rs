// HTTP client construction shared by the token exchange and the
// authenticated platform client: one place for TLS trust and timeouts.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::ClientBuilder;
use reqwest::header::HeaderMap;

use crate::error::Error;

const USER_AGENT: &str = concat!("macgate/", env!("CARGO_PKG_VERSION"));

/// How server certificates are trusted.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// System certificate store.
    #[default]
    System,
    /// Additionally trust the PEM bundle at this path.
    CustomCa(PathBuf),
    /// Skip verification entirely (appliances commonly ship self-signed).
    DangerAcceptInvalid,
}

/// TLS and timeout settings for every client the crate builds.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Plain client, used for the token exchange.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Client that sends `headers` on every request.
    ///
    /// [`PlatformClient`](crate::PlatformClient) passes the bearer token and
    /// `Accept: application/json` here.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        self.apply_tls(builder)?
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    fn apply_tls(&self, builder: ClientBuilder) -> Result<ClientBuilder, Error> {
        Ok(match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Tls(format!("cannot read CA bundle {}: {e}", path.display()))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Tls(format!("invalid CA bundle: {e}")))?;
                builder.add_root_certificate(cert)
            }
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        })
    }
}
