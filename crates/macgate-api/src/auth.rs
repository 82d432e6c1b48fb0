// OAuth client-credentials exchange and platform URL layout.
//
// The platform exposes its REST API under `{base}/api` and a separate
// management surface directly under `{base}`. Both are derived once from
// the operator-supplied base URL, whichever form it was given in.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Which URL tree a request path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The primary REST surface, `{base}/api/`.
    Api,
    /// The management surface, `{base}/` (no `/api` segment).
    Management,
}

/// Resolved base URLs for both platform surfaces.
///
/// Both URLs always end with `/` so relative paths join underneath them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformUrls {
    api: Url,
    management: Url,
}

impl PlatformUrls {
    /// Derive both surfaces from a base URL.
    ///
    /// Accepts `https://host`, `https://host/`, `https://host/api` and
    /// `https://host/api/`; a nested prefix (`https://host/nac/api`) is kept.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::MissingConfiguration { field: "base_url" });
        }

        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        let root_path = path.strip_suffix("/api").unwrap_or(&path).to_owned();

        url.set_query(None);
        url.set_fragment(None);

        let mut management = url.clone();
        management.set_path(&format!("{root_path}/"));

        let mut api = url;
        api.set_path(&format!("{root_path}/api/"));

        Ok(Self { api, management })
    }

    pub fn api(&self) -> &Url {
        &self.api
    }

    pub fn management(&self) -> &Url {
        &self.management
    }

    /// Base URL for the given surface.
    pub fn base(&self, surface: Surface) -> &Url {
        match surface {
            Surface::Api => &self.api,
            Surface::Management => &self.management,
        }
    }

    /// Join a relative path onto a surface.
    ///
    /// An empty path yields the surface base without its trailing slash, so
    /// probing `""` hits `{base}/api` rather than `{base}/api/`.
    pub fn join(&self, surface: Surface, path: &str) -> Result<Url, Error> {
        let base = self.base(surface);
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            let mut url = base.clone();
            let trimmed = url.path().trim_end_matches('/').to_owned();
            url.set_path(&trimmed);
            return Ok(url);
        }
        Ok(base.join(path)?)
    }

    /// The client-credentials exchange endpoint: `{base}/api/oauth`.
    pub fn token_url(&self) -> Result<Url, Error> {
        self.join(Surface::Api, "oauth")
    }
}

/// Client-credentials pair issued by the platform's API client registry.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// Reject empty fields before any network call.
    pub fn validate(&self) -> Result<(), Error> {
        if self.client_id.trim().is_empty() {
            return Err(Error::MissingConfiguration { field: "client_id" });
        }
        if self.client_secret.expose_secret().trim().is_empty() {
            return Err(Error::MissingConfiguration {
                field: "client_secret",
            });
        }
        Ok(())
    }
}

/// A bearer credential plus the moment it was issued.
///
/// Expiry is not tracked: every operation acquires its own token.
#[derive(Debug, Clone)]
pub struct BearerToken {
    value: SecretString,
    acquired_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(value: SecretString) -> Self {
        Self {
            value,
            acquired_at: Utc::now(),
        }
    }

    pub fn secret(&self) -> &SecretString {
        &self.value
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// First few characters of the token, for connectivity diagnostics.
    pub fn preview(&self) -> String {
        let value = self.value.expose_secret();
        let head: String = value.chars().take(10).collect();
        format!("{head}...")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Exchange client credentials for a bearer token.
///
/// `POST {base}/api/oauth` with a JSON client-credentials grant. A single
/// failed exchange is returned immediately; there is no retry.
pub async fn exchange_client_credentials(
    http: &reqwest::Client,
    urls: &PlatformUrls,
    credentials: &ClientCredentials,
) -> Result<BearerToken, Error> {
    credentials.validate()?;

    let url = urls.token_url()?;
    debug!("requesting token at {}", url);

    let body = json!({
        "grant_type": "client_credentials",
        "client_id": credentials.client_id,
        "client_secret": credentials.client_secret.expose_secret(),
    });

    let resp = http
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Authentication {
            message: format!("token request failed: {e}"),
        })?;

    let status = resp.status();
    let text = resp.text().await.map_err(|e| Error::Authentication {
        message: format!("unreadable token response (HTTP {status}): {e}"),
    })?;
    if !status.is_success() {
        return Err(Error::Authentication {
            message: format!(
                "token exchange rejected (HTTP {status}): {}",
                preview(&text, 200)
            ),
        });
    }

    let parsed: TokenResponse =
        serde_json::from_str(&text).map_err(|e| Error::Authentication {
            message: format!("unreadable token response: {e}"),
        })?;

    match parsed.access_token {
        Some(token) if !token.is_empty() => {
            debug!("token acquired");
            Ok(BearerToken::new(SecretString::from(token)))
        }
        _ => Err(Error::Authentication {
            message: "no access token in response".into(),
        }),
    }
}

/// Truncate a body to at most `max` characters for logs and error details.
pub(crate) fn preview(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_api_suffix() {
        let urls = PlatformUrls::parse("https://nac.example.com").unwrap();
        assert_eq!(urls.api().as_str(), "https://nac.example.com/api/");
        assert_eq!(urls.management().as_str(), "https://nac.example.com/");
    }

    #[test]
    fn api_suffix_is_not_doubled() {
        let urls = PlatformUrls::parse("https://nac.example.com/api/").unwrap();
        assert_eq!(urls.api().as_str(), "https://nac.example.com/api/");
        assert_eq!(urls.management().as_str(), "https://nac.example.com/");
    }

    #[test]
    fn nested_prefix_is_kept() {
        let urls = PlatformUrls::parse("https://host:8443/nac/api").unwrap();
        assert_eq!(urls.api().as_str(), "https://host:8443/nac/api/");
        assert_eq!(urls.management().as_str(), "https://host:8443/nac/");
    }

    #[test]
    fn join_resolves_under_surface() {
        let urls = PlatformUrls::parse("https://h").unwrap();
        assert_eq!(
            urls.join(Surface::Api, "static-host-list/7").unwrap().as_str(),
            "https://h/api/static-host-list/7"
        );
        assert_eq!(
            urls.join(Surface::Management, "platform/static-host-list/7/host")
                .unwrap()
                .as_str(),
            "https://h/platform/static-host-list/7/host"
        );
        assert_eq!(urls.join(Surface::Api, "").unwrap().as_str(), "https://h/api");
        assert_eq!(urls.token_url().unwrap().as_str(), "https://h/api/oauth");
    }

    #[test]
    fn empty_base_url_is_missing_configuration() {
        let err = PlatformUrls::parse("  ").unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfiguration { field: "base_url" }
        ));
    }

    #[test]
    fn empty_client_id_fails_validation() {
        let creds = ClientCredentials::new("", SecretString::from("s".to_owned()));
        assert!(matches!(
            creds.validate(),
            Err(Error::MissingConfiguration { field: "client_id" })
        ));
    }

    #[test]
    fn token_preview_truncates() {
        let token = BearerToken::new(SecretString::from("abcdefghijklmnop".to_owned()));
        assert_eq!(token.preview(), "abcdefghij...");
    }
}
