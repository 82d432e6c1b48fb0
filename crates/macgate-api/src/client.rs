// Platform HTTP client
//
// Wraps `reqwest::Client` with bearer-token injection and two-surface URL
// construction. Mutation attempts go through `send`, which hands back the
// raw status and body instead of failing on non-2xx: the caller decides
// success by re-reading state, never by trusting the status alone.

use std::fmt;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{self, BearerToken, ClientCredentials, PlatformUrls, Surface};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Characters of a response body kept in failure details.
pub const BODY_PREVIEW_LEN: usize = 500;

/// HTTP verbs the platform's write surface is probed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
}

impl Verb {
    fn method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        };
        f.write_str(s)
    }
}

/// Status and body of a completed request, whatever the status was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// First [`BODY_PREVIEW_LEN`] characters of the body.
    pub fn preview(&self) -> String {
        auth::preview(&self.body, BODY_PREVIEW_LEN)
    }
}

/// Authenticated client for one platform session.
///
/// Holds a single bearer token baked into the default headers. Build one per
/// operation with [`PlatformClient::connect`]; there is no token refresh.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    urls: PlatformUrls,
    token: BearerToken,
}

impl PlatformClient {
    /// Exchange credentials for a token and build an authenticated client.
    pub async fn connect(
        urls: PlatformUrls,
        credentials: &ClientCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let bootstrap = transport.build_client()?;
        let token = auth::exchange_client_credentials(&bootstrap, &urls, credentials).await?;
        Self::with_token(urls, token, transport)
    }

    /// Build a client around an already-acquired token.
    pub fn with_token(
        urls: PlatformUrls,
        token: BearerToken,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", token.secret().expose_secret()))
                .map_err(|e| Error::Authentication {
                    message: format!("token is not a valid header value: {e}"),
                })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, urls, token })
    }

    pub fn urls(&self) -> &PlatformUrls {
        &self.urls
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/{path}`
    pub fn api_url(&self, path: &str) -> Result<Url, Error> {
        self.urls.join(Surface::Api, path)
    }

    /// `{base}/{path}` on the management surface.
    pub fn management_url(&self, path: &str) -> Result<Url, Error> {
        self.urls.join(Surface::Management, path)
    }

    pub fn url(&self, surface: Surface, path: &str) -> Result<Url, Error> {
        self.urls.join(surface, path)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request and return its status and body.
    ///
    /// Only transport failures are errors; any HTTP status comes back as a
    /// [`RawResponse`].
    pub async fn send(
        &self,
        verb: Verb,
        url: Url,
        body: Option<&Value>,
    ) -> Result<RawResponse, Error> {
        debug!("{} {}", verb, url);

        let mut request = self.http.request(verb.method(), url);
        if let Some(body) = body {
            trace!(body = %body, "request body");
            request = request.json(body);
        }

        let resp = request.send().await?;
        Self::collect(resp).await
    }

    /// GET, returning the raw response.
    pub async fn get(&self, url: Url) -> Result<RawResponse, Error> {
        self.send(Verb::Get, url, None).await
    }

    /// GET and deserialize, failing on non-2xx.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let raw = self.get(url).await?;
        Self::decode(raw)
    }

    /// POST a JSON body and deserialize the reply, failing on non-2xx.
    pub async fn post_json<T: DeserializeOwned>(&self, url: Url, body: &Value) -> Result<T, Error> {
        let raw = self.send(Verb::Post, url, Some(body)).await?;
        Self::decode(raw)
    }

    /// Upload a CSV document as multipart field `file` named `file_name`.
    pub async fn upload_csv(
        &self,
        url: Url,
        file_name: &str,
        csv: String,
    ) -> Result<RawResponse, Error> {
        debug!("POST {} (multipart {})", url, file_name);

        let part = Part::text(csv)
            .file_name(file_name.to_owned())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let resp = self.http.post(url).multipart(form).send().await?;
        Self::collect(resp).await
    }

    async fn collect(resp: reqwest::Response) -> Result<RawResponse, Error> {
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        trace!(status, len = body.len(), "response received");
        Ok(RawResponse { status, body })
    }

    fn decode<T: DeserializeOwned>(raw: RawResponse) -> Result<T, Error> {
        if !raw.is_success() {
            return Err(Error::Api {
                status: raw.status,
                message: raw.preview(),
            });
        }
        let body = if raw.body.trim().is_empty() {
            "null"
        } else {
            raw.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: raw.preview(),
        })
    }
}
