//! HTTP client for an undocumented network-access-control REST surface.
//!
//! Provides the client-credentials token exchange, an authenticated client
//! that reports every HTTP status back to its caller, and the shared TLS and
//! timeout configuration used to build both.

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;

pub use auth::{BearerToken, ClientCredentials, PlatformUrls, Surface};
pub use client::{BODY_PREVIEW_LEN, PlatformClient, RawResponse, Verb};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
