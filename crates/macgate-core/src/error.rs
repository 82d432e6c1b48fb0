// ── Core error types ──
//
// User-facing errors from macgate-core. Callers never see reqwest errors
// or raw JSON failures directly: the `From<macgate_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to platform at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Platform request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Invalid MAC address: {raw:?}")]
    InvalidMac { raw: String },

    #[error("{entity} {identifier} could not be read from any known path")]
    EntityUnavailable { entity: String, identifier: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn unavailable(entity: &str, identifier: impl Into<String>) -> Self {
        Self::EntityUnavailable {
            entity: entity.to_owned(),
            identifier: identifier.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<macgate_api::Error> for CoreError {
    fn from(err: macgate_api::Error) -> Self {
        match err {
            macgate_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            macgate_api::Error::MissingConfiguration { field } => CoreError::Configuration {
                message: format!("{field} is required"),
            },
            macgate_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            macgate_api::Error::InvalidUrl(e) => CoreError::Configuration {
                message: format!("Invalid URL: {e}"),
            },
            macgate_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            macgate_api::Error::Api { status: 404, message } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            macgate_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            macgate_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_becomes_configuration_error() {
        let err: CoreError = macgate_api::Error::MissingConfiguration { field: "client_id" }.into();
        assert!(matches!(err, CoreError::Configuration { .. }));
        assert_eq!(err.to_string(), "Configuration error: client_id is required");
    }

    #[test]
    fn api_404_becomes_not_found() {
        let err: CoreError = macgate_api::Error::Api {
            status: 404,
            message: "gone".into(),
        }
        .into();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
