//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use macgate_config::ConfigError;
use macgate_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const OPERATION: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to platform at {url}")]
    #[diagnostic(
        code(macgate::connection_failed),
        help(
            "Check that the platform is reachable: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(macgate::auth_failed),
        help(
            "Verify the OAuth client id and secret (client_credentials grant).\n\
             Run: macgate config set-secret --profile <name>"
        )
    )]
    AuthFailed { message: String },

    #[error("No client secret configured for profile '{profile}'")]
    #[diagnostic(
        code(macgate::no_credentials),
        help(
            "Store one with: macgate config set-secret\n\
             Or set MACGATE_CLIENT_SECRET / pass --client-secret."
        )
    )]
    NoCredentials { profile: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid MAC address: {raw:?}")]
    #[diagnostic(
        code(macgate::invalid_mac),
        help("Use 12 hex digits with optional ':', '-' or '.' separators, e.g. aa:bb:cc:dd:ee:ff")
    )]
    InvalidMac { raw: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(macgate::validation))]
    Validation { field: String, reason: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(macgate::not_found),
        help("Run: macgate explore to see which resources this deployment exposes")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── API / operation ──────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(macgate::api_error))]
    ApiError { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(macgate::operation_failed),
        help("Re-run with -v to see every attempt, or -o json for the full result")
    )]
    OperationFailed { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(macgate::profile_not_found),
        help("Available profiles: {available}\nConfig file: {path}")
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("No platform configured")]
    #[diagnostic(
        code(macgate::no_config),
        help(
            "Pass --url, --client-id and --client-secret (or MACGATE_URL, MACGATE_CLIENT_ID,\n\
             MACGATE_CLIENT_SECRET), or add a profile to: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(macgate::config))]
    Config { message: String },

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(macgate::keyring),
        help("No usable system keyring? Use client_secret_env in the profile instead.")
    )]
    Keyring { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(macgate::timeout),
        help("Increase the timeout with --timeout or check platform responsiveness.")
    )]
    Timeout,

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(macgate::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::InvalidMac { .. }
            | Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            Self::OperationFailed { .. } => exit_code::OPERATION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { .. } => CliError::Timeout,

            CoreError::InvalidMac { raw } => CliError::InvalidMac { raw },

            CoreError::EntityUnavailable { entity, identifier } => CliError::NotFound {
                resource_type: entity,
                identifier,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Api { message, status } => CliError::ApiError {
                message: match status {
                    Some(status) => format!("HTTP {status}: {message}"),
                    None => message,
                },
            },

            CoreError::Configuration { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Keyring { message } => CliError::Keyring { message },
            ConfigError::Io(e) => CliError::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let cases = [
            (CoreError::InvalidMac { raw: "x".into() }, exit_code::USAGE),
            (
                CoreError::AuthenticationFailed {
                    message: "401".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::EntityUnavailable {
                    entity: "static host list".into(),
                    identifier: "9".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::ConnectionFailed {
                    url: "https://x".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (CoreError::Timeout { timeout_secs: 30 }, exit_code::TIMEOUT),
        ];
        for (core, code) in cases {
            let cli = CliError::from(core);
            assert_eq!(cli.exit_code(), code, "{cli:?}");
        }
    }

    #[test]
    fn api_error_message_includes_status() {
        let err = CliError::from(CoreError::Api {
            message: "bad body".into(),
            status: Some(422),
        });
        assert_eq!(err.to_string(), "API error: HTTP 422: bad body");
    }
}
