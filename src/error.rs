//! Error types for the Keycloak client and provider.

use thiserror::Error;

/// Library error type.
#[derive(Debug, Error)]
pub enum KeycloakError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication against the token endpoint failed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Non-success response from the Keycloak API.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder when it could not be read.
        message: String,
    },

    /// The requested path returned 404.
    #[error("not found: {path}")]
    NotFound {
        /// Request path relative to the server URL.
        path: String,
    },

    /// The configured API profile has no update endpoint.
    #[error("updating {resource_type} is not supported by this Keycloak API profile")]
    UpdateUnsupported {
        /// Resource type name.
        resource_type: String,
    },

    /// Invalid argument supplied by the caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encode or decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decode error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeycloakError {
    /// Returns true when the error is a 404 from the API.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Library result type.
pub type KeycloakResult<T> = Result<T, KeycloakError>;
