//! Error types for spindle.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Result type alias for spindle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for spindle.
///
/// Each variant is raised synchronously by the component that detects the
/// violating condition; the gateway facade is the only place these are
/// translated into caller-visible responses.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Provider '{name}' is already registered")]
    DuplicateProvider { name: String },

    #[error("Unknown provider '{name}'")]
    UnknownProvider { name: String },

    #[error("No providers registered")]
    NoProviders,

    #[error("Provider '{name}' requires a credential but none is set")]
    MissingCredential { name: String },

    #[error("Unsupported request method '{method}'")]
    UnsupportedMethod { method: String },

    #[error("Upstream unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code for this error kind.
    ///
    /// These strings are part of the caller-facing contract and must not
    /// change between releases.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::DuplicateProvider { .. } => "duplicate_provider",
            Error::UnknownProvider { .. } => "unknown_provider",
            Error::NoProviders => "no_providers",
            Error::MissingCredential { .. } => "misconfigured_provider",
            Error::UnsupportedMethod { .. } => "unsupported_method",
            Error::Transport(_) => "upstream_unreachable",
            Error::BadRequest(_) => "bad_request",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status the gateway reports for this error kind.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::DuplicateProvider { .. } => StatusCode::CONFLICT,
            Error::UnknownProvider { .. } => StatusCode::BAD_REQUEST,
            Error::NoProviders => StatusCode::SERVICE_UNAVAILABLE,
            Error::MissingCredential { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::UnsupportedMethod { .. } => StatusCode::BAD_REQUEST,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        // OpenAI-compatible error envelope with a stable code string
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "type": "spindle_error",
                "code": self.code()
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_providers_maps_to_service_unavailable() {
        let err = Error::NoProviders;
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "no_providers");
    }

    #[test]
    fn test_missing_credential_maps_to_misconfigured() {
        let err = Error::MissingCredential {
            name: "openai".to_string(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "misconfigured_provider");
    }

    #[test]
    fn test_duplicate_provider_conflict() {
        let err = Error::DuplicateProvider {
            name: "openai".to_string(),
        };
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "duplicate_provider");
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn test_unsupported_method_bad_request() {
        let err = Error::UnsupportedMethod {
            method: "PATCH".to_string(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "unsupported_method");
    }
}
