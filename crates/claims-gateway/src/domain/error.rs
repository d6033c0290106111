//! Gateway error types and their HTTP mapping.
//!
//! | Code | Status |
//! |------|--------|
//! | `AlreadyOwned`, `DuplicateActiveClaim` | 409 |
//! | `InvalidOrExpiredToken`, `ListingNotFound`, `AccountNotFound` | 404 |
//! | `InvalidContactEmail` | 422 |
//! | `BadRequest` | 400 |
//! | `Unauthenticated` | 401 |
//! | `DeliveryFailed` | 502 |
//! | `StoreUnavailable` | 503 |
//! | `ReconciliationFailure` | 500 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use claim_verification::ClaimError;
use thiserror::Error;

use super::config::ConfigError;
use super::types::ErrorBody;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable caller identity on the request.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Body or path could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Workflow outcome.
    #[error(transparent)]
    Claim(#[from] ClaimError),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Claim(err) => match err {
                ClaimError::AlreadyOwned(_) | ClaimError::DuplicateActiveClaim(_) => {
                    StatusCode::CONFLICT
                }
                ClaimError::InvalidOrExpiredToken
                | ClaimError::ListingNotFound(_)
                | ClaimError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                ClaimError::InvalidContactEmail => StatusCode::UNPROCESSABLE_ENTITY,
                ClaimError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
                ClaimError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ClaimError::ReconciliationFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Body for this error
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Unauthenticated => ErrorBody {
                error: "Unauthenticated".to_string(),
                message: "caller identity required".to_string(),
            },
            ApiError::BadRequest(detail) => ErrorBody {
                error: "BadRequest".to_string(),
                message: detail.clone(),
            },
            ApiError::Claim(err) => ErrorBody {
                error: err.code().to_string(),
                message: err.user_message().to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

/// Errors raised while starting or running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: std::net::SocketAddr,
        /// OS error
        source: std::io::Error,
    },

    /// Server stopped with an error
    #[error("HTTP server error: {0}")]
    Serve(std::io::Error),
}
