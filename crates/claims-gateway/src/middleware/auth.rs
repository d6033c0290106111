//! Caller identity.
//!
//! The upstream session layer authenticates the caller and forwards the
//! account id in the `x-account-id` header. Handlers that need a caller take
//! [`CallerIdentity`] as an extractor; a missing or malformed header is
//! rejected with `401`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use shared_types::AccountId;
use tracing::debug;

use crate::domain::ApiError;

/// Header carrying the authenticated account id.
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity(pub AccountId);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACCOUNT_ID_HEADER) else {
            debug!("Request without caller identity");
            return Err(ApiError::Unauthenticated);
        };
        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<AccountId>().ok())
            .map(CallerIdentity)
            .ok_or_else(|| {
                debug!("Malformed caller identity header");
                ApiError::Unauthenticated
            })
    }
}
