//! # Claims Gateway
//!
//! HTTP surface for listing ownership claims.
//!
//! ```text
//! caller ──► TraceLayer ──► TimeoutLayer ──► handler ──► ClaimVerificationApi
//!              (x-account-id checked by the CallerIdentity extractor)
//! ```
//!
//! Errors leave as `{error, message}` with the taxonomy code in `error`.
//! Token values never appear in a response body.

#![warn(missing_docs)]

pub mod domain;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::{
    ApiError, ClaimAccepted, ClaimStateResponse, ConfigError, ErrorBody, GatewayConfig,
    GatewayError, InitiateClaimRequest, RedemptionResponse,
};
pub use middleware::{CallerIdentity, ACCOUNT_ID_HEADER};
pub use router::{build_router, AppState};
pub use service::{ClaimsGateway, RunningGateway};
