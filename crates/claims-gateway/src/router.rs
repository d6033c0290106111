//! Routes and handlers.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/claims` | [`initiate_claim`] |
//! | GET, POST | `/claims/redeem/:token` | [`redeem_claim`] |
//! | GET | `/listings/:listing_id/claim` | [`claim_state`] |
//! | GET | `/health` | [`health_check`] |

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use claim_verification::{ClaimError, ClaimVerificationApi};
use shared_types::ListingId;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::domain::{
    ApiError, ClaimAccepted, ClaimStateResponse, InitiateClaimRequest, RedemptionResponse,
};
use crate::middleware::CallerIdentity;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Verification workflow
    pub claims: Arc<dyn ClaimVerificationApi>,
}

/// Build the HTTP router with its middleware stack.
pub fn build_router(claims: Arc<dyn ClaimVerificationApi>, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .route("/claims", post(initiate_claim))
        .route("/claims/redeem/:token", get(redeem_claim).post(redeem_claim))
        .route("/listings/:listing_id/claim", get(claim_state))
        .route("/health", get(health_check))
        .layer(middleware)
        .with_state(AppState { claims })
}

/// Start a claim for the calling account.
pub async fn initiate_claim(
    State(state): State<AppState>,
    CallerIdentity(claimant): CallerIdentity,
    body: Result<Json<InitiateClaimRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClaimAccepted>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let receipt = state
        .claims
        .initiate_claim(request.listing_id, claimant, &request.contact_email)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(receipt.into())))
}

/// Redeem an emailed token. Anyone holding the link may redeem it.
pub async fn redeem_claim(
    State(state): State<AppState>,
    token: Result<Path<String>, PathRejection>,
) -> Result<Json<RedemptionResponse>, ApiError> {
    // An undecodable segment is just another bad token.
    let Path(token) = token.map_err(|_| ClaimError::InvalidOrExpiredToken)?;
    let redemption = state.claims.redeem(&token).await?;
    Ok(Json(redemption.into()))
}

/// Where a listing sits in the claim lifecycle.
pub async fn claim_state(
    State(state): State<AppState>,
    listing_id: Result<Path<ListingId>, PathRejection>,
) -> Result<Json<ClaimStateResponse>, ApiError> {
    let Path(listing_id) = listing_id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let claim_state = state.claims.claim_state(listing_id).await?;
    Ok(Json(ClaimStateResponse {
        listing_id,
        state: claim_state,
    }))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "claims-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
