//! Request and response bodies.

use chrono::{DateTime, Utc};
use claim_verification::{ClaimReceipt, ClaimState, Redemption};
use serde::{Deserialize, Serialize};
use shared_types::{AccountId, ListingId};

/// `POST /claims` body. The claimant comes from the caller identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateClaimRequest {
    /// Listing to claim
    pub listing_id: ListingId,
    /// Where to send the token
    pub contact_email: String,
}

/// `202 Accepted` body. Never carries the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAccepted {
    /// Always `"pending"`
    pub status: String,
    /// Listing claimed
    pub listing_id: ListingId,
    /// When the emailed token stops working
    pub expires_at: DateTime<Utc>,
}

impl From<ClaimReceipt> for ClaimAccepted {
    fn from(receipt: ClaimReceipt) -> Self {
        Self {
            status: "pending".to_string(),
            listing_id: receipt.listing_id,
            expires_at: receipt.expires_at,
        }
    }
}

/// `200 OK` body of a redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionResponse {
    /// Listing now owned
    pub listing_id: ListingId,
    /// Verified owner
    pub claimant_id: AccountId,
    /// Listing verified flag after the commit
    pub listing_verified: bool,
    /// Account verified-owner flag after the commit
    pub owner_verified: bool,
}

impl From<Redemption> for RedemptionResponse {
    fn from(r: Redemption) -> Self {
        Self {
            listing_id: r.listing_id,
            claimant_id: r.claimant_id,
            listing_verified: r.listing_verified,
            owner_verified: r.owner_verified,
        }
    }
}

/// `GET /listings/{id}/claim` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStateResponse {
    /// Listing queried
    pub listing_id: ListingId,
    /// Lifecycle position
    pub state: ClaimState,
}

/// Error body `{error, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Taxonomy code
    pub error: String,
    /// User-facing text
    pub message: String,
}
