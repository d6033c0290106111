//! # Inbound Ports
//!
//! What the verification workflow offers its callers. The caller identity is
//! authenticated upstream before any of these are invoked.

use async_trait::async_trait;
use shared_types::{AccountId, ListingId};

use crate::domain::{ClaimError, ClaimReceipt, ClaimState, ReconciliationReport, Redemption};

/// Ownership claim & verification API - inbound port.
#[async_trait]
pub trait ClaimVerificationApi: Send + Sync {
    /// Start a claim and email the token to `contact_email`.
    ///
    /// # Errors
    /// - `InvalidContactEmail`, `ListingNotFound`
    /// - `AlreadyOwned` if the listing has an owner
    /// - `DuplicateActiveClaim` if another claim is live (not retried)
    /// - `DeliveryFailed` if the email could not be sent; nothing is left behind
    async fn initiate_claim(
        &self,
        listing_id: ListingId,
        claimant_id: AccountId,
        contact_email: &str,
    ) -> Result<ClaimReceipt, ClaimError>;

    /// Redeem an emailed token.
    ///
    /// # Errors
    /// - `InvalidOrExpiredToken` for unknown, expired, malformed or spent tokens
    /// - `ListingNotFound`, `AccountNotFound`, `AlreadyOwned` (token kept)
    /// - `ReconciliationFailure` if the commit failed after consumption
    async fn redeem(&self, token: &str) -> Result<Redemption, ClaimError>;

    /// Remove expired claims. Never needed for correctness.
    async fn sweep_expired(&self) -> Result<usize, ClaimError>;

    /// Re-apply commits left behind by reconciliation failures.
    async fn reconcile(&self) -> Result<ReconciliationReport, ClaimError>;

    /// Where a listing currently sits in the claim lifecycle.
    async fn claim_state(&self, listing_id: ListingId) -> Result<ClaimState, ClaimError>;
}
