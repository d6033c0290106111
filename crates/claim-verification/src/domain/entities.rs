//! # Domain Entities
//!
//! Records owned by the verification workflow, and the results it hands back.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Account, AccountId, Listing, ListingId};
use uuid::Uuid;

use super::errors::ClaimError;
use super::invariants::invariant_expiry_after_creation;
use super::value_objects::{ClaimToken, ContactEmail};

/// An in-flight ownership claim, keyed by its token.
///
/// Created by `initiate_claim`, deleted by a successful `redeem`, never
/// mutated in between. Serialized in the persisted record shape
/// `{token, listingId, claimantId, contactEmail, createdAt, expiresAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingClaim {
    /// Primary lookup key.
    pub token: ClaimToken,
    /// Listing being claimed.
    pub listing_id: ListingId,
    /// Account making the claim.
    pub claimant_id: AccountId,
    /// Where the token was sent.
    pub contact_email: ContactEmail,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Fixed at creation; always after `created_at`.
    pub expires_at: DateTime<Utc>,
}

impl PendingClaim {
    /// Create a claim that expires `ttl` after `created_at`.
    ///
    /// # Errors
    /// - `InvalidOrExpiredToken` if `ttl` is not positive
    pub fn new(
        token: ClaimToken,
        listing_id: ListingId,
        claimant_id: AccountId,
        contact_email: ContactEmail,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, ClaimError> {
        let expires_at = created_at + ttl;
        invariant_expiry_after_creation(created_at, expires_at)?;
        Ok(Self {
            token,
            listing_id,
            claimant_id,
            contact_email,
            created_at,
            expires_at,
        })
    }

    /// A claim is expired once `now` is strictly past `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Saga marker: "claim consumed, commit pending".
///
/// Written in the same atomic step that deletes the claim and removed once
/// the listing/account commit succeeds. A surviving marker is the durable
/// record of a reconciliation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCommit {
    /// Marker identifier.
    pub commit_id: Uuid,
    /// Listing to verify.
    pub listing_id: ListingId,
    /// Account to make owner.
    pub claimant_id: AccountId,
    /// When the claim was consumed.
    pub consumed_at: DateTime<Utc>,
}

/// What `consume` hands back: the deleted claim and its commit marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedClaim {
    /// The claim that was deleted.
    pub claim: PendingClaim,
    /// Marker recorded alongside the deletion.
    pub commit: PendingCommit,
}

/// Entities as they stand after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Updated listing.
    pub listing: Listing,
    /// Updated account.
    pub account: Account,
}

/// Result of `initiate_claim`. Carries no token value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    /// Listing claimed.
    pub listing_id: ListingId,
    /// Claimant.
    pub claimant_id: AccountId,
    /// Log-safe token identifier.
    pub token_fingerprint: String,
    /// When the emailed token stops working.
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful `redeem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    /// Listing now owned.
    pub listing_id: ListingId,
    /// New verified owner.
    pub claimant_id: AccountId,
    /// `Listing::is_verified` after the commit.
    pub listing_verified: bool,
    /// `Account::is_verified_owner` after the commit.
    pub owner_verified: bool,
}

impl Redemption {
    /// Build from the committed entities.
    pub fn from_outcome(outcome: &CommitOutcome) -> Self {
        Self {
            listing_id: outcome.listing.id,
            claimant_id: outcome.account.id,
            listing_verified: outcome.listing.is_verified,
            owner_verified: outcome.account.is_verified_owner,
        }
    }
}

/// Message handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimEmail {
    /// Recipient.
    pub to: ContactEmail,
    /// Token to deliver.
    pub token: ClaimToken,
    /// Display name of the listing.
    pub listing_name: String,
    /// Subject line.
    pub subject: String,
}

/// Outcome of one `reconcile` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    /// Markers whose commit was re-applied and cleared.
    pub repaired: Vec<Uuid>,
    /// Markers whose listing is now owned by someone else.
    pub conflicts: Vec<Uuid>,
    /// Markers whose commit failed again.
    pub failed: Vec<Uuid>,
}

impl ReconciliationReport {
    /// True when no marker is left behind.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.failed.is_empty()
    }
}
