//! # Domain Invariants
//!
//! Rules that must hold for every claim and for the committed entities.

use chrono::{DateTime, Utc};
use shared_types::{Account, AccountId, Listing};

use super::errors::ClaimError;

/// Default validity window of a claim token (24 hours).
pub const DEFAULT_CLAIM_TTL_SECS: u64 = 24 * 60 * 60;

/// Default bound on a single email dispatch.
pub const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 5_000;

/// Default interval of the housekeeping sweep.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Invariant: `expires_at > created_at`.
pub fn invariant_expiry_after_creation(
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<(), ClaimError> {
    if expires_at <= created_at {
        return Err(ClaimError::InvalidOrExpiredToken);
    }
    Ok(())
}

/// Invariant: a claim is live while `now <= expires_at`, whether or not
/// the expired row has been swept.
pub fn invariant_claim_live(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ClaimError> {
    if now > expires_at {
        return Err(ClaimError::InvalidOrExpiredToken);
    }
    Ok(())
}

/// Invariant: after a redemption all four flags hold at once.
pub fn invariant_committed(listing: &Listing, account: &Account, claimant: AccountId) -> bool {
    listing.owner_id == Some(claimant)
        && listing.is_verified
        && account.id == claimant
        && account.is_owner
        && account.is_verified_owner
}
