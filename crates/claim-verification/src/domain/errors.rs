//! # Domain Errors
//!
//! The claim error taxonomy and the errors raised by each outbound port.
//!
//! Every [`ClaimError`] except `ReconciliationFailure` and `StoreUnavailable`
//! is an expected, user-facing outcome. `ReconciliationFailure` means a claim
//! was consumed but the listing/account commit did not land.

use shared_types::{AccountId, ListingId};
use thiserror::Error;
use uuid::Uuid;

/// Message shown for both `AlreadyOwned` and `DuplicateActiveClaim`.
pub const ALREADY_CLAIMED_MESSAGE: &str = "already claimed, try again later";

/// Message shown for every token rejection, whatever the cause.
pub const INVALID_OR_EXPIRED_MESSAGE: &str = "invalid or expired";

/// Errors surfaced by the verification workflow.
#[derive(Debug, Clone, Error)]
pub enum ClaimError {
    /// The listing already has an owner.
    #[error("Listing {0} already has an owner")]
    AlreadyOwned(ListingId),

    /// Another live claim is in flight for the listing.
    #[error("A pending claim already exists for listing {0}")]
    DuplicateActiveClaim(ListingId),

    /// The claim email could not be dispatched; the claim was rolled back.
    #[error("Claim email delivery failed: {0}")]
    DeliveryFailed(DeliveryError),

    /// Unknown, expired, malformed or already redeemed token.
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    /// The listing does not exist.
    #[error("Listing not found: {0}")]
    ListingNotFound(ListingId),

    /// The claimant account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The contact address is not a usable email address.
    #[error("Invalid contact email")]
    InvalidContactEmail,

    /// Claim consumed but the entity commit failed. Needs repair.
    #[error("Claim for listing {listing_id} consumed but commit {commit_id} failed: {cause}")]
    ReconciliationFailure {
        /// Saga marker left in the store.
        commit_id: Uuid,
        /// Listing that should have been verified.
        listing_id: ListingId,
        /// Account that should own it.
        claimant_id: AccountId,
        /// What the mutator reported.
        cause: CommitError,
    },

    /// The backing store failed.
    #[error("Claim store unavailable: {0}")]
    StoreUnavailable(StoreError),
}

impl ClaimError {
    /// Stable taxonomy code, used as the `error` field of response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::AlreadyOwned(_) => "AlreadyOwned",
            ClaimError::DuplicateActiveClaim(_) => "DuplicateActiveClaim",
            ClaimError::DeliveryFailed(_) => "DeliveryFailed",
            ClaimError::InvalidOrExpiredToken => "InvalidOrExpiredToken",
            ClaimError::ListingNotFound(_) => "ListingNotFound",
            ClaimError::AccountNotFound(_) => "AccountNotFound",
            ClaimError::InvalidContactEmail => "InvalidContactEmail",
            ClaimError::ReconciliationFailure { .. } => "ReconciliationFailure",
            ClaimError::StoreUnavailable(_) => "StoreUnavailable",
        }
    }

    /// Text safe to show the caller. Never reveals why a token was rejected.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClaimError::AlreadyOwned(_) | ClaimError::DuplicateActiveClaim(_) => {
                ALREADY_CLAIMED_MESSAGE
            }
            ClaimError::InvalidOrExpiredToken => INVALID_OR_EXPIRED_MESSAGE,
            ClaimError::DeliveryFailed(_) => "verification email could not be sent, try again",
            ClaimError::ListingNotFound(_) => "listing not found",
            ClaimError::AccountNotFound(_) => "account not found",
            ClaimError::InvalidContactEmail => "contact email is not valid",
            ClaimError::ReconciliationFailure { .. } | ClaimError::StoreUnavailable(_) => {
                "internal error"
            }
        }
    }

    /// Whether this outcome needs operator attention.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClaimError::ReconciliationFailure { .. })
    }
}

impl From<StoreError> for ClaimError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateActiveClaim(listing_id) => {
                ClaimError::DuplicateActiveClaim(listing_id)
            }
            StoreError::AlreadyOwned(listing_id) => ClaimError::AlreadyOwned(listing_id),
            StoreError::NotFound => ClaimError::InvalidOrExpiredToken,
            other => ClaimError::StoreUnavailable(other),
        }
    }
}

/// Errors raised by a claim store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A non-expired claim already exists for the listing.
    #[error("Duplicate active claim for listing {0}")]
    DuplicateActiveClaim(ListingId),

    /// The listing gained an owner before the claim could be inserted.
    #[error("Listing {0} already has an owner")]
    AlreadyOwned(ListingId),

    /// The generated token is already in use.
    #[error("Token collision")]
    TokenCollision,

    /// No record for the token (never existed or already consumed).
    #[error("Claim not found")]
    NotFound,

    /// Backend I/O or serialization failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors raised by the listing & account mutator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// Listing disappeared.
    #[error("Listing not found: {0}")]
    ListingNotFound(ListingId),

    /// Account disappeared.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The listing half was applied, the account half was not.
    #[error("Listing {listing_id} committed but account {account_id} update failed: {reason}")]
    AccountUpdateFailed {
        /// Listing already updated.
        listing_id: ListingId,
        /// Account left untouched.
        account_id: AccountId,
        /// Backend reason.
        reason: String,
    },

    /// Nothing was applied.
    #[error("Commit backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for CommitError {
    fn from(err: StoreError) -> Self {
        CommitError::Backend(err.to_string())
    }
}

/// Errors raised by a claim mailer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The provider refused the message.
    #[error("Rejected by provider: {0}")]
    Rejected(String),

    /// No answer within the delivery timeout.
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// Connection or encoding failure.
    #[error("Transport error: {0}")]
    Transport(String),
}
