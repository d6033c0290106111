//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the verification workflow requires the host application to
//! provide. All cross-request coordination goes through the atomic
//! primitives of [`ClaimStore`]; the workflow keeps no shared mutable state.
//!
//! Production: `DocumentStore` (adapters/document_store.rs), `BrevoMailer`
//! Testing: `DocumentStore::in_memory()`, `RecordingMailer`, `ManualTimeSource`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared_types::{Account, AccountId, Listing, ListingId};
use uuid::Uuid;

use crate::algorithms::generate_token;
use crate::domain::{
    ClaimEmail, ClaimToken, CommitError, CommitOutcome, ConsumedClaim, DeliveryError,
    PendingClaim, PendingCommit, StoreError,
};

/// Persistence of pending claims and commit markers.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Insert a claim.
    ///
    /// Check-and-insert is one atomic step: fails with `DuplicateActiveClaim`
    /// when a claim for the same listing is still live at `claim.created_at`
    /// or a commit for the listing is still pending. An expired claim for the
    /// listing is replaced. Stores that also hold the listing fail with
    /// `AlreadyOwned` once it has an owner.
    async fn create(&self, claim: PendingClaim) -> Result<(), StoreError>;

    /// Look a claim up by token. Expired rows are returned as-is.
    async fn find_by_token(&self, token: &ClaimToken) -> Result<Option<PendingClaim>, StoreError>;

    /// Atomically delete the claim and record a commit marker.
    ///
    /// Of any number of concurrent calls with one token exactly one succeeds;
    /// the rest fail with `NotFound`.
    async fn consume(
        &self,
        token: &ClaimToken,
        consumed_at: DateTime<Utc>,
    ) -> Result<ConsumedClaim, StoreError>;

    /// Delete a claim without recording a marker (delivery rollback).
    async fn discard(&self, token: &ClaimToken) -> Result<(), StoreError>;

    /// Remove claims expired at `now`. Housekeeping only.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// The live claim for a listing, if any.
    async fn find_by_listing(
        &self,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingClaim>, StoreError>;

    /// Clear a commit marker after its commit landed.
    async fn resolve_commit(&self, commit_id: Uuid) -> Result<(), StoreError>;

    /// Markers still waiting for their commit.
    async fn pending_commits(&self) -> Result<Vec<PendingCommit>, StoreError>;
}

/// Read access to the directory entities.
#[async_trait]
pub trait ListingDirectory: Send + Sync {
    /// Fetch a listing.
    async fn find_listing(&self, id: ListingId) -> Result<Option<Listing>, StoreError>;

    /// Fetch an account.
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;
}

/// Applies the terminal transition to listing and account as one commit.
///
/// Stores without multi-document transactions update the listing first and
/// the account second, and report a failed second half as
/// `AccountUpdateFailed`. Re-applying a commit is harmless.
#[async_trait]
pub trait ListingAccountMutator: Send + Sync {
    /// Listing: `owner_id = account_id`, `is_verified = true`.
    /// Account: `is_owner = true`, `is_verified_owner = true`.
    async fn commit(
        &self,
        listing_id: ListingId,
        account_id: AccountId,
    ) -> Result<CommitOutcome, CommitError>;
}

/// Out-of-band delivery of claim tokens.
#[async_trait]
pub trait ClaimMailer: Send + Sync {
    /// Send one claim email. The caller bounds the call with a timeout.
    async fn send(&self, email: &ClaimEmail) -> Result<(), DeliveryError>;
}

/// Source of claim tokens.
pub trait TokenGenerator: Send + Sync {
    /// Produce a fresh, unguessable token.
    fn generate(&self) -> ClaimToken;
}

/// Token generator backed by the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsTokenGenerator;

impl TokenGenerator for OsTokenGenerator {
    fn generate(&self) -> ClaimToken {
        generate_token()
    }
}

/// Time source, abstracted for deterministic expiry tests.
pub trait TimeSource: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests.
#[derive(Debug)]
pub struct ManualTimeSource {
    now: Mutex<DateTime<Utc>>,
}

impl ManualTimeSource {
    /// Start the clock at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
