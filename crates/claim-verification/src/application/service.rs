//! # Claim Verification Service
//!
//! Application service orchestrating the claim lifecycle:
//!
//! ```text
//! initiate:  check listing ─► create claim ─► send email ──(fail)──► discard
//! redeem:    parse ─► lookup ─► expiry ─► pre-checks ─► consume ─► commit
//!                                                           │          │
//!                                                     marker written  marker cleared
//! reconcile: for each surviving marker ─► commit again ─► clear
//! ```
//!
//! The service holds no mutable state of its own. Mutual exclusion between
//! concurrent initiations and redemptions comes from the store's atomic
//! `create` and `consume`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::ClaimVerificationConfig;
use crate::domain::{
    ClaimEmail, ClaimError, ClaimReceipt, ClaimState, ClaimToken, ContactEmail, DeliveryError,
    PendingClaim, PendingCommit, ReconciliationReport, Redemption, StoreError,
};
use crate::ports::{
    ClaimMailer, ClaimStore, ClaimVerificationApi, ListingAccountMutator, ListingDirectory,
    OsTokenGenerator, SystemTimeSource, TimeSource, TokenGenerator,
};
use shared_types::{AccountId, Listing, ListingId};

/// Log target for commits that need operator attention.
pub const RECONCILIATION_TARGET: &str = "reconciliation";

/// Fresh tokens tried when the store reports a collision.
const TOKEN_ATTEMPTS: usize = 3;

/// Claim verification service.
pub struct ClaimVerificationService {
    config: ClaimVerificationConfig,
    store: Arc<dyn ClaimStore>,
    directory: Arc<dyn ListingDirectory>,
    mutator: Arc<dyn ListingAccountMutator>,
    mailer: Arc<dyn ClaimMailer>,
    tokens: Arc<dyn TokenGenerator>,
    clock: Arc<dyn TimeSource>,
}

impl ClaimVerificationService {
    /// Create a service using the OS token generator and the system clock.
    pub fn new(
        config: ClaimVerificationConfig,
        store: Arc<dyn ClaimStore>,
        directory: Arc<dyn ListingDirectory>,
        mutator: Arc<dyn ListingAccountMutator>,
        mailer: Arc<dyn ClaimMailer>,
    ) -> Self {
        Self {
            config,
            store,
            directory,
            mutator,
            mailer,
            tokens: Arc::new(OsTokenGenerator),
            clock: Arc::new(SystemTimeSource),
        }
    }

    /// Replace the clock.
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the token generator.
    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ClaimVerificationConfig {
        &self.config
    }

    async fn unowned_listing(&self, listing_id: ListingId) -> Result<Listing, ClaimError> {
        let listing = self
            .directory
            .find_listing(listing_id)
            .await?
            .ok_or(ClaimError::ListingNotFound(listing_id))?;
        if listing.is_claimed() {
            return Err(ClaimError::AlreadyOwned(listing_id));
        }
        Ok(listing)
    }

    async fn ensure_account(&self, account_id: AccountId) -> Result<(), ClaimError> {
        match self.directory.find_account(account_id).await? {
            Some(_) => Ok(()),
            None => Err(ClaimError::AccountNotFound(account_id)),
        }
    }

    /// Insert a claim, regenerating the token on collision.
    async fn insert_claim(
        &self,
        listing_id: ListingId,
        claimant_id: AccountId,
        contact_email: ContactEmail,
    ) -> Result<PendingClaim, ClaimError> {
        for _ in 0..TOKEN_ATTEMPTS {
            let claim = PendingClaim::new(
                self.tokens.generate(),
                listing_id,
                claimant_id,
                contact_email.clone(),
                self.clock.now(),
                self.config.claim_ttl(),
            )?;
            match self.store.create(claim.clone()).await {
                Ok(()) => return Ok(claim),
                Err(StoreError::TokenCollision) => {
                    warn!(listing = %listing_id, "Token collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::TokenCollision.into())
    }

    async fn deliver(&self, email: &ClaimEmail) -> Result<(), DeliveryError> {
        let timeout = self.config.delivery_timeout();
        match tokio::time::timeout(timeout, self.mailer.send(email)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.config.delivery_timeout_ms)),
        }
    }

    /// Apply the commit for a consumed claim and clear its marker.
    async fn complete(&self, commit: &PendingCommit) -> Result<Redemption, ClaimError> {
        let outcome = match self.mutator.commit(commit.listing_id, commit.claimant_id).await {
            Ok(outcome) => outcome,
            Err(cause) => {
                error!(
                    target: RECONCILIATION_TARGET,
                    commit_id = %commit.commit_id,
                    listing = %commit.listing_id,
                    claimant = %commit.claimant_id,
                    error = %cause,
                    "Claim consumed but listing/account commit failed"
                );
                return Err(ClaimError::ReconciliationFailure {
                    commit_id: commit.commit_id,
                    listing_id: commit.listing_id,
                    claimant_id: commit.claimant_id,
                    cause,
                });
            }
        };

        if let Err(e) = self.store.resolve_commit(commit.commit_id).await {
            // The commit landed; a stale marker is repaired idempotently later.
            warn!(commit_id = %commit.commit_id, error = %e, "Failed to clear commit marker");
        }
        Ok(Redemption::from_outcome(&outcome))
    }
}

#[async_trait]
impl ClaimVerificationApi for ClaimVerificationService {
    async fn initiate_claim(
        &self,
        listing_id: ListingId,
        claimant_id: AccountId,
        contact_email: &str,
    ) -> Result<ClaimReceipt, ClaimError> {
        let listing = self.unowned_listing(listing_id).await?;
        let contact_email = ContactEmail::parse(contact_email)?;
        self.ensure_account(claimant_id).await?;

        let claim = self
            .insert_claim(listing_id, claimant_id, contact_email)
            .await?;

        let email = ClaimEmail {
            to: claim.contact_email.clone(),
            token: claim.token.clone(),
            listing_name: listing.name,
            subject: self.config.email_subject.clone(),
        };
        if let Err(cause) = self.deliver(&email).await {
            warn!(
                listing = %listing_id,
                token = %claim.token,
                error = %cause,
                "Claim email not delivered, rolling back"
            );
            if let Err(e) = self.store.discard(&claim.token).await {
                error!(token = %claim.token, error = %e, "Failed to discard undelivered claim");
            }
            return Err(ClaimError::DeliveryFailed(cause));
        }

        info!(
            listing = %listing_id,
            claimant = %claimant_id,
            token = %claim.token,
            expires_at = %claim.expires_at,
            "Claim initiated"
        );
        Ok(ClaimReceipt {
            listing_id,
            claimant_id,
            token_fingerprint: claim.token.fingerprint(),
            expires_at: claim.expires_at,
        })
    }

    async fn redeem(&self, token: &str) -> Result<Redemption, ClaimError> {
        let token = ClaimToken::parse(token)?;
        let now = self.clock.now();

        let claim = self
            .store
            .find_by_token(&token)
            .await?
            .ok_or(ClaimError::InvalidOrExpiredToken)?;
        if claim.is_expired_at(now) {
            debug!(token = %token, "Expired token presented");
            return Err(ClaimError::InvalidOrExpiredToken);
        }

        // Checked before consuming so the holder keeps a usable token.
        let listing = self
            .directory
            .find_listing(claim.listing_id)
            .await?
            .ok_or(ClaimError::ListingNotFound(claim.listing_id))?;
        if listing.owner_id.is_some_and(|owner| owner != claim.claimant_id) {
            return Err(ClaimError::AlreadyOwned(claim.listing_id));
        }
        self.ensure_account(claim.claimant_id).await?;

        let consumed = self.store.consume(&token, now).await?;
        let redemption = self.complete(&consumed.commit).await?;

        info!(
            listing = %redemption.listing_id,
            owner = %redemption.claimant_id,
            token = %token,
            "Claim redeemed"
        );
        Ok(redemption)
    }

    async fn sweep_expired(&self) -> Result<usize, ClaimError> {
        let removed = self.store.delete_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(removed, "Swept expired claims");
        }
        Ok(removed)
    }

    async fn reconcile(&self) -> Result<ReconciliationReport, ClaimError> {
        let mut report = ReconciliationReport::default();
        for commit in self.store.pending_commits().await? {
            let listing = self.directory.find_listing(commit.listing_id).await?;
            let owned_elsewhere = listing
                .as_ref()
                .and_then(|l| l.owner_id)
                .is_some_and(|owner| owner != commit.claimant_id);
            if owned_elsewhere {
                warn!(
                    target: RECONCILIATION_TARGET,
                    commit_id = %commit.commit_id,
                    listing = %commit.listing_id,
                    "Listing now owned by another account, leaving marker"
                );
                report.conflicts.push(commit.commit_id);
                continue;
            }

            match self.complete(&commit).await {
                Ok(_) => {
                    info!(
                        target: RECONCILIATION_TARGET,
                        commit_id = %commit.commit_id,
                        listing = %commit.listing_id,
                        "Commit repaired"
                    );
                    report.repaired.push(commit.commit_id);
                }
                Err(_) => report.failed.push(commit.commit_id),
            }
        }
        Ok(report)
    }

    async fn claim_state(&self, listing_id: ListingId) -> Result<ClaimState, ClaimError> {
        let listing = self
            .directory
            .find_listing(listing_id)
            .await?
            .ok_or(ClaimError::ListingNotFound(listing_id))?;
        if listing.is_claimed() {
            return Ok(ClaimState::Verified);
        }
        let pending = self
            .store
            .find_by_listing(listing_id, self.clock.now())
            .await?;
        if pending.is_some() {
            return Ok(ClaimState::PendingVerification);
        }
        // A consumed claim whose commit has not landed still holds the listing.
        let awaiting_commit = self
            .store
            .pending_commits()
            .await?
            .iter()
            .any(|commit| commit.listing_id == listing_id);
        Ok(if awaiting_commit {
            ClaimState::PendingVerification
        } else {
            ClaimState::Unclaimed
        })
    }
}
