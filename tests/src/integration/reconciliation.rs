//! # Reconciliation
//!
//! A redemption that consumed its token but could not finish the
//! listing/account commit leaves a marker behind. These tests break the
//! commit half-way and check that `reconcile` repairs it, including after a
//! restart of the runtime.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use claim_verification::{
        ClaimError, ClaimState, ClaimStore, ClaimVerificationApi, ClaimVerificationConfig,
        CommitError, CommitOutcome, DocumentStore, ListingAccountMutator, RecordingMailer,
        StoreConfig,
    };
    use claims_runtime::{ClaimsRuntime, RuntimeConfig};
    use shared_types::{AccountId, ListingId};

    use crate::fixtures::Harness;

    /// Writes the listing half, then fails the account half `failures` times.
    struct SplitMutator {
        store: Arc<DocumentStore>,
        failures: AtomicUsize,
    }

    impl SplitMutator {
        fn new(store: Arc<DocumentStore>, failures: usize) -> Self {
            Self {
                store,
                failures: AtomicUsize::new(failures),
            }
        }
    }

    #[async_trait]
    impl ListingAccountMutator for SplitMutator {
        async fn commit(
            &self,
            listing_id: ListingId,
            account_id: AccountId,
        ) -> Result<CommitOutcome, CommitError> {
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if !failing {
                return self.store.commit(listing_id, account_id).await;
            }
            let mut listing = self
                .store
                .listing(listing_id)
                .ok_or(CommitError::ListingNotFound(listing_id))?;
            listing.mark_verified_owner(account_id);
            self.store.upsert_listing(listing)?;
            Err(CommitError::AccountUpdateFailed {
                listing_id,
                account_id,
                reason: "account collection unavailable".to_string(),
            })
        }
    }

    fn split_harness(store: Arc<DocumentStore>, failures: usize) -> Harness {
        let mutator = Arc::new(SplitMutator::new(store.clone(), failures));
        Harness::with_mutator(ClaimVerificationConfig::for_testing(), store, mutator, 1, 1)
    }

    #[tokio::test]
    async fn test_half_commit_is_reported_and_repaired() {
        let h = split_harness(Arc::new(DocumentStore::in_memory()), 1);
        let (listing, account) = (h.listings[0], h.accounts[0]);
        h.service
            .initiate_claim(listing, account, "owner@shop.example")
            .await
            .unwrap();
        let token = h.token_sent_to("owner@shop.example").unwrap();

        let err = h.service.redeem(token.expose()).await.unwrap_err();
        assert!(err.is_fatal());
        let commit_id = match err {
            ClaimError::ReconciliationFailure {
                commit_id,
                listing_id,
                claimant_id,
                cause: CommitError::AccountUpdateFailed { .. },
            } => {
                assert_eq!(listing_id, listing);
                assert_eq!(claimant_id, account);
                commit_id
            }
            other => panic!("expected a reconciliation failure, got {other:?}"),
        };

        // Half-applied: the listing moved, the account did not.
        assert!(h.store.listing(listing).unwrap().is_verified);
        assert!(!h.store.account(account).unwrap().is_verified_owner);
        assert!(!h.is_committed(listing, account));

        // The token is spent either way.
        assert!(matches!(
            h.service.redeem(token.expose()).await,
            Err(ClaimError::InvalidOrExpiredToken)
        ));
        let markers = h.store.pending_commits().await.unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].commit_id, commit_id);

        let report = h.service.reconcile().await.unwrap();
        assert_eq!(report.repaired, vec![commit_id]);
        assert!(report.is_clean());
        assert!(h.is_committed(listing, account));
        assert_eq!(h.service.claim_state(listing).await.unwrap(), ClaimState::Verified);

        let again = h.service.reconcile().await.unwrap();
        assert!(again.repaired.is_empty() && again.is_clean());
    }

    #[tokio::test]
    async fn test_repair_that_fails_again_keeps_marker() {
        let h = split_harness(Arc::new(DocumentStore::in_memory()), 2);
        let (listing, account) = (h.listings[0], h.accounts[0]);
        h.service
            .initiate_claim(listing, account, "owner@shop.example")
            .await
            .unwrap();
        let token = h.token_sent_to("owner@shop.example").unwrap();
        assert!(h.service.redeem(token.expose()).await.is_err());

        let first = h.service.reconcile().await.unwrap();
        assert_eq!(first.failed.len(), 1);
        assert!(!first.is_clean());
        assert_eq!(h.store.pending_commits().await.unwrap().len(), 1);

        let second = h.service.reconcile().await.unwrap();
        assert_eq!(second.repaired, first.failed);
        assert!(h.is_committed(listing, account));
    }

    #[tokio::test]
    async fn test_marker_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claims.json");

        let store = Arc::new(DocumentStore::connect(StoreConfig::at(&path)).unwrap());
        let h = split_harness(store, 1);
        let (listing, account) = (h.listings[0], h.accounts[0]);
        h.service
            .initiate_claim(listing, account, "owner@shop.example")
            .await
            .unwrap();
        let token = h.token_sent_to("owner@shop.example").unwrap();
        assert!(h.service.redeem(token.expose()).await.is_err());
        h.store.close().unwrap();

        let mut config = RuntimeConfig::for_testing();
        config.store = StoreConfig::at(&path);
        let runtime = ClaimsRuntime::with_mailer(config, Arc::new(RecordingMailer::new())).unwrap();
        assert_eq!(runtime.store().pending_commits().await.unwrap().len(), 1);

        let report = runtime.reconcile_once().await.unwrap();
        assert_eq!(report.repaired.len(), 1);
        assert!(report.is_clean());

        let store = runtime.store();
        let listing_row = store.listing(listing).unwrap();
        let account_row = store.account(account).unwrap();
        assert!(claim_verification::domain::invariant_committed(
            &listing_row,
            &account_row,
            account
        ));
        runtime.shutdown().unwrap();
    }
}
