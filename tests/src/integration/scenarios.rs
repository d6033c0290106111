//! # Claim Scenarios
//!
//! End-to-end stories over the real store, driven only through
//! [`ClaimVerificationApi`](claim_verification::ClaimVerificationApi).

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use claim_verification::{
        ClaimError, ClaimState, ClaimStore, ClaimVerificationApi, ClaimVerificationConfig,
        FailingMailer,
    };

    use crate::fixtures::Harness;

    fn one_second_ttl() -> ClaimVerificationConfig {
        ClaimVerificationConfig {
            claim_ttl_secs: 1,
            ..ClaimVerificationConfig::for_testing()
        }
    }

    /// L1 unclaimed; A1 claims and redeems; A2 is turned away at every step.
    #[tokio::test]
    async fn test_first_claimant_wins_listing() {
        let h = Harness::new(ClaimVerificationConfig::for_testing(), 1, 2);
        let (l1, a1, a2) = (h.listings[0], h.accounts[0], h.accounts[1]);

        let receipt = h.service.initiate_claim(l1, a1, "a1@shop.example").await.unwrap();
        assert_eq!(receipt.listing_id, l1);
        assert_eq!(receipt.claimant_id, a1);
        assert_eq!(
            h.service.claim_state(l1).await.unwrap(),
            ClaimState::PendingVerification
        );

        let err = h
            .service
            .initiate_claim(l1, a2, "a2@shop.example")
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::DuplicateActiveClaim(id) if id == l1));
        assert_eq!(err.user_message(), "already claimed, try again later");

        let token = h.token_sent_to("a1@shop.example").unwrap();
        let redemption = h.service.redeem(token.expose()).await.unwrap();
        assert_eq!(redemption.listing_id, l1);
        assert_eq!(redemption.claimant_id, a1);
        assert!(h.is_committed(l1, a1));
        assert_eq!(h.service.claim_state(l1).await.unwrap(), ClaimState::Verified);

        let err = h
            .service
            .initiate_claim(l1, a2, "a2@shop.example")
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::AlreadyOwned(id) if id == l1));

        let replay = h.service.redeem(token.expose()).await.unwrap_err();
        assert!(matches!(replay, ClaimError::InvalidOrExpiredToken));
        assert_eq!(h.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_redemption_sets_all_four_flags() {
        let h = Harness::new(ClaimVerificationConfig::for_testing(), 1, 1);
        let (listing, account) = (h.listings[0], h.accounts[0]);
        assert!(!h.is_committed(listing, account));

        h.service
            .initiate_claim(listing, account, "owner@shop.example")
            .await
            .unwrap();
        let token = h.token_sent_to("owner@shop.example").unwrap();
        h.service.redeem(token.expose()).await.unwrap();

        let listing_row = h.store.listing(listing).unwrap();
        let account_row = h.store.account(account).unwrap();
        assert_eq!(listing_row.owner_id, Some(account));
        assert!(listing_row.is_verified);
        assert!(account_row.is_owner);
        assert!(account_row.is_verified_owner);
        assert_eq!(h.store.claim_count(), 0);
    }

    #[tokio::test]
    async fn test_token_expires_in_real_time() {
        let h = Harness::new(one_second_ttl(), 1, 2);
        let (listing, a1, a2) = (h.listings[0], h.accounts[0], h.accounts[1]);

        h.service.initiate_claim(listing, a1, "a1@shop.example").await.unwrap();
        let stale = h.token_sent_to("a1@shop.example").unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let err = h.service.redeem(stale.expose()).await.unwrap_err();
        assert!(matches!(err, ClaimError::InvalidOrExpiredToken));
        assert!(!h.is_committed(listing, a1));
        assert_eq!(h.service.claim_state(listing).await.unwrap(), ClaimState::Unclaimed);

        // The expired row has not been swept; it must not block a new claim.
        assert_eq!(h.store.claim_count(), 1);
        h.service.initiate_claim(listing, a2, "a2@shop.example").await.unwrap();
        let fresh = h.token_sent_to("a2@shop.example").unwrap();
        assert_ne!(fresh, stale);
        h.service.redeem(fresh.expose()).await.unwrap();
        assert!(h.is_committed(listing, a2));
    }

    #[tokio::test]
    async fn test_unswept_expired_token_still_rejected() {
        let h = Harness::new(one_second_ttl(), 2, 2);
        h.service
            .initiate_claim(h.listings[0], h.accounts[0], "a@shop.example")
            .await
            .unwrap();
        h.service
            .initiate_claim(h.listings[1], h.accounts[1], "b@shop.example")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let token = h.token_sent_to("a@shop.example").unwrap();
        assert!(h.store.find_by_token(&token).await.unwrap().is_some());
        assert!(matches!(
            h.service.redeem(token.expose()).await,
            Err(ClaimError::InvalidOrExpiredToken)
        ));

        assert_eq!(h.service.sweep_expired().await.unwrap(), 2);
        assert_eq!(h.store.claim_count(), 0);
        assert!(matches!(
            h.service.redeem(token.expose()).await,
            Err(ClaimError::InvalidOrExpiredToken)
        ));
    }

    #[tokio::test]
    async fn test_delivery_failure_then_immediate_retry() {
        let mailer = Arc::new(FailingMailer::times(1));
        let h = Harness::with_mailer(
            ClaimVerificationConfig::for_testing(),
            mailer.clone(),
            1,
            1,
        );
        let (listing, account) = (h.listings[0], h.accounts[0]);

        let err = h
            .service
            .initiate_claim(listing, account, "owner@shop.example")
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::DeliveryFailed(_)));
        assert_eq!(h.store.claim_count(), 0, "undelivered claim is rolled back");
        assert_eq!(h.service.claim_state(listing).await.unwrap(), ClaimState::Unclaimed);

        h.service
            .initiate_claim(listing, account, "owner@shop.example")
            .await
            .unwrap();
        let delivered = mailer.delivered();
        assert_eq!(delivered.len(), 1);

        h.service.redeem(delivered[0].token.expose()).await.unwrap();
        assert!(h.is_committed(listing, account));
    }

    #[tokio::test]
    async fn test_claimant_identity_comes_from_the_claim() {
        let h = Harness::new(ClaimVerificationConfig::for_testing(), 1, 2);
        let (listing, owner, bystander) = (h.listings[0], h.accounts[0], h.accounts[1]);

        // The contact address need not match the account's own email.
        h.service
            .initiate_claim(listing, owner, "front-desk@shop.example")
            .await
            .unwrap();
        let token = h.token_sent_to("front-desk@shop.example").unwrap();
        let redemption = h.service.redeem(token.expose()).await.unwrap();

        assert_eq!(redemption.claimant_id, owner);
        assert!(h.is_committed(listing, owner));
        let other = h.store.account(bystander).unwrap();
        assert!(!other.is_owner && !other.is_verified_owner);
    }

    #[tokio::test]
    async fn test_rejections_look_alike() {
        let h = Harness::new(ClaimVerificationConfig::for_testing(), 1, 1);
        let unknown = "ab".repeat(32);
        let malformed = "not-a-token";

        for raw in [unknown.as_str(), malformed, ""] {
            let err = h.service.redeem(raw).await.unwrap_err();
            assert!(matches!(err, ClaimError::InvalidOrExpiredToken));
            assert_eq!(err.user_message(), "invalid or expired");
        }
    }
}
