//! # HTTP End-to-End
//!
//! The whole claim flow over a real TCP listener: initiate with a caller
//! identity, follow the emailed link, then read the listing state back.

#[cfg(test)]
mod tests {
    use claim_verification::{ClaimState, ClaimVerificationConfig};
    use claims_gateway::{
        ClaimAccepted, ClaimStateResponse, ClaimsGateway, ErrorBody, GatewayConfig,
        RedemptionResponse, RunningGateway, ACCOUNT_ID_HEADER,
    };
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::fixtures::Harness;

    async fn start(h: &Harness) -> (RunningGateway, String) {
        let gateway = ClaimsGateway::new(GatewayConfig::for_testing(), h.service.clone()).unwrap();
        let running = gateway.spawn().await.unwrap();
        let base = format!("http://{}", running.local_addr());
        (running, base)
    }

    #[tokio::test]
    async fn test_claim_flow_over_http() {
        let h = Harness::new(ClaimVerificationConfig::for_testing(), 1, 2);
        let (listing, a1, a2) = (h.listings[0], h.accounts[0], h.accounts[1]);
        let (running, base) = start(&h).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/claims"))
            .header(ACCOUNT_ID_HEADER, a1.to_string())
            .json(&json!({ "listingId": listing, "contactEmail": "owner@shop.example" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let accepted: ClaimAccepted = response.json().await.unwrap();
        assert_eq!(accepted.listing_id, listing);

        let response = client
            .post(format!("{base}/claims"))
            .header(ACCOUNT_ID_HEADER, a2.to_string())
            .json(&json!({ "listingId": listing, "contactEmail": "rival@shop.example" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.message, "already claimed, try again later");

        let token = h.token_sent_to("owner@shop.example").unwrap();
        let link = format!("{base}/claims/redeem/{}", token.expose());
        let response = client.get(&link).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let redemption: RedemptionResponse = response.json().await.unwrap();
        assert_eq!(redemption.claimant_id, a1);
        assert!(redemption.listing_verified && redemption.owner_verified);

        let response = client.get(&link).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.error, "InvalidOrExpiredToken");

        let state: ClaimStateResponse = client
            .get(format!("{base}/listings/{listing}/claim"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(state.state, ClaimState::Verified);
        assert!(h.is_committed(listing, a1));

        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_identity_sends_nothing() {
        let h = Harness::new(ClaimVerificationConfig::for_testing(), 1, 1);
        let (running, base) = start(&h).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/claims"))
            .json(&json!({ "listingId": h.listings[0], "contactEmail": "owner@shop.example" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(h.mailer.sent().is_empty());
        assert_eq!(h.store.claim_count(), 0);

        running.shutdown().await.unwrap();
    }
}
