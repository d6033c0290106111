//! Test harness: a seeded in-memory store and a service wired to a
//! recording mailer.

use std::sync::Arc;

use claim_verification::{
    ClaimMailer, ClaimToken, ClaimVerificationConfig, ClaimVerificationService, DocumentStore,
    ListingAccountMutator, RecordingMailer,
};
use shared_types::{Account, AccountId, Listing, ListingId};

/// Seeded store plus a service over it.
pub struct Harness {
    /// Backing store (also directory and mutator)
    pub store: Arc<DocumentStore>,
    /// Mailer capturing every dispatched token
    pub mailer: Arc<RecordingMailer>,
    /// Service under test
    pub service: Arc<ClaimVerificationService>,
    /// Seeded listings, all unclaimed
    pub listings: Vec<ListingId>,
    /// Seeded accounts, none owners
    pub accounts: Vec<AccountId>,
}

impl Harness {
    /// `listings` unclaimed listings and `accounts` plain accounts.
    pub fn new(config: ClaimVerificationConfig, listings: usize, accounts: usize) -> Self {
        let store = Arc::new(DocumentStore::in_memory());
        let mailer = Arc::new(RecordingMailer::new());
        Self::build(config, store, mailer.clone(), mailer, None, listings, accounts)
    }

    /// Same as [`Harness::new`] with a custom mailer in front of the recorder.
    pub fn with_mailer(
        config: ClaimVerificationConfig,
        mailer: Arc<dyn ClaimMailer>,
        listings: usize,
        accounts: usize,
    ) -> Self {
        let store = Arc::new(DocumentStore::in_memory());
        Self::build(
            config,
            store,
            Arc::new(RecordingMailer::new()),
            mailer,
            None,
            listings,
            accounts,
        )
    }

    /// Same as [`Harness::new`] with a custom mutator.
    pub fn with_mutator(
        config: ClaimVerificationConfig,
        store: Arc<DocumentStore>,
        mutator: Arc<dyn ListingAccountMutator>,
        listings: usize,
        accounts: usize,
    ) -> Self {
        let mailer = Arc::new(RecordingMailer::new());
        Self::build(config, store, mailer.clone(), mailer, Some(mutator), listings, accounts)
    }

    fn build(
        config: ClaimVerificationConfig,
        store: Arc<DocumentStore>,
        recorder: Arc<RecordingMailer>,
        mailer: Arc<dyn ClaimMailer>,
        mutator: Option<Arc<dyn ListingAccountMutator>>,
        listings: usize,
        accounts: usize,
    ) -> Self {
        let listings: Vec<ListingId> = (0..listings)
            .map(|i| {
                let id = ListingId::new_v4();
                store
                    .upsert_listing(Listing::unclaimed(id, format!("Listing {i}")))
                    .unwrap();
                id
            })
            .collect();
        let accounts: Vec<AccountId> = (0..accounts)
            .map(|i| {
                let id = AccountId::new_v4();
                store
                    .upsert_account(Account::new(id, format!("user{i}@example.com")))
                    .unwrap();
                id
            })
            .collect();
        let mutator = mutator.unwrap_or_else(|| store.clone() as Arc<dyn ListingAccountMutator>);
        let service = Arc::new(ClaimVerificationService::new(
            config,
            store.clone(),
            store.clone(),
            mutator,
            mailer,
        ));
        Self {
            store,
            mailer: recorder,
            service,
            listings,
            accounts,
        }
    }

    /// Last token emailed to `address`.
    pub fn token_sent_to(&self, address: &str) -> Option<ClaimToken> {
        self.mailer
            .sent()
            .into_iter()
            .rev()
            .find(|email| email.to.as_str() == address)
            .map(|email| email.token)
    }

    /// All four post-redemption flags hold for `listing` owned by `account`.
    pub fn is_committed(&self, listing: ListingId, account: AccountId) -> bool {
        match (self.store.listing(listing), self.store.account(account)) {
            (Some(l), Some(a)) => claim_verification::domain::invariant_committed(&l, &a, account),
            _ => false,
        }
    }
}
