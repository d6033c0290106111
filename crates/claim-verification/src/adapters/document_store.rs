//! # Document Store Adapter
//!
//! In-process document store holding the claim, commit-marker, listing and
//! account collections behind one lock.
//!
//! ## Atomicity
//!
//! Every port operation runs under a single write lock, so
//! - `create` is one check-and-insert against the per-listing unique index,
//!   the listing's owner and the outstanding commit markers
//! - `consume` is one delete-and-return that also records the commit marker
//! - `commit` validates both entities before touching either, then updates both
//!
//! ## Persistence
//!
//! With a `data_path`, each mutation is applied to a draft copy, the draft is
//! written to `<path>.tmp`, fsynced and renamed over `<path>`, and only then
//! becomes the live state. A failed write leaves the live state untouched.
//! Without a path the store is memory-only.
//!
//! ## Lifecycle
//!
//! The handle is built explicitly with [`DocumentStore::connect`], shared by
//! `Arc` across request handlers and torn down with [`DocumentStore::close`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{Account, AccountId, Listing, ListingId};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    ClaimToken, CommitError, CommitOutcome, ConsumedClaim, PendingClaim, PendingCommit, StoreError,
};
use crate::ports::{ClaimStore, ListingAccountMutator, ListingDirectory};

/// Document store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot file. `None` keeps everything in memory.
    pub data_path: Option<PathBuf>,
}

impl StoreConfig {
    /// Memory-only store.
    pub fn in_memory() -> Self {
        Self { data_path: None }
    }

    /// Store persisted at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: Some(path.into()),
        }
    }
}

/// On-disk shape.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    claims: Vec<PendingClaim>,
    pending_commits: Vec<PendingCommit>,
    listings: Vec<Listing>,
    accounts: Vec<Account>,
}

#[derive(Debug, Clone, Default)]
struct Collections {
    claims: HashMap<ClaimToken, PendingClaim>,
    /// Unique index: at most one claim row per listing.
    claims_by_listing: HashMap<ListingId, ClaimToken>,
    commits: HashMap<Uuid, PendingCommit>,
    listings: HashMap<ListingId, Listing>,
    accounts: HashMap<AccountId, Account>,
}

impl Collections {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut collections = Self::default();
        let mut claims = snapshot.claims;
        claims.sort_by_key(|c| c.created_at);
        for claim in claims {
            // Newest row wins if a snapshot ever holds two for one listing.
            if let Some(old) = collections
                .claims_by_listing
                .insert(claim.listing_id, claim.token.clone())
            {
                collections.claims.remove(&old);
            }
            collections.claims.insert(claim.token.clone(), claim);
        }
        collections.commits = snapshot
            .pending_commits
            .into_iter()
            .map(|c| (c.commit_id, c))
            .collect();
        collections.listings = snapshot.listings.into_iter().map(|l| (l.id, l)).collect();
        collections.accounts = snapshot.accounts.into_iter().map(|a| (a.id, a)).collect();
        collections
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot {
            claims: self.claims.values().cloned().collect(),
            pending_commits: self.commits.values().cloned().collect(),
            listings: self.listings.values().cloned().collect(),
            accounts: self.accounts.values().cloned().collect(),
        };
        snapshot.claims.sort_by_key(|c| c.created_at);
        snapshot.pending_commits.sort_by_key(|c| c.consumed_at);
        snapshot.listings.sort_by_key(|l| l.id);
        snapshot.accounts.sort_by_key(|a| a.id);
        snapshot
    }

    fn remove_claim(&mut self, token: &ClaimToken) -> Option<PendingClaim> {
        let claim = self.claims.remove(token)?;
        if self.claims_by_listing.get(&claim.listing_id) == Some(token) {
            self.claims_by_listing.remove(&claim.listing_id);
        }
        Some(claim)
    }
}

/// Document store handle.
pub struct DocumentStore {
    collections: RwLock<Collections>,
    data_path: Option<PathBuf>,
    closed: AtomicBool,
}

impl DocumentStore {
    /// Open the store, loading the snapshot at `config.data_path` if present.
    pub fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let collections = match &config.data_path {
            Some(path) => Collections::from_snapshot(load_snapshot(path)?),
            None => Collections::default(),
        };
        info!(
            path = ?config.data_path,
            claims = collections.claims.len(),
            pending_commits = collections.commits.len(),
            listings = collections.listings.len(),
            accounts = collections.accounts.len(),
            "Document store connected"
        );
        Ok(Self {
            collections: RwLock::new(collections),
            data_path: config.data_path,
            closed: AtomicBool::new(false),
        })
    }

    /// Memory-only store (tests, local development).
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(Collections::default()),
            data_path: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Flush and refuse further operations.
    pub fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.flush()?;
        info!(path = ?self.data_path, "Document store closed");
        Ok(())
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Write the current state to disk (no-op when memory-only).
    pub fn flush(&self) -> Result<(), StoreError> {
        let collections = self.collections.read();
        self.persist(&collections)
    }

    /// Insert or replace a listing.
    pub fn upsert_listing(&self, listing: Listing) -> Result<(), StoreError> {
        self.mutate(|c| {
            c.listings.insert(listing.id, listing);
            Ok::<_, StoreError>(())
        })
    }

    /// Insert or replace an account.
    pub fn upsert_account(&self, account: Account) -> Result<(), StoreError> {
        self.mutate(|c| {
            c.accounts.insert(account.id, account);
            Ok::<_, StoreError>(())
        })
    }

    /// Snapshot of one listing.
    pub fn listing(&self, id: ListingId) -> Option<Listing> {
        self.collections.read().listings.get(&id).cloned()
    }

    /// Snapshot of one account.
    pub fn account(&self, id: AccountId) -> Option<Account> {
        self.collections.read().accounts.get(&id).cloned()
    }

    /// Number of claim rows, expired ones included.
    pub fn claim_count(&self) -> usize {
        self.collections.read().claims.len()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Backend("document store is closed".to_string()));
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> Result<T, StoreError> {
        self.ensure_open()?;
        Ok(f(&self.collections.read()))
    }

    /// Apply `f` atomically. When persistent, `f` runs on a draft that only
    /// replaces the live state once it is on disk.
    fn mutate<T, E>(&self, f: impl FnOnce(&mut Collections) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.ensure_open()?;
        let mut live = self.collections.write();
        if self.data_path.is_none() {
            return f(&mut live);
        }
        let mut draft = live.clone();
        let out = f(&mut draft)?;
        self.persist(&draft)?;
        *live = draft;
        Ok(out)
    }

    fn persist(&self, collections: &Collections) -> Result<(), StoreError> {
        let Some(path) = &self.data_path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(&collections.to_snapshot())
            .map_err(|e| StoreError::Backend(format!("encode snapshot: {e}")))?;
        write_atomically(path, &bytes)
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(Snapshot::default()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Backend(format!("decode {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No snapshot yet, starting empty");
            Ok(Snapshot::default())
        }
        Err(e) => Err(StoreError::Backend(format!("read {}: {e}", path.display()))),
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_err = |e: std::io::Error| StoreError::Backend(format!("write {}: {e}", path.display()));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let temp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    std::fs::rename(&temp_path, path).map_err(io_err)
}

#[async_trait]
impl ClaimStore for DocumentStore {
    async fn create(&self, claim: PendingClaim) -> Result<(), StoreError> {
        self.mutate(|c| {
            if c.claims.contains_key(&claim.token) {
                return Err(StoreError::TokenCollision);
            }
            if c
                .listings
                .get(&claim.listing_id)
                .is_some_and(|listing| listing.is_claimed())
            {
                return Err(StoreError::AlreadyOwned(claim.listing_id));
            }
            // A consumed claim whose commit has not landed still holds the listing.
            if c.commits.values().any(|m| m.listing_id == claim.listing_id) {
                return Err(StoreError::DuplicateActiveClaim(claim.listing_id));
            }
            if let Some(existing) = c.claims_by_listing.get(&claim.listing_id).cloned() {
                let live = c
                    .claims
                    .get(&existing)
                    .is_some_and(|old| !old.is_expired_at(claim.created_at));
                if live {
                    return Err(StoreError::DuplicateActiveClaim(claim.listing_id));
                }
                c.remove_claim(&existing);
            }
            c.claims_by_listing
                .insert(claim.listing_id, claim.token.clone());
            c.claims.insert(claim.token.clone(), claim);
            Ok(())
        })
    }

    async fn find_by_token(&self, token: &ClaimToken) -> Result<Option<PendingClaim>, StoreError> {
        self.read(|c| c.claims.get(token).cloned())
    }

    async fn consume(
        &self,
        token: &ClaimToken,
        consumed_at: DateTime<Utc>,
    ) -> Result<ConsumedClaim, StoreError> {
        self.mutate(|c| {
            let claim = c.remove_claim(token).ok_or(StoreError::NotFound)?;
            let commit = PendingCommit {
                commit_id: Uuid::new_v4(),
                listing_id: claim.listing_id,
                claimant_id: claim.claimant_id,
                consumed_at,
            };
            c.commits.insert(commit.commit_id, commit.clone());
            Ok(ConsumedClaim { claim, commit })
        })
    }

    async fn discard(&self, token: &ClaimToken) -> Result<(), StoreError> {
        self.mutate(|c| {
            c.remove_claim(token);
            Ok(())
        })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.mutate(|c| {
            let expired: Vec<ClaimToken> = c
                .claims
                .values()
                .filter(|claim| claim.is_expired_at(now))
                .map(|claim| claim.token.clone())
                .collect();
            for token in &expired {
                c.remove_claim(token);
            }
            Ok(expired.len())
        })
    }

    async fn find_by_listing(
        &self,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingClaim>, StoreError> {
        self.read(|c| {
            c.claims_by_listing
                .get(&listing_id)
                .and_then(|token| c.claims.get(token))
                .filter(|claim| !claim.is_expired_at(now))
                .cloned()
        })
    }

    async fn resolve_commit(&self, commit_id: Uuid) -> Result<(), StoreError> {
        self.mutate(|c| {
            c.commits.remove(&commit_id);
            Ok(())
        })
    }

    async fn pending_commits(&self) -> Result<Vec<PendingCommit>, StoreError> {
        self.read(|c| {
            let mut commits: Vec<_> = c.commits.values().cloned().collect();
            commits.sort_by_key(|m| m.consumed_at);
            commits
        })
    }
}

#[async_trait]
impl ListingDirectory for DocumentStore {
    async fn find_listing(&self, id: ListingId) -> Result<Option<Listing>, StoreError> {
        self.read(|c| c.listings.get(&id).cloned())
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        self.read(|c| c.accounts.get(&id).cloned())
    }
}

#[async_trait]
impl ListingAccountMutator for DocumentStore {
    async fn commit(
        &self,
        listing_id: ListingId,
        account_id: AccountId,
    ) -> Result<CommitOutcome, CommitError> {
        self.mutate(|c| {
            if !c.listings.contains_key(&listing_id) {
                return Err(CommitError::ListingNotFound(listing_id));
            }
            let Some(account) = c.accounts.get_mut(&account_id) else {
                return Err(CommitError::AccountNotFound(account_id));
            };
            account.mark_verified_owner();
            let account = account.clone();

            let Some(listing) = c.listings.get_mut(&listing_id) else {
                return Err(CommitError::ListingNotFound(listing_id));
            };
            listing.mark_verified_owner(account_id);
            let listing = listing.clone();

            Ok(CommitOutcome { listing, account })
        })
    }
}
