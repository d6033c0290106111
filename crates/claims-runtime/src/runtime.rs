//! Claims runtime: owns the store handle, the workflow service and the
//! background sweep.
//!
//! ## Lifecycle
//!
//! 1. `ClaimsRuntime::build` connects the document store and picks a mailer
//! 2. `serve` runs the gateway and the sweeper until the shutdown future fires
//! 3. `shutdown` flushes and closes the store

use anyhow::{Context, Result};
use claim_verification::{
    BrevoMailer, ClaimMailer, ClaimState, ClaimVerificationApi, ClaimVerificationService,
    DocumentStore, LogMailer, ReconciliationReport,
};
use claims_gateway::ClaimsGateway;
use serde::{Deserialize, Serialize};
use shared_types::{Account, Listing, ListingId};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::RuntimeConfig;

/// Directory entities to import into the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    /// Listings to upsert
    pub listings: Vec<Listing>,
    /// Accounts to upsert
    pub accounts: Vec<Account>,
}

impl SeedData {
    /// Read a JSON seed file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))
    }
}

/// The assembled claim verification service.
pub struct ClaimsRuntime {
    config: RuntimeConfig,
    store: Arc<DocumentStore>,
    service: Arc<ClaimVerificationService>,
}

impl ClaimsRuntime {
    /// Connect the store and build the service with the configured mailer.
    pub fn build(config: RuntimeConfig) -> Result<Self> {
        let mailer: Arc<dyn ClaimMailer> = if config.mailer.brevo_configured() {
            info!(sender = %config.mailer.sender_email, "Using Brevo mailer");
            Arc::new(BrevoMailer::new(config.mailer.clone()))
        } else {
            warn!("Brevo not configured, claim emails go to the log");
            Arc::new(LogMailer::new(config.mailer.clone()))
        };
        Self::with_mailer(config, mailer)
    }

    /// Connect the store and build the service around `mailer`.
    pub fn with_mailer(config: RuntimeConfig, mailer: Arc<dyn ClaimMailer>) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let store = Arc::new(
            DocumentStore::connect(config.store.clone()).context("Failed to connect document store")?,
        );
        let service = Arc::new(ClaimVerificationService::new(
            config.claims.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            mailer,
        ));
        Ok(Self {
            config,
            store,
            service,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Workflow service.
    pub fn service(&self) -> Arc<ClaimVerificationService> {
        Arc::clone(&self.service)
    }

    /// Store handle.
    pub fn store(&self) -> Arc<DocumentStore> {
        Arc::clone(&self.store)
    }

    /// Run the gateway and the periodic sweep until `shutdown` resolves.
    pub async fn serve<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let sweeper = spawn_sweeper(
            self.service.clone(),
            self.config.claims.sweep_interval(),
            stop_rx,
        );

        let gateway = ClaimsGateway::new(self.config.gateway.clone(), self.service.clone())
            .context("Failed to create gateway")?;
        let served = gateway.serve(shutdown).await;

        if let Err(e) = stop_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        if let Err(e) = sweeper.await {
            error!("Sweeper task failed: {}", e);
        }
        served.context("Gateway stopped with an error")
    }

    /// Remove expired claims once.
    pub async fn sweep_once(&self) -> Result<usize> {
        self.service
            .sweep_expired()
            .await
            .context("Expired-claim sweep failed")
    }

    /// Run one reconciliation pass.
    pub async fn reconcile_once(&self) -> Result<ReconciliationReport> {
        let report = self
            .service
            .reconcile()
            .await
            .context("Reconciliation pass failed")?;
        info!(
            repaired = report.repaired.len(),
            conflicts = report.conflicts.len(),
            failed = report.failed.len(),
            "Reconciliation pass complete"
        );
        Ok(report)
    }

    /// Claim lifecycle position of one listing.
    pub async fn claim_state(&self, listing_id: ListingId) -> Result<ClaimState> {
        self.service
            .claim_state(listing_id)
            .await
            .with_context(|| format!("Failed to read claim state of {listing_id}"))
    }

    /// Upsert listings and accounts.
    pub fn seed(&self, seed: SeedData) -> Result<(usize, usize)> {
        let listings = seed.listings.len();
        let accounts = seed.accounts.len();
        for listing in seed.listings {
            listing
                .check_invariant()
                .with_context(|| format!("Rejected listing {}", listing.id))?;
            self.store.upsert_listing(listing)?;
        }
        for account in seed.accounts {
            account
                .check_invariant()
                .with_context(|| format!("Rejected account {}", account.id))?;
            self.store.upsert_account(account)?;
        }
        info!(listings, accounts, "Seed data imported");
        Ok((listings, accounts))
    }

    /// Flush and close the store.
    pub fn shutdown(self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        self.store.close().context("Failed to close document store")?;
        info!("Shutdown complete");
        Ok(())
    }
}

/// Periodically delete expired claims until `shutdown` flips.
pub fn spawn_sweeper(
    service: Arc<ClaimVerificationService>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = service.sweep_expired().await {
                        warn!(error = %e, "Expired-claim sweep failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Sweeper shutting down");
                    break;
                }
            }
        }
    })
}
