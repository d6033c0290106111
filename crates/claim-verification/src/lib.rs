//! # Claim Verification
//!
//! Ownership claim and verification of business listings.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Lets an account prove control of a listing's contact mailbox:
//! - a single-use token is generated and emailed to the listing's contact
//! - presenting the token within its TTL makes the account the verified owner
//! - listing and account flags are flipped together, never one without the other
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | One live claim per listing | Atomic check-and-insert in `ClaimStore::create` |
//! | Single-use tokens | Atomic delete-and-return in `ClaimStore::consume` |
//! | No orphan claims | Claim discarded when email delivery fails or times out |
//! | Lazy expiry | `expires_at` checked on every redeem, sweep is housekeeping |
//! | Repairable commits | Commit marker written on consume, cleared after commit |
//!
//! ## Module Structure
//!
//! ```text
//! claim-verification/
//! ├── domain/          # ClaimToken, PendingClaim, PendingCommit, errors, invariants
//! ├── algorithms/      # CSPRNG token generation
//! ├── ports/           # API trait (inbound) + store/mailer/clock traits (outbound)
//! ├── application/     # ClaimVerificationService orchestrating the workflow
//! ├── adapters/        # DocumentStore, BrevoMailer, LogMailer, test mailers
//! └── config.rs        # ClaimVerificationConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    BrevoMailer, DocumentStore, FailingMailer, LogMailer, MailerConfig, RecordingMailer,
    StoreConfig,
};
pub use algorithms::generate_token;
pub use application::{ClaimVerificationService, RECONCILIATION_TARGET};
pub use config::{ClaimVerificationConfig, ConfigError};
pub use domain::{
    ClaimEmail, ClaimError, ClaimReceipt, ClaimState, ClaimToken, CommitError, CommitOutcome,
    ConsumedClaim, ContactEmail, DeliveryError, PendingClaim, PendingCommit,
    ReconciliationReport, Redemption, StoreError, ALREADY_CLAIMED_MESSAGE,
    INVALID_OR_EXPIRED_MESSAGE, TOKEN_BYTES, TOKEN_HEX_LEN,
};
pub use ports::{
    ClaimMailer, ClaimStore, ClaimVerificationApi, ListingAccountMutator, ListingDirectory,
    ManualTimeSource, OsTokenGenerator, SystemTimeSource, TimeSource, TokenGenerator,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
