//! # Error Types
//!
//! Errors raised by the shared directory entities.

use thiserror::Error;

/// A directory entity is in a state its invariants forbid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Listing flagged verified with no owner.
    #[error("Listing {0} is verified but has no owner")]
    VerifiedWithoutOwner(String),

    /// Account flagged verified owner without the owner flag.
    #[error("Account {0} is a verified owner but not an owner")]
    VerifiedOwnerWithoutOwnership(String),
}
