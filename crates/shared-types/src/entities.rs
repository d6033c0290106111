//! # Directory Entities
//!
//! The listing and account records that an ownership claim ends up mutating.
//! Both are owned by the wider directory application; only the fields the
//! claim workflow reads or writes are modelled here.
//!
//! ## Invariants
//!
//! - `Listing::is_verified` implies `Listing::owner_id.is_some()`
//! - `Account::is_verified_owner` implies `Account::is_owner`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::EntityError;

/// Identifier of a business listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub Uuid);

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

macro_rules! uuid_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random identifier.
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Borrow the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(ListingId);
uuid_id!(AccountId);

/// A business listing in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Listing identifier.
    pub id: ListingId,
    /// Display name, used in the claim email.
    pub name: String,
    /// Owning account; `None` while unclaimed.
    pub owner_id: Option<AccountId>,
    /// Set only by a completed redemption.
    pub is_verified: bool,
}

impl Listing {
    /// An unclaimed listing.
    pub fn unclaimed(id: ListingId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id: None,
            is_verified: false,
        }
    }

    /// Whether some account already owns this listing.
    pub fn is_claimed(&self) -> bool {
        self.owner_id.is_some()
    }

    /// Record `owner` as the verified owner.
    pub fn mark_verified_owner(&mut self, owner: AccountId) {
        self.owner_id = Some(owner);
        self.is_verified = true;
    }

    /// Check the listing invariant.
    pub fn check_invariant(&self) -> Result<(), EntityError> {
        if self.is_verified && self.owner_id.is_none() {
            return Err(EntityError::VerifiedWithoutOwner(self.id.to_string()));
        }
        Ok(())
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Login email. A claim may be delivered elsewhere.
    pub email: String,
    /// Owns at least one listing.
    pub is_owner: bool,
    /// Ownership confirmed through a redeemed claim (paid tier).
    pub is_verified_owner: bool,
}

impl Account {
    /// A plain account with no ownership flags.
    pub fn new(id: AccountId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            is_owner: false,
            is_verified_owner: false,
        }
    }

    /// Set both ownership flags.
    pub fn mark_verified_owner(&mut self) {
        self.is_owner = true;
        self.is_verified_owner = true;
    }

    /// Check the account invariant.
    pub fn check_invariant(&self) -> Result<(), EntityError> {
        if self.is_verified_owner && !self.is_owner {
            return Err(EntityError::VerifiedOwnerWithoutOwnership(self.id.to_string()));
        }
        Ok(())
    }
}
