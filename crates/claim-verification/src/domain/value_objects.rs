//! # Value Objects
//!
//! Immutable values used by the claim workflow.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::errors::ClaimError;

/// Random bytes behind every token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Length of the hex-encoded token.
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

/// Hex characters kept in a token fingerprint.
const FINGERPRINT_LEN: usize = 12;

/// Single-use claim credential.
///
/// The value only ever travels through the email channel. `Debug` and
/// `Display` print the fingerprint, so a token can sit in a log field
/// without leaking.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimToken(String);

impl ClaimToken {
    /// Build a token from raw random bytes.
    pub fn from_bytes(bytes: &[u8; TOKEN_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse a presented token. Anything other than 64 hex chars is rejected
    /// as `InvalidOrExpiredToken`, indistinguishable from an unknown token.
    pub fn parse(raw: &str) -> Result<Self, ClaimError> {
        let raw = raw.trim();
        if raw.len() != TOKEN_HEX_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ClaimError::InvalidOrExpiredToken);
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// The secret value. Only the mailer should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short, non-reversible identifier safe for logs and responses.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut out = hex::encode(digest);
        out.truncate(FINGERPRINT_LEN);
        out
    }
}

impl fmt::Debug for ClaimToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimToken({})", self.fingerprint())
    }
}

impl fmt::Display for ClaimToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

/// Address a claim token is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactEmail(String);

impl ContactEmail {
    /// Minimal shape check: one `@` with a non-empty local part and a dotted domain.
    pub fn parse(raw: &str) -> Result<Self, ClaimError> {
        let raw = raw.trim();
        let (local, domain) = raw.split_once('@').ok_or(ClaimError::InvalidContactEmail)?;
        let valid = !local.is_empty()
            && !domain.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !raw.chars().any(char::is_whitespace);
        if !valid {
            return Err(ClaimError::InvalidContactEmail);
        }
        Ok(Self(raw.to_string()))
    }

    /// The address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claim lifecycle of a listing, as observed at one instant.
///
/// ```text
/// Unclaimed ──initiate──→ PendingVerification ──redeem──→ Verified
///     ↑                          │
///     └──── expired / failed ────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimState {
    /// No owner and no live claim.
    Unclaimed,
    /// A live claim is waiting for redemption.
    PendingVerification,
    /// Ownership verified. Terminal.
    Verified,
}
