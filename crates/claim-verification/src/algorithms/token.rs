//! # Token Generation
//!
//! Claim tokens are 256 bits from the operating system CSPRNG, hex-encoded.
//! Guessing one inside a 24 hour window is infeasible; the store's unique
//! key is only a backstop against collisions.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::domain::{ClaimToken, TOKEN_BYTES};

/// Generate a fresh claim token.
pub fn generate_token() -> ClaimToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    ClaimToken::from_bytes(&bytes)
}
