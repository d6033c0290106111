//! # Shared Types Crate
//!
//! Identifiers and directory entities shared by the claim core, the HTTP
//! gateway and the runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Listing` and `Account` are defined once here.
//! - **Typed Identifiers**: listing and account ids are distinct newtypes, so a
//!   claimant id can never be passed where a listing id is expected.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
