//! # Application Layer
//!
//! Service orchestrating the claim workflow over the ports.

pub mod service;

pub use service::{ClaimVerificationService, RECONCILIATION_TARGET};
