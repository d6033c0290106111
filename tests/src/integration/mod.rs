//! Cross-crate integration tests.

pub mod http;
pub mod reconciliation;
pub mod scenarios;
