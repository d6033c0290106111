//! Request extractors and middleware.

pub mod auth;

pub use auth::{CallerIdentity, ACCOUNT_ID_HEADER};
