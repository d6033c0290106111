//! # Algorithms
//!
//! Pure functions used by the workflow.

pub mod token;

pub use token::generate_token;
