//! # Claims Runtime
//!
//! Assembles the claim verification service for deployment.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (TOML file, then environment)
//! 2. Initialize logging
//! 3. Connect the document store
//! 4. Select the mailer (Brevo when configured, log otherwise)
//! 5. Serve HTTP and run the expired-claim sweep
//! 6. On Ctrl+C: stop the gateway and the sweep, then close the store
//!
//! ## Modules
//!
//! - `config` - `RuntimeConfig` and its loading rules
//! - `telemetry` - tracing subscriber setup
//! - `runtime` - `ClaimsRuntime` lifecycle and the sweeper task

pub mod config;
pub mod runtime;
pub mod telemetry;

pub use config::{LogConfig, RuntimeConfig, RuntimeConfigError};
pub use runtime::{spawn_sweeper, ClaimsRuntime, SeedData};
pub use telemetry::{init_tracing, TelemetryError};
