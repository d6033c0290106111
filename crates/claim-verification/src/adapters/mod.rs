//! # Adapters
//!
//! Concrete implementations of the outbound ports.

pub mod document_store;
pub mod mailer;

pub use document_store::{DocumentStore, StoreConfig};
pub use mailer::{
    BrevoMailer, FailingMailer, LogMailer, MailerConfig, RecordingMailer, BREVO_ENDPOINT,
    DEV_MAILER_TARGET,
};
