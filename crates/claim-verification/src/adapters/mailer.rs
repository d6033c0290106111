//! # Claim Mailers
//!
//! - [`BrevoMailer`]: transactional email over the Brevo HTTP API
//! - [`LogMailer`]: development sink, writes the token to a debug log target
//! - [`RecordingMailer`] / [`FailingMailer`]: test doubles

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{ClaimEmail, ClaimToken, DeliveryError};
use crate::ports::ClaimMailer;

/// Brevo transactional email endpoint.
pub const BREVO_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

/// Log target the development mailer writes full tokens to.
pub const DEV_MAILER_TARGET: &str = "claims::dev_mailer";

/// Mail delivery configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    /// Brevo API key. Empty selects the log mailer.
    pub brevo_api_key: String,
    /// Verified sender address.
    pub sender_email: String,
    /// Sender display name.
    pub sender_name: Option<String>,
    /// Public base URL the redeem link is built on.
    pub redeem_base_url: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            brevo_api_key: String::new(),
            sender_email: "no-reply@localhost".to_string(),
            sender_name: None,
            redeem_base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

impl MailerConfig {
    /// Whether Brevo credentials are present.
    pub fn brevo_configured(&self) -> bool {
        !self.brevo_api_key.trim().is_empty() && !self.sender_email.trim().is_empty()
    }

    /// Link the recipient follows to redeem `token`.
    pub fn redeem_link(&self, token: &ClaimToken) -> String {
        format!(
            "{}/claims/redeem/{}",
            self.redeem_base_url.trim_end_matches('/'),
            token.expose()
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendBody<'a> {
    sender: BrevoAddress<'a>,
    to: Vec<BrevoAddress<'a>>,
    subject: &'a str,
    html_content: String,
    text_content: String,
}

/// Mailer backed by the Brevo transactional API.
pub struct BrevoMailer {
    client: reqwest::Client,
    config: MailerConfig,
    endpoint: String,
}

impl BrevoMailer {
    /// Create a mailer posting to the public Brevo endpoint.
    pub fn new(config: MailerConfig) -> Self {
        Self::with_endpoint(config, BREVO_ENDPOINT)
    }

    /// Create a mailer posting to `endpoint` (sandboxes, local fakes).
    pub fn with_endpoint(config: MailerConfig, endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            endpoint: endpoint.into(),
        }
    }

    fn render(&self, email: &ClaimEmail) -> (String, String) {
        let link = self.config.redeem_link(&email.token);
        let text = format!(
            "Someone asked to claim \"{}\" on your behalf.\n\n\
             Confirm ownership by opening:\n{link}\n\n\
             If this wasn't you, ignore this message.",
            email.listing_name
        );
        let html = format!(
            "<p>Someone asked to claim <strong>{}</strong> on your behalf.</p>\
             <p><a href=\"{link}\">Confirm ownership</a></p>\
             <p>If this wasn't you, ignore this message.</p>",
            escape_html(&email.listing_name)
        );
        (html, text)
    }
}

/// Escape text for an HTML body. Listing names come from the directory and
/// are not trusted.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[async_trait]
impl ClaimMailer for BrevoMailer {
    async fn send(&self, email: &ClaimEmail) -> Result<(), DeliveryError> {
        let (html_content, text_content) = self.render(email);
        let body = BrevoSendBody {
            sender: BrevoAddress {
                email: &self.config.sender_email,
                name: self.config.sender_name.as_deref(),
            },
            to: vec![BrevoAddress {
                email: email.to.as_str(),
                name: None,
            }],
            subject: &email.subject,
            html_content,
            text_content,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.config.brevo_api_key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(token = %email.token, "Claim email accepted by Brevo");
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        warn!(token = %email.token, status = status.as_u16(), "Brevo rejected claim email");
        Err(DeliveryError::Rejected(format!("status={status}: {detail}")))
    }
}

/// Development mailer. The token only reaches the `claims::dev_mailer`
/// target at debug level.
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    config: MailerConfig,
}

impl LogMailer {
    /// Create a log mailer building links from `config`.
    pub fn new(config: MailerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClaimMailer for LogMailer {
    async fn send(&self, email: &ClaimEmail) -> Result<(), DeliveryError> {
        info!(token = %email.token, listing = %email.listing_name, "Claim email written to log");
        debug!(
            target: DEV_MAILER_TARGET,
            to = %email.to,
            link = %self.config.redeem_link(&email.token),
            "{}",
            email.subject
        );
        Ok(())
    }
}

/// Keeps every email it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<ClaimEmail>>,
}

impl RecordingMailer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<ClaimEmail> {
        self.sent.lock().clone()
    }

    /// Token of the most recent email.
    pub fn last_token(&self) -> Option<ClaimToken> {
        self.sent.lock().last().map(|e| e.token.clone())
    }
}

#[async_trait]
impl ClaimMailer for RecordingMailer {
    async fn send(&self, email: &ClaimEmail) -> Result<(), DeliveryError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

/// Rejects the next `remaining` sends, then delivers.
#[derive(Debug, Default)]
pub struct FailingMailer {
    remaining: Mutex<usize>,
    inner: RecordingMailer,
}

impl FailingMailer {
    /// Fail every send.
    pub fn always() -> Self {
        Self::times(usize::MAX)
    }

    /// Fail the next `count` sends.
    pub fn times(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            inner: RecordingMailer::new(),
        }
    }

    /// Emails that got through.
    pub fn delivered(&self) -> Vec<ClaimEmail> {
        self.inner.sent()
    }
}

#[async_trait]
impl ClaimMailer for FailingMailer {
    async fn send(&self, email: &ClaimEmail) -> Result<(), DeliveryError> {
        {
            let mut remaining = self.remaining.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DeliveryError::Rejected("mailbox unavailable".to_string()));
            }
        }
        self.inner.send(email).await
    }
}
