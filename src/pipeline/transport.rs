//! Email delivery.

use super::config::BriefConfig;
use crate::error::{Error, Result};
use serde_json::{Value, json};
use std::future::Future;

pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// A finished email: subject plus complete HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
}

/// Transport-level outcome of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status_code: u16,
    pub recipient: String,
}

/// Delivers finished emails. Implementations only move bytes and report
/// the transport status.
pub trait EmailTransport: Send + Sync {
    fn send(&self, message: &EmailMessage) -> impl Future<Output = Result<DeliveryReceipt>> + Send;
}

/// SendGrid v3 mail-send over `ureq`.
#[derive(Clone)]
pub struct SendGridTransport {
    api_key: String,
    from: String,
    to: String,
    endpoint: String,
}

impl SendGridTransport {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
            endpoint: SENDGRID_ENDPOINT.to_string(),
        }
    }

    /// Transport from configured key and addresses; all three are required.
    pub fn from_config(config: &BriefConfig) -> Result<Self> {
        let missing = |name: &str| Error::Config(format!("{} is required to send email", name));
        let api_key = config.sendgrid_api_key.clone().ok_or_else(|| missing("SENDGRID_API_KEY"))?;
        let from = config.from_email.clone().ok_or_else(|| missing("BRIEF_FROM_EMAIL"))?;
        let to = config.to_email.clone().ok_or_else(|| missing("BRIEF_TO_EMAIL"))?;
        Ok(Self::new(api_key, from, to))
    }

    /// Override the API endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn recipient(&self) -> &str {
        &self.to
    }

    pub fn request_body(&self, message: &EmailMessage) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        })
    }
}

impl EmailTransport for SendGridTransport {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        let body = self.request_body(message);
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        let recipient = self.to.clone();

        let status = tokio::task::spawn_blocking(move || {
            let response = ureq::post(&endpoint)
                .header("Authorization", &format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .send_json(&body);

            match response {
                Ok(resp) => Ok(resp.status().as_u16()),
                Err(ureq::Error::StatusCode(code)) => Err(Error::Transport(format!("SendGrid returned HTTP {}", code))),
                Err(e) => Err(Error::Transport(format!("Request error: {}", e))),
            }
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))??;

        if !(200..300).contains(&status) {
            return Err(Error::Transport(format!("SendGrid returned HTTP {}", status)));
        }

        tracing::info!(status_code = status, %recipient, "Email response");
        Ok(DeliveryReceipt {
            status_code: status,
            recipient,
        })
    }
}
