//! Batch Dispatcher - Partitions a recipient list into provider-sized
//! batches and tallies the outcome

use std::sync::Arc;

use async_trait::async_trait;
use givepath_common::config::SendGridConfig;
use givepath_common::{Error, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// Recipients per provider call; sized for typical bulk-email API limits
pub const BATCH_SIZE: usize = 50;

const SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";

/// One outbound message
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
}

/// Email provider boundary.
///
/// A call submits one batch; the batch either goes out as a whole or
/// fails as a whole.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_batch(&self, batch: &[OutboundEmail]) -> Result<()>;
}

/// SendGrid v3 mail-send client
pub struct SendGridClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SendGridClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: SENDGRID_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Point the client at a different endpoint (tests)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl EmailProvider for SendGridClient {
    async fn send_batch(&self, batch: &[OutboundEmail]) -> Result<()> {
        let first = batch
            .first()
            .ok_or_else(|| Error::Validation("empty batch".to_string()))?;

        // One personalization per recipient; subject/from/content are
        // identical across a batch by construction.
        let personalizations: Vec<_> = batch
            .iter()
            .map(|m| json!({ "to": [{ "email": m.to }] }))
            .collect();

        let body = json!({
            "personalizations": personalizations,
            "from": { "email": first.from },
            "subject": first.subject,
            "content": [{ "type": "text/html", "value": first.html }],
        });

        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("SendGrid request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "SendGrid returned {}: {}",
                status, detail
            )));
        }

        Ok(())
    }
}

/// No-network provider used when no SendGrid API key is configured.
///
/// Every batch "succeeds"; the log makes it unmistakable that nothing
/// real was delivered.
pub struct MockProvider;

#[async_trait]
impl EmailProvider for MockProvider {
    async fn send_batch(&self, batch: &[OutboundEmail]) -> Result<()> {
        warn!(
            recipients = batch.len(),
            "MOCK MAILER: no SendGrid API key configured, {} message(s) were NOT sent",
            batch.len()
        );
        Ok(())
    }
}

/// Outcome of one dispatcher invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sent_count: usize,
    pub failed_count: usize,
}

/// Batch Dispatcher
pub struct BatchDispatcher {
    provider: Arc<dyn EmailProvider>,
    from_email: String,
}

impl BatchDispatcher {
    pub fn new(provider: Arc<dyn EmailProvider>, from_email: String) -> Self {
        Self {
            provider,
            from_email,
        }
    }

    /// Build a dispatcher from configuration, falling back to the mock
    /// provider when no API key is present.
    pub fn from_config(config: &SendGridConfig) -> Self {
        let provider: Arc<dyn EmailProvider> = match &config.api_key {
            Some(key) => Arc::new(SendGridClient::new(key.clone())),
            None => {
                warn!("No SendGrid API key configured; outbound email runs in mock mode");
                Arc::new(MockProvider)
            }
        };
        Self::new(provider, config.from_email.clone())
    }

    /// Send one subject/content pair to every recipient, in batches of
    /// [`BATCH_SIZE`].
    ///
    /// A failed batch counts its recipients toward `failed_count` and the
    /// remaining batches still go out; there is no per-batch retry.
    /// `sent_count + failed_count` always equals `recipients.len()`.
    pub async fn send(
        &self,
        subject: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<DispatchReport> {
        if subject.trim().is_empty() {
            return Err(Error::Validation("Subject is required".to_string()));
        }
        if content.trim().is_empty() {
            return Err(Error::Validation("Content is required".to_string()));
        }
        if recipients.is_empty() {
            return Err(Error::Validation("No valid recipients found".to_string()));
        }

        let mut sent_count = 0;
        let mut failed_count = 0;

        for (index, chunk) in recipients.chunks(BATCH_SIZE).enumerate() {
            let batch: Vec<OutboundEmail> = chunk
                .iter()
                .map(|to| OutboundEmail {
                    to: to.clone(),
                    from: self.from_email.clone(),
                    subject: subject.to_string(),
                    html: content.to_string(),
                })
                .collect();

            match self.provider.send_batch(&batch).await {
                Ok(()) => {
                    debug!(batch = index + 1, size = chunk.len(), "Batch sent");
                    sent_count += chunk.len();
                }
                Err(e) => {
                    warn!(batch = index + 1, size = chunk.len(), "Batch failed: {}", e);
                    failed_count += chunk.len();
                }
            }
        }

        info!(
            sent = sent_count,
            failed = failed_count,
            "Dispatch complete"
        );

        Ok(DispatchReport {
            sent_count,
            failed_count,
        })
    }
}
