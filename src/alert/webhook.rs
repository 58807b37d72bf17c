//! Chat webhook channel.
//!
//! Posts `{"content": "<chat line>"}` (the Discord webhook shape).
//! Any 2xx answer counts as delivered; Discord itself answers 204.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::alert::{Alert, Notifier, NotifyError};
use crate::config::WebhookConfig;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Webhook alert channel.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::Build(e.to_string()))?;
        Ok(Self::with_client(client, config.url.clone()))
    }

    pub fn with_client(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: &alert.chat })
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
