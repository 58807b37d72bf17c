//! Alert fan-out.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::alert::{Alert, EmailNotifier, Notifier, WebhookNotifier};
use crate::config::AlertsConfig;
use crate::observability::metrics;

/// Sends each alert to every configured channel.
///
/// Delivery failures are logged and counted, never returned.
#[derive(Clone, Default)]
pub struct AlertDispatcher {
    channels: Vec<Arc<dyn Notifier>>,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// Build the channels enabled in `config`.
    ///
    /// A channel that cannot be constructed is logged and left out.
    pub fn from_config(config: &AlertsConfig) -> Self {
        let mut channels: Vec<Arc<dyn Notifier>> = Vec::new();

        if config.email.enabled {
            match EmailNotifier::new(&config.email) {
                Ok(notifier) => channels.push(Arc::new(notifier)),
                Err(e) => tracing::error!(error = %e, "E-mail alerts disabled"),
            }
        }

        if config.webhook.enabled {
            match WebhookNotifier::new(&config.webhook) {
                Ok(notifier) => channels.push(Arc::new(notifier)),
                Err(e) => tracing::error!(error = %e, "Webhook alerts disabled"),
            }
        }

        tracing::info!(
            channels = ?channels.iter().map(|c| c.channel()).collect::<Vec<_>>(),
            "Alert channels configured"
        );

        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver `alert` on every channel concurrently.
    pub async fn dispatch(&self, alert: &Alert) {
        let sends = self.channels.iter().map(|channel| async move {
            (channel.channel(), channel.send(alert).await)
        });

        for (channel, result) in join_all(sends).await {
            match result {
                Ok(()) => {
                    tracing::info!(
                        channel,
                        url = %alert.target_url,
                        severity = alert.severity.as_str(),
                        "Alert sent"
                    );
                    metrics::record_alert(channel, alert.severity.as_str(), true);
                }
                Err(e) => {
                    tracing::warn!(
                        channel,
                        url = %alert.target_url,
                        severity = alert.severity.as_str(),
                        error = %e,
                        "Alert delivery failed"
                    );
                    metrics::record_alert(channel, alert.severity.as_str(), false);
                }
            }
        }
    }
}
