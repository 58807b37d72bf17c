//! Timed HTTP probing.
//!
//! # Responsibilities
//! - Issue one GET per target per pass, with an identifying User-Agent
//! - Enforce the per-probe deadline over the request and the body drain
//! - Turn the outcome into an Observation (failures are data, not errors)
//!
//! # Design Decisions
//! - No retries: a failed attempt is the signal
//! - Latency is measured up to the response head, or up to the failure
//! - The body is drained and discarded so the connection can be reused

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::{timeout_at, Instant};

use crate::monitor::types::{Observation, Target};

/// Something that can check a target once.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: &Target) -> Observation;
}

/// Probe backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, target: &Target) -> Observation {
        let started = Instant::now();
        let deadline = started + self.timeout;

        let outcome = timeout_at(deadline, self.client.get(&target.url).send()).await;
        let latency_ms = elapsed_ms(started);

        let (status_code, error) = match outcome {
            Ok(Ok(mut response)) => {
                let status = response.status().as_u16();
                // Content is irrelevant; drain so the connection is released cleanly.
                let _ = timeout_at(deadline, async {
                    while let Ok(Some(_)) = response.chunk().await {}
                })
                .await;
                (Some(status), None)
            }
            Ok(Err(e)) => {
                tracing::debug!(url = %target.url, error = %e, "Probe request failed");
                (None, Some(e.to_string()))
            }
            Err(_) => {
                tracing::debug!(url = %target.url, timeout_ms = self.timeout.as_millis() as u64, "Probe timed out");
                (None, Some(format!("timeout after {}ms", self.timeout.as_millis())))
            }
        };

        Observation {
            target_id: target.id,
            ok: status_code == Some(target.expected_status),
            status_code,
            latency_ms: Some(latency_ms),
            error,
            observed_at: Utc::now(),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
