//! Target and observation storage.
//!
//! # Data Flow
//! ```text
//! REST API ──upsert/update──▶ TargetStore ──list (snapshot per pass)──▶ Runner
//! Runner ──insert (best effort)──▶ ObservationStore ──recent/latest──▶ REST API
//! ```
//!
//! # Design Decisions
//! - The runner only sees the traits; any backend can sit behind them
//! - Targets are read as a snapshot at the start of each pass
//! - Observations are append-only; retention is the backend's concern

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitor::types::{Observation, Target, TargetId};

pub use memory::MemoryStore;

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("target {0} not found")]
    NotFound(TargetId),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Registration request for a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTarget {
    pub url: String,
    pub expected_status: u16,
    pub slow_threshold_ms: u64,
}

/// Partial update of a target's thresholds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub expected_status: Option<u16>,
    pub slow_threshold_ms: Option<u64>,
}

/// A target paired with its newest observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStatus {
    #[serde(rename = "url")]
    pub target: Target,
    #[serde(rename = "check")]
    pub observation: Observation,
}

#[async_trait]
pub trait TargetStore: Send + Sync {
    /// All targets, ordered by id.
    async fn list_targets(&self) -> Result<Vec<Target>, StoreError>;

    async fn get_target(&self, id: TargetId) -> Result<Target, StoreError>;

    /// Register a target, or refresh the expected status of an existing URL.
    async fn upsert_target(&self, new: NewTarget) -> Result<Target, StoreError>;

    async fn update_thresholds(&self, id: TargetId, update: ThresholdUpdate) -> Result<Target, StoreError>;
}

#[async_trait]
pub trait ObservationStore: Send + Sync {
    async fn insert_observation(&self, observation: Observation) -> Result<(), StoreError>;

    /// Newest first.
    async fn recent_observations(&self, target_id: TargetId, limit: usize) -> Result<Vec<Observation>, StoreError>;

    /// Newest observation of every probed target, ordered by target id.
    async fn latest_status(&self) -> Result<Vec<TargetStatus>, StoreError>;
}

/// Everything the runner and the API need from a backend.
pub trait Store: TargetStore + ObservationStore {}

impl<T: TargetStore + ObservationStore> Store for T {}

/// Reject targets the prober could never check.
pub fn validate_new_target(new: &NewTarget) -> Result<(), StoreError> {
    if !crate::config::validation::is_http_url(&new.url) {
        return Err(StoreError::InvalidTarget(format!(
            "url must be an absolute http(s) URL: {}",
            new.url
        )));
    }
    validate_status(new.expected_status)
}

fn validate_status(status: u16) -> Result<(), StoreError> {
    if !(100..=599).contains(&status) {
        return Err(StoreError::InvalidTarget(format!(
            "expected status {} is not an HTTP status code",
            status
        )));
    }
    Ok(())
}
