//! Monitoring domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a registered target.
pub type TargetId = i64;

/// A monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub url: String,
    /// Status code that counts as a successful probe.
    pub expected_status: u16,
    /// Latency above which a correct response is reported as slow.
    #[serde(rename = "threshold_slow_ms", alias = "slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Result of one probe of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "url_id")]
    pub target_id: TargetId,
    /// Absent when the request never completed.
    pub status_code: Option<u16>,
    pub latency_ms: Option<u64>,
    /// True iff the response status matched the target's expectation.
    pub ok: bool,
    /// Transport or timeout failure message.
    pub error: Option<String>,
    #[serde(rename = "checked_at")]
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    /// Status code rendered for humans, `unknown` when absent.
    pub fn status_label(&self) -> String {
        self.status_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn latency_label(&self) -> u64 {
        self.latency_ms.unwrap_or_default()
    }
}

/// Semantic state of a target as seen by one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    Ok,
    Down,
    Slow,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Ok => "OK",
            HealthState::Down => "DOWN",
            HealthState::Slow => "SLOW",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert category, tracked independently by the throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    Down,
    Slow,
}

impl AlertKind {
    pub const ALL: [AlertKind; 2] = [AlertKind::Down, AlertKind::Slow];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Down => "DOWN",
            AlertKind::Slow => "SLOW",
        }
    }

    /// Icon prefixed to failure alerts of this kind.
    pub fn icon(&self) -> &'static str {
        match self {
            AlertKind::Down => "🔴",
            AlertKind::Slow => "🟡",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified outcome of an observation. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub state: HealthState,
    /// `None` for OK verdicts.
    pub kind: Option<AlertKind>,
    pub reason: String,
}

impl Verdict {
    pub fn ok() -> Self {
        Self {
            state: HealthState::Ok,
            kind: None,
            reason: String::new(),
        }
    }

    pub fn down(reason: impl Into<String>) -> Self {
        Self {
            state: HealthState::Down,
            kind: Some(AlertKind::Down),
            reason: reason.into(),
        }
    }

    pub fn slow() -> Self {
        Self {
            state: HealthState::Slow,
            kind: Some(AlertKind::Slow),
            reason: "slow response".to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state == HealthState::Ok
    }
}
