//! Observation classification.
//!
//! Priority: transport failure, then wrong status, then slow, then OK.
//! The slow threshold is strictly greater-than.

use crate::monitor::types::{Observation, Target, Verdict};

/// Classify an observation against its target's thresholds.
pub fn classify(observation: &Observation, target: &Target) -> Verdict {
    if observation.error.is_some() {
        return Verdict::down("timeout/error");
    }

    if !observation.ok {
        return Verdict::down(format!("unexpected status {}", observation.status_label()));
    }

    match observation.latency_ms {
        Some(latency) if latency > target.slow_threshold_ms => Verdict::slow(),
        _ => Verdict::ok(),
    }
}
