//! Monitoring engine.
//!
//! # Data Flow
//! ```text
//! runner.rs (tick) → store: list targets (snapshot)
//!     → for each target, bounded by a semaphore:
//!         prober.rs (timed GET) → Observation
//!         classifier.rs → Verdict (OK / DOWN / SLOW)
//!         store: insert observation (best effort)
//!         throttle.rs → notify? recovery?
//!         message.rs → Alert → alert::AlertDispatcher
//!     → wait for every worker, then wait for the next tick
//! ```
//!
//! # Design Decisions
//! - The throttle map is the only state shared between workers
//! - DOWN and SLOW are throttled as independent keys
//! - Probe failures are observations, not errors

pub mod classifier;
pub mod message;
pub mod prober;
pub mod runner;
pub mod throttle;
pub mod types;

pub use classifier::classify;
pub use prober::{HttpProber, Probe};
pub use runner::Runner;
pub use throttle::{Throttle, ThrottleDecision};
pub use types::{AlertKind, HealthState, Observation, Target, TargetId, Verdict};
