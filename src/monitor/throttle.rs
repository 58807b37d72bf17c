//! Alert throttle state machine.
//!
//! # States (per `(target URL, kind)` key)
//! ```text
//! no entry ──any──▶ state S            notify (recovery = false)
//! S ──S' != S──▶ S'                    notify (recovery = S != OK && S' == OK)
//! S ──S (S != OK), window elapsed──▶ S notify (reminder)
//! S ──S (S != OK), within window──▶ S  silent
//! OK ──OK──▶ OK                        silent
//! ```
//!
//! # Design Decisions
//! - DOWN and SLOW are separate keys so each can transition on its own
//! - One mutex guards the whole map; it is held only for the decision
//! - Entries live for the process lifetime, nothing is persisted
//! - Bookkeeping happens on decide, whatever the transport outcome

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::monitor::types::{AlertKind, HealthState};

/// Outcome of a throttle decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThrottleDecision {
    /// An alert should be sent now.
    pub notify: bool,
    /// The key moved from a non-OK state back to OK.
    pub recovery: bool,
}

impl ThrottleDecision {
    const SILENT: Self = Self {
        notify: false,
        recovery: false,
    };
}

#[derive(Debug, Clone, Copy)]
struct ThrottleEntry {
    last_state: HealthState,
    last_notified_at: Instant,
}

/// Deduplicating alert throttle shared by all probe workers.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    entries: Mutex<HashMap<(String, AlertKind), ThrottleEntry>>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record `state` for `(url, kind)` and decide whether to alert.
    pub fn decide(&self, url: &str, kind: AlertKind, state: HealthState) -> ThrottleDecision {
        let now = Instant::now();
        let key = (url.to_string(), kind);

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get_mut(&key) {
            Some(entry) if entry.last_state == state => {
                if state != HealthState::Ok && now.duration_since(entry.last_notified_at) >= self.window {
                    entry.last_notified_at = now;
                    ThrottleDecision {
                        notify: true,
                        recovery: false,
                    }
                } else {
                    ThrottleDecision::SILENT
                }
            }
            Some(entry) => {
                let recovery = entry.last_state != HealthState::Ok && state == HealthState::Ok;
                *entry = ThrottleEntry {
                    last_state: state,
                    last_notified_at: now,
                };
                ThrottleDecision {
                    notify: true,
                    recovery,
                }
            }
            None => {
                entries.insert(
                    key,
                    ThrottleEntry {
                        last_state: state,
                        last_notified_at: now,
                    },
                );
                ThrottleDecision {
                    notify: true,
                    recovery: false,
                }
            }
        }
    }

    /// Last recorded state for a key, if any.
    pub fn last_state(&self, url: &str, kind: AlertKind) -> Option<HealthState> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(url.to_string(), kind))
            .map(|entry| entry.last_state)
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
