//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Probing engine settings (tick interval, timeouts, throttle).
    pub monitor: MonitorSettings,

    /// REST surface for registering and inspecting targets.
    pub api: ApiConfig,

    /// In-process store settings.
    pub store: StoreConfig,

    /// Outbound alert channels.
    pub alerts: AlertsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Settings consumed by the scheduler, prober, classifier and throttle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Seconds between the start of two probing passes.
    pub interval_secs: u64,

    /// Per-probe deadline in milliseconds.
    pub timeout_ms: u64,

    /// Slow threshold applied to targets registered without one.
    pub default_slow_ms: u64,

    /// Maximum number of probes in flight at once.
    pub max_concurrency: usize,

    /// Minimum seconds between repeat alerts for an unchanged non-OK state.
    pub throttle_window_secs: u64,

    /// Send a notification when a target recovers.
    pub alert_on_recovery: bool,

    /// User-Agent header sent with every probe.
    pub user_agent: String,
}

impl MonitorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_secs(self.throttle_window_secs)
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            timeout_ms: 5000,
            default_slow_ms: 2000,
            max_concurrency: 20,
            throttle_window_secs: 15 * 60,
            alert_on_recovery: false,
            user_agent: "APIPerformanceMonitor/1.0 (+https://github.com/monitor)".to_string(),
        }
    }
}

/// REST API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Serve the REST API.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Browser origins allowed by CORS (the dashboard).
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Observations kept per target before the oldest are evicted.
    pub retention_per_target: usize,

    /// JSON file holding registered targets across restarts.
    pub snapshot_path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention_per_target: 1000,
            snapshot_path: None,
        }
    }
}

/// Alert channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AlertsConfig {
    pub email: EmailConfig,
    pub webhook: WebhookConfig,
}

/// SMTP delivery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    /// Recipients of every alert.
    pub to: Vec<String>,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: 1025,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            to: Vec::new(),
            starttls: true,
            timeout_secs: 10,
        }
    }
}

/// Chat webhook settings (Discord-compatible `{"content": ...}` payload).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
