//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → MonitorSettings cloned into the runner
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_config, ConfigError};
pub use schema::{
    AlertsConfig, ApiConfig, EmailConfig, MonitorConfig, MonitorSettings, ObservabilityConfig,
    StoreConfig, WebhookConfig,
};
