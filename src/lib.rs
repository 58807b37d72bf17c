//! HTTP endpoint monitoring library.

pub mod alert;
pub mod api;
pub mod config;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod store;

pub use config::MonitorConfig;
pub use lifecycle::Shutdown;
pub use monitor::Runner;
