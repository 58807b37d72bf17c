//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → runner loop exits → API stops accepting → snapshot saved → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel reaches every long-running task
//! - In-flight probes are not awaited; each ends on its own deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
