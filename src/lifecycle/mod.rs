//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger config reload
//! ```
//!
//! # Design Decisions
//! - Startup order lives in `main`: config, logging, metrics, listener, server
//! - Shutdown has a timeout: forced exit after the drain deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
