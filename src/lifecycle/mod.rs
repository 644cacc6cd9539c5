//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     CLI → config file → env overlay → validate → init logging → bind → serve
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl+C or Shutdown::trigger → stop accepting → drain in-flight requests → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - No cross-request resources, so shutdown needs no cleanup beyond draining

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
