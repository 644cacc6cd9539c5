//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → tower-http TraceLayer (request spans)
//!     → x-request-id on every request and response
//! ```

pub mod logging;
