//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → router.rs (allow-list, prefix, HTTPS redirect, route lookup)
//!     → exchange.rs (resolve scheme/host/path once)
//!     → matcher.rs (anchored pattern match, named captures)
//!     → before hook → handler → Response
//!
//! Route Registration (at startup):
//!     Mux::handle(pattern, handler) in order
//!     → Compile anchored regex
//!     → Freeze as immutable Mux behind Arc
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)
//! - Forwarded headers are read with "last value" semantics

pub mod exchange;
pub mod matcher;
pub mod router;

pub use exchange::{Exchange, ResolvedUrl};
pub use router::{Handler, Mux};
