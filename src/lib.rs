//! Diagnostic HTTP server library.
//!
//! Every endpoint reflects part of the incoming request back to the caller
//! so HTTP clients and proxies can be tested against deterministic behavior.

pub mod auth;
pub mod bun;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::BunConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
