//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → schema.rs (environment overlay: HTTPBUN_ALLOW_HOSTS, HTTPBUN_FORCE_HTTPS, ...)
//!     → validation.rs (semantic checks)
//!     → BunConfig (validated, immutable)
//!     → handed to the router constructor at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start, never per request
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::BunConfig;
pub use schema::LimitsConfig;
pub use schema::ListenerConfig;
pub use schema::RoutingConfig;
