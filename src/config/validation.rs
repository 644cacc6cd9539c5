//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body cap > 0)
//! - Check the mount prefix shape and bind address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BunConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::BunConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("path_prefix {0:?} must be empty or start with '/'")]
    PrefixNotAbsolute(String),

    #[error("path_prefix {0:?} must not end with '/'")]
    PrefixTrailingSlash(String),

    #[error("bind_address {0:?} is not a socket address")]
    BadBindAddress(String),

    #[error("allowed_hosts contains a blank entry")]
    BlankAllowedHost,

    #[error("max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &BunConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = &config.routing.path_prefix;
    if !prefix.is_empty() {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::PrefixNotAbsolute(prefix.clone()));
        }
        if prefix.ends_with('/') {
            errors.push(ValidationError::PrefixTrailingSlash(prefix.clone()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config
        .routing
        .allowed_hosts
        .iter()
        .any(|h| h.trim().is_empty())
    {
        errors.push(ValidationError::BlankAllowedHost);
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
