//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable holding the comma-separated host allow-list.
pub const ENV_ALLOW_HOSTS: &str = "HTTPBUN_ALLOW_HOSTS";
/// Environment variable that forces HTTPS redirects at the mount root when `1`.
pub const ENV_FORCE_HTTPS: &str = "HTTPBUN_FORCE_HTTPS";
/// Environment variable overriding the mount prefix.
pub const ENV_PATH_PREFIX: &str = "HTTPBUN_PATH_PREFIX";
/// Environment variable overriding the bind address.
pub const ENV_BIND: &str = "HTTPBUN_BIND";

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BunConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Mount prefix, host allow-list and HTTPS policy.
    pub routing: RoutingConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl BunConfig {
    /// Overlay values from the environment on top of this configuration.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(hosts) = lookup(ENV_ALLOW_HOSTS) {
            self.routing.allowed_hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(flag) = lookup(ENV_FORCE_HTTPS) {
            self.routing.force_https = flag.trim() == "1";
        }

        if let Some(prefix) = lookup(ENV_PATH_PREFIX) {
            self.routing.path_prefix = prefix;
        }

        if let Some(bind) = lookup(ENV_BIND) {
            self.listener.bind_address = bind;
        }

        self
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3090").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3090".to_string(),
        }
    }
}

/// Read-only routing policy shared by every request.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    /// Prefix every routed path must start with (e.g., "/bun"). Empty mounts at root.
    pub path_prefix: String,

    /// Accepted `Host` values. Empty allows every host.
    pub allowed_hosts: Vec<String>,

    /// Redirect plain-HTTP requests for the mount root to HTTPS.
    pub force_https: bool,
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Bytes of request body handlers may read; the rest is discarded.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overlay() {
        let config = BunConfig::default().apply_env(env(&[
            (ENV_ALLOW_HOSTS, "a.example.com, ,b.example.com"),
            (ENV_FORCE_HTTPS, "1"),
            (ENV_PATH_PREFIX, "/bun"),
        ]));

        assert_eq!(
            config.routing.allowed_hosts,
            vec!["a.example.com".to_string(), "b.example.com".to_string()]
        );
        assert!(config.routing.force_https);
        assert_eq!(config.routing.path_prefix, "/bun");
        assert_eq!(config.listener.bind_address, "0.0.0.0:3090");
    }

    #[test]
    fn test_force_https_requires_one() {
        let config = BunConfig::default().apply_env(env(&[(ENV_FORCE_HTTPS, "true")]));
        assert!(!config.routing.force_https);
    }

    #[test]
    fn test_missing_env_keeps_file_values() {
        let mut base = BunConfig::default();
        base.routing.allowed_hosts = vec!["kept.example.com".into()];
        let config = base.clone().apply_env(env(&[]));
        assert_eq!(config, base);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BunConfig = toml::from_str(
            r#"
            [routing]
            path_prefix = "/bun"
            "#,
        )
        .unwrap();

        assert_eq!(config.routing.path_prefix, "/bun");
        assert_eq!(config.limits.max_body_bytes, 10_000);
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
