//! Route matching logic.
//!
//! # Responsibilities
//! - Compile route patterns anchored at both ends
//! - Extract named capture groups into request fields
//! - Check the `Host` header against the configured allow-list
//!
//! # Design Decisions
//! - Patterns match the full normalized path, never a substring
//! - Host matching is exact (the allow-list is an operator-supplied set)
//! - Empty allow-list = every host permitted

use std::collections::HashMap;

use regex::Regex;

/// A route pattern compiled as `^(?:pattern)$`.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern. The surrounding anchors are added here.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as registered, without anchors.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match `path` and collect named groups.
    ///
    /// Named groups that did not take part in the match map to an empty string.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;

        let fields = self
            .regex
            .capture_names()
            .enumerate()
            .filter_map(|(i, name)| {
                let name = name?;
                let value = caps.get(i).map(|m| m.as_str()).unwrap_or_default();
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        Some(fields)
    }
}

/// Hosts a request may be addressed to.
#[derive(Debug, Clone, Default)]
pub struct HostAllowList {
    hosts: Vec<String>,
}

impl HostAllowList {
    /// Create an allow-list. An empty list permits every host.
    pub fn new(hosts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if requests for `host` may be routed.
    pub fn permits(&self, host: &str) -> bool {
        self.hosts.is_empty() || self.hosts.iter().any(|h| h == host)
    }
}
