//! # Runtime Configuration Module
//!
//! Environment-variable configuration for router construction and matching.
//!
//! ## Environment Variables
//!
//! ### `MOUNTROUTER_DECODE_PERCENT`
//!
//! Percent-decode each path segment after splitting, for both request paths
//! and literal pattern segments. Because decoding happens per segment, an
//! encoded slash (`%2F`) stays inside its parameter value.
//!
//! Default: `true`
//!
//! ### `MOUNTROUTER_ALLOW_SHADOWED_ROUTES`
//!
//! When `false`, [`RouterBuilder::build`](crate::router::RouterBuilder::build)
//! rejects a route that can never be reached because an earlier route in the
//! same router accepts the same method on an identically shaped path. When
//! `true`, the conflict is logged and the first registration wins.
//!
//! Default: `false`
//!
//! ### `MOUNTROUTER_SLOW_MATCH_US`
//!
//! Dispatches slower than this many microseconds are logged at `warn`.
//!
//! Default: `1000`
//!
//! ## Usage
//!
//! ```rust
//! use mountrouter::runtime_config::RouterConfig;
//! use mountrouter::router::RouterBuilder;
//!
//! let config = RouterConfig::from_env();
//! let builder = RouterBuilder::with_config(config);
//! assert_eq!(builder.config().decode_percent, config.decode_percent);
//! ```

use std::env;
use std::time::Duration;

const DEFAULT_SLOW_MATCH_US: u64 = 1000;

/// Router behaviour switches, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Percent-decode path segments (default: true)
    pub decode_percent: bool,
    /// Log instead of rejecting shadowed duplicate routes (default: false)
    pub allow_shadowed_routes: bool,
    /// Warn when a single dispatch takes longer than this (default: 1ms)
    pub slow_match_threshold: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            decode_percent: true,
            allow_shadowed_routes: false,
            slow_match_threshold: Duration::from_micros(DEFAULT_SLOW_MATCH_US),
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            decode_percent: lookup("MOUNTROUTER_DECODE_PERCENT")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.decode_percent),
            allow_shadowed_routes: lookup("MOUNTROUTER_ALLOW_SHADOWED_ROUTES")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.allow_shadowed_routes),
            slow_match_threshold: lookup("MOUNTROUTER_SLOW_MATCH_US")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_micros)
                .unwrap_or(defaults.slow_match_threshold),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
