//! Server Configuration
//!
//! Settings are read from the environment (after `.env` is loaded). Values
//! that fail to parse fall back to their defaults with a warning.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::analysis::OrchestratorConfig;

pub const ENV_BIND_ADDR: &str = "NUMBER_ANALYZER_ADDR";
pub const ENV_JOIN_TIMEOUT_MS: &str = "NUMBER_ANALYZER_JOIN_TIMEOUT_MS";
pub const ENV_MAX_CONCURRENT_CHECKS: &str = "NUMBER_ANALYZER_MAX_CONCURRENT_CHECKS";
pub const ENV_OTLP: &str = "NUMBER_ANALYZER_OTLP";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,
    pub orchestrator: OrchestratorConfig,
    /// Export spans over OTLP in addition to console logging
    pub otlp_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            orchestrator: OrchestratorConfig::default(),
            otlp_enabled: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = lookup(ENV_BIND_ADDR)
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty())
            .unwrap_or(defaults.bind_addr);

        let join_timeout = parse_or(&lookup, ENV_JOIN_TIMEOUT_MS, defaults.orchestrator.join_timeout.as_millis() as u64);
        let max_concurrent_checks = parse_or(&lookup, ENV_MAX_CONCURRENT_CHECKS, defaults.orchestrator.max_concurrent_checks);

        let otlp_enabled = lookup(ENV_OTLP)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.otlp_enabled);

        Self {
            bind_addr,
            orchestrator: OrchestratorConfig {
                join_timeout: Duration::from_millis(join_timeout.max(1)),
                max_concurrent_checks: max_concurrent_checks.max(1),
            },
            otlp_enabled,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}; using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config_from(&[]), ServerConfig::default());
    }

    #[test]
    fn test_reads_overrides() {
        let config = config_from(&[
            (ENV_BIND_ADDR, "127.0.0.1:9090"),
            (ENV_JOIN_TIMEOUT_MS, "750"),
            (ENV_MAX_CONCURRENT_CHECKS, "8"),
            (ENV_OTLP, "true"),
        ]);

        assert_eq!(config.bind_addr, "127.0.0.1:9090");
        assert_eq!(config.orchestrator.join_timeout, Duration::from_millis(750));
        assert_eq!(config.orchestrator.max_concurrent_checks, 8);
        assert!(config.otlp_enabled);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            (ENV_JOIN_TIMEOUT_MS, "soon"),
            (ENV_MAX_CONCURRENT_CHECKS, "0"),
            (ENV_BIND_ADDR, "  "),
        ]);

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.orchestrator.join_timeout, OrchestratorConfig::default().join_timeout);
        assert_eq!(config.orchestrator.max_concurrent_checks, 1);
        assert!(!config.otlp_enabled);
    }
}
