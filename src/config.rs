//! Configuration types.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Runtime configuration for the onboarding service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP/WebSocket server binds to.
    pub bind: IpAddr,
    pub port: u16,
    /// Sessions untouched for this long are dropped by the pruning task.
    pub session_idle_timeout: Duration,
    /// How often the pruning task runs.
    pub prune_interval: Duration,
    /// Whether to run the terminal REPL alongside the server.
    pub cli_enabled: bool,
    /// Directory for daily-rolling log files. Logs go to stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            prune_interval: Duration::from_secs(60),
            cli_enabled: true,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Build configuration from `ONBOARDING_*` environment variables.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind = parse_or(&lookup, "ONBOARDING_BIND", defaults.bind);
        let port = parse_or(&lookup, "ONBOARDING_PORT", defaults.port);
        let idle_secs = parse_or(
            &lookup,
            "ONBOARDING_SESSION_IDLE_SECS",
            defaults.session_idle_timeout.as_secs(),
        );
        let prune_secs = parse_or(
            &lookup,
            "ONBOARDING_PRUNE_INTERVAL_SECS",
            defaults.prune_interval.as_secs(),
        );
        let cli_enabled = lookup("ONBOARDING_CLI")
            .map(|v| {
                parse_flag(&v).unwrap_or_else(|e| {
                    tracing::warn!("{e}, using default");
                    defaults.cli_enabled
                })
            })
            .unwrap_or(defaults.cli_enabled);
        let log_dir = lookup("ONBOARDING_LOG_DIR")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            bind,
            port,
            session_idle_timeout: Duration::from_secs(idle_secs),
            // A zero interval would make tokio::time::interval panic.
            prune_interval: Duration::from_secs(prune_secs.max(1)),
            cli_enabled,
            log_dir,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

fn parse_flag(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: "ONBOARDING_CLI".to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_env_uses_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(3600));
        assert!(config.cli_enabled);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn env_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("ONBOARDING_BIND", "127.0.0.1"),
            ("ONBOARDING_PORT", "9000"),
            ("ONBOARDING_SESSION_IDLE_SECS", "120"),
            ("ONBOARDING_CLI", "off"),
            ("ONBOARDING_LOG_DIR", "/tmp/onboarding"),
        ]));
        assert_eq!(config.bind, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.port, 9000);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(120));
        assert!(!config.cli_enabled);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/onboarding")));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("ONBOARDING_PORT", "not-a-port"),
            ("ONBOARDING_CLI", "maybe"),
            ("ONBOARDING_PRUNE_INTERVAL_SECS", "0"),
        ]));
        assert_eq!(config.port, 8080);
        assert!(config.cli_enabled);
        assert_eq!(config.prune_interval, Duration::from_secs(1));
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag(" no ").unwrap());
        assert!(parse_flag("2").is_err());
    }
}
