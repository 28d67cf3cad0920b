use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: String,
    /// Where store records are persisted. `None` keeps everything in memory.
    pub data_file: Option<PathBuf>,
    pub login_rate_limit_window: Duration,
    pub login_rate_limit_per_window: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_file: None,
            login_rate_limit_window: Duration::from_secs(300),
            login_rate_limit_per_window: 10,
        }
    }
}

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "MICROHUB_API_BIND_ADDR", DEFAULT_BIND_ADDR);
        let data_file = optional_trimmed(&lookup, "MICROHUB_API_DATA_FILE").map(PathBuf::from);

        let window_secs = value_or_default(&lookup, "LOGIN_RATE_LIMIT_WINDOW_SECS", "300")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "LOGIN_RATE_LIMIT_WINDOW_SECS must be an integer in [10, 3600]".to_string(),
                )
            })?;
        if !(10..=3_600).contains(&window_secs) {
            return Err(ConfigError::Invalid(
                "LOGIN_RATE_LIMIT_WINDOW_SECS must be in [10, 3600]".to_string(),
            ));
        }

        let login_rate_limit_per_window =
            value_or_default(&lookup, "LOGIN_RATE_LIMIT_PER_WINDOW", "10")
                .parse::<u32>()
                .map_err(|_| {
                    ConfigError::Invalid(
                        "LOGIN_RATE_LIMIT_PER_WINDOW must be an integer in [1, 1000]".to_string(),
                    )
                })?;
        if !(1..=1_000).contains(&login_rate_limit_per_window) {
            return Err(ConfigError::Invalid(
                "LOGIN_RATE_LIMIT_PER_WINDOW must be in [1, 1000]".to_string(),
            ));
        }

        Ok(Self {
            bind_addr,
            data_file,
            login_rate_limit_window: Duration::from_secs(window_secs),
            login_rate_limit_per_window,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        ApiConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn defaults_apply_without_environment() {
        assert_eq!(parse(&[]).unwrap(), ApiConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = parse(&[
            ("MICROHUB_API_BIND_ADDR", " 0.0.0.0:9000 "),
            ("MICROHUB_API_DATA_FILE", "/var/lib/microhub/stores.json"),
            ("LOGIN_RATE_LIMIT_WINDOW_SECS", "60"),
            ("LOGIN_RATE_LIMIT_PER_WINDOW", "3"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(
            config.data_file,
            Some(PathBuf::from("/var/lib/microhub/stores.json"))
        );
        assert_eq!(config.login_rate_limit_window, Duration::from_secs(60));
        assert_eq!(config.login_rate_limit_per_window, 3);
    }

    #[test]
    fn rejects_out_of_range_limits() {
        let err = parse(&[("LOGIN_RATE_LIMIT_WINDOW_SECS", "5")]).unwrap_err();
        assert!(err.to_string().contains("LOGIN_RATE_LIMIT_WINDOW_SECS"));

        let err = parse(&[("LOGIN_RATE_LIMIT_PER_WINDOW", "0")]).unwrap_err();
        assert!(err.to_string().contains("LOGIN_RATE_LIMIT_PER_WINDOW"));

        let err = parse(&[("LOGIN_RATE_LIMIT_PER_WINDOW", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
