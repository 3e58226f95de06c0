// Application Config
// Startup options read from the environment

use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;

use crate::logging::parse_level;
use crate::services::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SETTINGS_FILE, SETTINGS_BASE_PORT};

pub const ENV_CONFIG: &str = "CASTDECK_CONFIG";
pub const ENV_LOG_DIR: &str = "CASTDECK_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "CASTDECK_LOG_LEVEL";
pub const ENV_BUTT_PATH: &str = "CASTDECK_BUTT_PATH";
pub const ENV_POLL_INTERVAL: &str = "CASTDECK_POLL_INTERVAL_SECS";
pub const ENV_SETTINGS_PORT: &str = "CASTDECK_SETTINGS_PORT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub settings_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: LevelFilter,
    pub butt_path: Option<PathBuf>,
    pub poll_interval: Duration,
    pub settings_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            log_dir: PathBuf::from("logs"),
            log_level: LevelFilter::Info,
            butt_path: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            settings_port: SETTINGS_BASE_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unusable values keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key).and_then(|value| {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed)
                }
            })
        };

        let poll_interval = value(ENV_POLL_INTERVAL)
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(defaults.poll_interval);

        Self {
            settings_path: value(ENV_CONFIG).map(PathBuf::from).unwrap_or(defaults.settings_path),
            log_dir: value(ENV_LOG_DIR).map(PathBuf::from).unwrap_or(defaults.log_dir),
            log_level: value(ENV_LOG_LEVEL)
                .map(|level| parse_level(&level))
                .unwrap_or(defaults.log_level),
            butt_path: value(ENV_BUTT_PATH).map(PathBuf::from),
            poll_interval,
            settings_port: value(ENV_SETTINGS_PORT)
                .and_then(|port| port.parse().ok())
                .filter(|port: &u16| *port != 0)
                .unwrap_or(defaults.settings_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config_from(&[]), AppConfig::default());
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            (ENV_CONFIG, "/etc/castdeck/config.json"),
            (ENV_LOG_DIR, "/var/log/castdeck"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_BUTT_PATH, "/usr/local/bin/butt"),
            (ENV_POLL_INTERVAL, "10"),
            (ENV_SETTINGS_PORT, "9001"),
        ]);

        assert_eq!(config.settings_path, PathBuf::from("/etc/castdeck/config.json"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/castdeck"));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.butt_path, Some(PathBuf::from("/usr/local/bin/butt")));
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.settings_port, 9001);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = config_from(&[
            (ENV_POLL_INTERVAL, "soon"),
            (ENV_SETTINGS_PORT, "70000"),
            (ENV_BUTT_PATH, "   "),
        ]);

        assert_eq!(config.poll_interval, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));
        assert_eq!(config.settings_port, SETTINGS_BASE_PORT);
        assert_eq!(config.butt_path, None);
    }

    #[test]
    fn test_poll_interval_has_a_floor() {
        let config = config_from(&[(ENV_POLL_INTERVAL, "0")]);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }
}
