use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::predict::PassSearch;
use crate::tle::{SourceSettings, TleCache};
use crate::tracker::{GroundObserver, TrackerError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid observer: {0}")]
    Observer(#[from] TrackerError),
    #[error("invalid duration {0}")]
    Duration(String),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub tle: TleConfig,
    pub observer: ObserverConfig,
    pub passes: PassesConfig,
    pub reminders: RemindersConfig,
    pub crew: CrewConfig,
    pub users: Vec<UserKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TleConfig {
    pub url: String,
    pub cache_file: PathBuf,
    #[serde(deserialize_with = "deserialize_duration")]
    pub cache_expiration: Duration,
    pub retries: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub retry_delay: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub fallback_retry: Duration,
}

impl Default for TleConfig {
    fn default() -> Self {
        Self {
            url: "https://celestrak.org/NORAD/elements/stations.txt".to_string(),
            cache_file: PathBuf::from("tle_cache.txt"),
            cache_expiration: Duration::from_secs(24 * 60 * 60),
            retries: 3,
            retry_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            fallback_retry: Duration::from_secs(10 * 60),
        }
    }
}

impl TleConfig {
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            url: self.url.clone(),
            retries: self.retries,
            retry_delay: self.retry_delay,
            fallback_retry: self.fallback_retry,
        }
    }

    pub fn cache(&self) -> TleCache {
        TleCache::new(self.cache_file.clone(), self.cache_expiration)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            latitude: 40.7128,
            longitude: -74.0060,
            elevation_m: 10.0,
        }
    }
}

impl ObserverConfig {
    pub fn observer(&self) -> Result<GroundObserver, TrackerError> {
        GroundObserver::new(self.latitude, self.longitude, self.elevation_m)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PassesConfig {
    pub default_count: usize,
    pub max_count: usize,
    #[serde(deserialize_with = "deserialize_duration")]
    pub search_horizon: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub guard: Duration,
}

impl Default for PassesConfig {
    fn default() -> Self {
        Self {
            default_count: 3,
            max_count: 20,
            search_horizon: Duration::from_secs(7 * 24 * 60 * 60),
            guard: Duration::from_secs(60),
        }
    }
}

impl PassesConfig {
    pub fn search(&self) -> Result<PassSearch, ConfigError> {
        if self.search_horizon.is_zero() {
            return Err(ConfigError::ZeroDuration("passes.search_horizon"));
        }
        Ok(PassSearch {
            horizon: to_chrono(self.search_horizon)?,
            guard: to_chrono(self.guard)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemindersConfig {
    pub database: PathBuf,
    #[serde(deserialize_with = "deserialize_duration")]
    pub poll_interval: Duration,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("reminders.db"),
            poll_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrewConfig {
    pub url: String,
    pub craft: String,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            url: "http://api.open-notify.org/astros.json".to_string(),
            craft: "ISS".to_string(),
        }
    }
}

impl RemindersConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("reminders.poll_interval"));
        }
        Ok(())
    }
}

/// Maps a bearer key to the user id reminders are filed under.
#[derive(Debug, Clone, Deserialize)]
pub struct UserKey {
    pub key: String,
    pub user_id: String,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.observer.observer()?;
        config.passes.search()?;
        config.reminders.validate()?;
        Ok(config)
    }

    pub fn find_user(&self, key: &str) -> Option<&UserKey> {
        self.users.iter().find(|u| u.key == key)
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

fn to_chrono(duration: Duration) -> Result<chrono::Duration, ConfigError> {
    chrono::Duration::from_std(duration)
        .map_err(|_| ConfigError::Duration(humantime::format_duration(duration).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.tle.cache_expiration, Duration::from_secs(86_400));
        assert_eq!(config.tle.retries, 3);
        assert_eq!(config.reminders.poll_interval, Duration::from_secs(60));
        assert_eq!(config.passes.default_count, 3);
        assert!(config.users.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
web:
  bind: "127.0.0.1:9000"
tle:
  url: "http://localhost/stations.txt"
  cache_file: "/tmp/tle.txt"
  cache_expiration: "12h"
  retries: 5
  retry_delay: "250ms"
observer:
  latitude: 48.864716
  longitude: 2.349014
passes:
  default_count: 4
  search_horizon: "2days"
reminders:
  database: "/var/lib/orbit-watch/reminders.db"
  poll_interval: "30s"
users:
  - key: "secret"
    user_id: "alice"
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.web.bind, "127.0.0.1:9000");
        assert_eq!(config.tle.cache_expiration, Duration::from_secs(12 * 3600));
        assert_eq!(config.tle.retry_delay, Duration::from_millis(250));
        // Unset fields keep their defaults.
        assert_eq!(config.tle.request_timeout, Duration::from_secs(10));
        assert_eq!(config.observer.elevation_m, 10.0);
        assert_eq!(config.passes.search().unwrap().horizon, chrono::Duration::days(2));
        assert_eq!(config.find_user("secret").unwrap().user_id, "alice");
        assert!(config.find_user("other").is_none());
    }

    #[test]
    fn rejects_bad_observer_and_duration() {
        assert!(Config::from_str("observer:\n  latitude: 123.0\n  longitude: 0.0\n").is_err());
        assert!(Config::from_str("tle:\n  retry_delay: \"soon\"\n").is_err());
    }

    #[test]
    fn rejects_zero_intervals() {
        assert!(matches!(
            Config::from_str("reminders:\n  poll_interval: \"0s\"\n"),
            Err(ConfigError::ZeroDuration("reminders.poll_interval"))
        ));
        assert!(matches!(
            Config::from_str("passes:\n  search_horizon: \"0s\"\n"),
            Err(ConfigError::ZeroDuration("passes.search_horizon"))
        ));
        assert!(Config::from_str("reminders:\n  poll_interval: \"500ms\"\n").is_ok());
    }
}
