use crate::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENGINE_URL: &str = "http://localhost:2375";

/// Per-call timeouts, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineTimeouts {
    pub create_secs: u64,
    pub start_secs: u64,
    pub lifecycle_secs: u64,
    pub inspect_secs: u64,
}

impl Default for EngineTimeouts {
    fn default() -> Self {
        Self {
            create_secs: 30,
            start_secs: 10,
            lifecycle_secs: 30,
            inspect_secs: 10,
        }
    }
}

impl EngineTimeouts {
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn start(&self) -> Duration {
        Duration::from_secs(self.start_secs)
    }

    pub fn lifecycle(&self) -> Duration {
        Duration::from_secs(self.lifecycle_secs)
    }

    pub fn inspect(&self) -> Duration {
        Duration::from_secs(self.inspect_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub timeouts: EngineTimeouts,
}

fn default_url() -> String {
    DEFAULT_ENGINE_URL.to_owned()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE_URL)
    }
}

impl EngineConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            timeouts: EngineTimeouts::default(),
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: EngineTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let url = self.base_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(EngineError::Config(format!(
                "engine url must be http(s), got '{url}'"
            )));
        }
        let t = &self.timeouts;
        if [t.create_secs, t.start_secs, t.lifecycle_secs, t.inspect_secs].contains(&0) {
            return Err(EngineError::Config(
                "engine timeouts must be at least one second".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts_match_engine_contract() {
        let t = EngineTimeouts::default();
        assert_eq!(t.create(), Duration::from_secs(30));
        assert_eq!(t.start(), Duration::from_secs(10));
        assert_eq!(t.lifecycle(), Duration::from_secs(30));
        assert_eq!(t.inspect(), Duration::from_secs(10));
    }

    #[test]
    fn config_strips_trailing_slash() {
        let config = EngineConfig::new("http://docker.internal:2375/");
        assert_eq!(config.url, "http://docker.internal:2375");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"timeouts": {"inspect_secs": 3}}"#).unwrap();
        assert_eq!(config.url, DEFAULT_ENGINE_URL);
        assert_eq!(config.timeouts.inspect_secs, 3);
        assert_eq!(config.timeouts.create_secs, 30);
    }

    #[test]
    fn validate_rejects_non_http_urls() {
        assert!(EngineConfig::new("unix:///var/run/docker.sock")
            .validate()
            .is_err());
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let config = EngineConfig::default().with_timeouts(EngineTimeouts {
            start_secs: 0,
            ..EngineTimeouts::default()
        });
        assert!(config.validate().is_err());
    }
}
