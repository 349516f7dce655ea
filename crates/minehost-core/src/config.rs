use crate::CoreError;
use minehost_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Process-wide settings, built once at startup.
///
/// ```toml
/// store_dir = "/var/lib/minehost"
///
/// [engine]
/// url = "http://localhost:2375"
///
/// [engine.timeouts]
/// create_secs = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    /// Data directory for the record store. `None` means no store is
    /// configured; the server then answers every store-backed route with 500.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl HostConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("reading {}: {e}", path.display())))?;
        let config: HostConfig = toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("parsing {}: {e}", path.display())))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CoreError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn to_toml(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))
    }

    #[must_use]
    pub fn with_store_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.store_dir = dir;
        }
        self
    }

    #[must_use]
    pub fn with_engine_url(mut self, url: Option<&str>) -> Self {
        if let Some(url) = url {
            self.engine = EngineConfig::new(url).with_timeouts(self.engine.timeouts);
        }
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.engine
            .validate()
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minehost_engine::DEFAULT_ENGINE_URL;

    #[test]
    fn defaults() {
        let c = HostConfig::default();
        assert!(c.store_dir.is_none());
        assert_eq!(c.engine.base_url(), DEFAULT_ENGINE_URL);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minehost.toml");
        fs::write(
            &path,
            "store_dir = \"/srv/mh\"\n\n[engine]\nurl = \"http://docker:2375/\"\n\n[engine.timeouts]\nstart_secs = 5\n",
        )
        .unwrap();

        let c = HostConfig::load(&path).unwrap();
        assert_eq!(c.store_dir, Some(PathBuf::from("/srv/mh")));
        assert_eq!(c.engine.base_url(), "http://docker:2375");
        assert_eq!(c.engine.timeouts.start_secs, 5);
        assert_eq!(c.engine.timeouts.create_secs, 30);
    }

    #[test]
    fn toml_round_trip_without_store() {
        let c = HostConfig::default();
        let text = c.to_toml().unwrap();
        assert!(!text.contains("store_dir"));
        let back: HostConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let c = HostConfig::default()
            .with_store_dir(Some(PathBuf::from("/data")))
            .with_engine_url(Some("http://10.0.0.5:2375"))
            .with_store_dir(None)
            .with_engine_url(None);
        assert_eq!(c.store_dir, Some(PathBuf::from("/data")));
        assert_eq!(c.engine.base_url(), "http://10.0.0.5:2375");
    }

    #[test]
    fn missing_and_malformed_files_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            HostConfig::load(&dir.path().join("absent.toml")),
            Err(CoreError::Config(_))
        ));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "store_dir = [").unwrap();
        assert!(matches!(HostConfig::load(&bad), Err(CoreError::Config(_))));
    }

    #[test]
    fn bad_engine_url_fails_validation() {
        let c = HostConfig::default().with_engine_url(Some("tcp://localhost:2375"));
        assert!(matches!(c.validate(), Err(CoreError::Config(_))));
    }
}
