use crate::error::{PypiError, Result};
use crate::pypi::{DEFAULT_PYPI_REGISTRY, DEFAULT_TIMEOUT_SECS};
use crate::repository::Strategy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Default location of the release cache, relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = "latest_releases.json";

/// Runtime settings, read from an optional TOML file and overridden by CLI flags
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub registry_url: String,
    pub strategy: Strategy,
    pub cache_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_PYPI_REGISTRY.to_string(),
            strategy: Strategy::default(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            PypiError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    pub fn with_strategy(mut self, strategy: Option<Strategy>) -> Self {
        if let Some(strategy) = strategy {
            self.strategy = strategy;
        }
        self
    }

    pub fn with_cache_path(mut self, cache_path: Option<PathBuf>) -> Self {
        if let Some(cache_path) = cache_path {
            self.cache_path = cache_path;
        }
        self
    }

    pub fn with_registry_url(mut self, registry_url: Option<String>) -> Self {
        if let Some(registry_url) = registry_url {
            self.registry_url = registry_url;
        }
        self
    }

    /// Registry URL with its scheme checked and trailing slash removed
    pub fn validated_registry_url(&self) -> Result<String> {
        let parsed = Url::parse(&self.registry_url).map_err(|_| {
            PypiError::Config(format!("Invalid registry URL: {}", self.registry_url))
        })?;

        match parsed.scheme() {
            "https" | "http" => {}
            scheme => {
                return Err(PypiError::Config(format!(
                    "Unsupported registry scheme: {scheme}"
                )));
            }
        }

        if parsed.host_str().is_none() {
            return Err(PypiError::Config(format!(
                "Registry URL has no host: {}",
                self.registry_url
            )));
        }

        Ok(self.registry_url.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_without_file_uses_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.cache_path, PathBuf::from("latest_releases.json"));
        assert_eq!(settings.strategy, Strategy::Api);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let settings = Settings::from_toml("strategy = \"scrape\"\ntimeout-secs = 5\n").unwrap();
        assert_eq!(settings.strategy, Strategy::Scrape);
        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.registry_url, "https://pypi.org");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pypi-releases.toml");
        fs::write(&path, "cache-path = \"state/releases.json\"\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.cache_path, PathBuf::from("state/releases.json"));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempdir().unwrap();
        let err = Settings::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
        assert!(matches!(err, PypiError::Config(_)));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = Settings::from_toml("strategy = \"carrier-pigeon\"\n").unwrap_err();
        assert!(matches!(err, PypiError::Toml(_)));
    }

    #[test]
    fn cli_overrides_win() {
        let settings = Settings::default()
            .with_strategy(Some(Strategy::Scrape))
            .with_cache_path(Some(PathBuf::from("other.json")))
            .with_registry_url(None);

        assert_eq!(settings.strategy, Strategy::Scrape);
        assert_eq!(settings.cache_path, PathBuf::from("other.json"));
        assert_eq!(settings.registry_url, "https://pypi.org");
    }

    #[test]
    fn validated_registry_url_trims_trailing_slash() {
        let settings = Settings::default().with_registry_url(Some("https://pypi.org/".into()));
        assert_eq!(settings.validated_registry_url().unwrap(), "https://pypi.org");
    }

    #[test]
    fn validated_registry_url_rejects_other_schemes() {
        let settings = Settings::default().with_registry_url(Some("ftp://example.com".into()));
        let err = settings.validated_registry_url().unwrap_err();
        assert!(matches!(err, PypiError::Config(_)));
    }
}
