//! Process configuration: store location, dashboard URL, sweep interval and the
//! profile to open on start.
//!
//! Values come from an optional TOML file and the environment (after
//! `dotenvy` has loaded `.env`). Environment variables win over the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Dashboard URL used in notifications when none is configured.
pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:8080";
/// Seconds between background promotion sweeps.
pub const DEFAULT_PROMOTION_INTERVAL_SECS: u64 = 5;
/// Profile opened on start when none is configured.
pub const DEFAULT_PROFILE: &str = "default";
/// Config file read when `IMPULSE_PAUSE_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Optional keys of the TOML config file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    /// `SeaORM` connection URL
    pub database_url: Option<String>,
    /// Externally reachable dashboard URL
    pub dashboard_url: Option<String>,
    /// Background sweep interval in seconds
    pub promotion_interval_secs: Option<u64>,
    /// Profile to open on start
    pub default_profile: Option<String>,
}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `SeaORM` connection URL; `None` keeps everything in memory
    pub database_url: Option<String>,
    /// Dashboard URL without trailing slash
    pub dashboard_url: String,
    /// Background sweep interval in seconds, never zero
    pub promotion_interval_secs: u64,
    /// Profile to open on start
    pub default_profile: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            promotion_interval_secs: DEFAULT_PROMOTION_INTERVAL_SECS,
            default_profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the config file (if present) and the process
    /// environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var("IMPULSE_PAUSE_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file = if Path::new(&path).exists() {
            tracing::debug!("Loading configuration from {path}");
            load_file(&path)?
        } else {
            FileConfig::default()
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merges a parsed file with an environment lookup.
    pub fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_blank = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let database_url = non_blank("DATABASE_URL")
            .or(file.database_url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let dashboard_url = non_blank("DASHBOARD_URL")
            .or(file.dashboard_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_DASHBOARD_URL.to_string());

        let interval = match non_blank("PROMOTION_INTERVAL_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| Error::Config {
                message: format!("Invalid PROMOTION_INTERVAL_SECS {raw:?}: {e}"),
            })?),
            None => file.promotion_interval_secs,
        };
        let promotion_interval_secs = interval
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_PROMOTION_INTERVAL_SECS);

        let default_profile = non_blank("DEFAULT_PROFILE")
            .or(file.default_profile)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        Ok(Self {
            database_url,
            dashboard_url,
            promotion_interval_secs,
            default_profile,
        })
    }

    /// The sweep interval as a [`Duration`].
    #[must_use]
    pub const fn promotion_interval(&self) -> Duration {
        Duration::from_secs(self.promotion_interval_secs)
    }
}

/// Parses a TOML config file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = AppConfig::from_sources(FileConfig::default(), env(&[]))?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.promotion_interval(), Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn test_environment_overrides_file() -> Result<()> {
        let file: FileConfig = toml::from_str(
            r#"
            database_url = "sqlite://data/file.sqlite"
            dashboard_url = "https://pause.example.com"
            promotion_interval_secs = 30
            default_profile = "alex"
            "#,
        )
        .unwrap();
        let config = AppConfig::from_sources(
            file,
            env(&[
                ("DASHBOARD_URL", " https://wishes.example.org/ "),
                ("DEFAULT_PROFILE", "  "),
            ]),
        )?;

        assert_eq!(config.database_url.as_deref(), Some("sqlite://data/file.sqlite"));
        assert_eq!(config.dashboard_url, "https://wishes.example.org");
        assert_eq!(config.promotion_interval_secs, 30);
        assert_eq!(config.default_profile, "alex");
        Ok(())
    }

    #[test]
    fn test_zero_interval_falls_back_to_default() -> Result<()> {
        let config = AppConfig::from_sources(
            FileConfig::default(),
            env(&[("PROMOTION_INTERVAL_SECS", "0")]),
        )?;
        assert_eq!(config.promotion_interval_secs, DEFAULT_PROMOTION_INTERVAL_SECS);
        Ok(())
    }

    #[test]
    fn test_invalid_interval_is_a_config_error() {
        let err = AppConfig::from_sources(
            FileConfig::default(),
            env(&[("PROMOTION_INTERVAL_SECS", "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_load_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "dashboard_url = \"http://pause.lan:8080/\"\n")?;
        let file = load_file(&path)?;
        assert_eq!(file.dashboard_url.as_deref(), Some("http://pause.lan:8080/"));

        std::fs::write(&path, "promotion_interval_secs = \"fast\"\n")?;
        assert!(matches!(load_file(&path), Err(Error::Config { .. })));
        assert!(matches!(
            load_file(dir.path().join("missing.toml")),
            Err(Error::Config { .. })
        ));
        Ok(())
    }
}
