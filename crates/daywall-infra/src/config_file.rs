//! TOML-backed [`ConfigStore`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use daywall_core::config::{Config, ConfigStore};
use daywall_core::fs_util::atomic_write;
use daywall_core::ConfigError;

use crate::paths;

#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/config.toml`.
    pub fn default_location() -> Self {
        Self::new(paths::config_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file. Returns whether it existed.
    pub fn delete(&self) -> Result<bool, ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ConfigError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl ConfigStore for TomlConfigStore {
    /// A missing file yields defaults; a malformed one is an error.
    fn load(&self) -> Result<Config, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no config file; using defaults");
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let text =
            toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        atomic_write(&self.path, text.as_bytes()).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path().join("config.toml"));
        assert_eq!(store.load().unwrap(), Config::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path().join("sub/config.toml"));

        let mut cfg = Config::default();
        cfg.settings.enabled = true;
        cfg.settings.region = "ja-JP".into();
        cfg.settings.keep_history = 3;
        cfg.state.last_update_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        store.save(&cfg).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("[settings]"));
        assert!(text.contains("[state]"));
        assert_eq!(store.load().unwrap(), cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[settings]\nregion = \"fr-FR\"\n").unwrap();

        let cfg = TomlConfigStore::new(&path).load().unwrap();
        assert_eq!(cfg.settings.region, "fr-FR");
        assert_eq!(cfg.settings.keep_history, 7);
        assert!(!cfg.settings.enabled);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[settings\nregion = ").unwrap();

        let err = TomlConfigStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn delete_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path().join("config.toml"));
        assert!(!store.delete().unwrap());

        store.save(&Config::default()).unwrap();
        assert!(store.delete().unwrap());
        assert!(!store.path().exists());
    }
}
