//! Typed settings and persisted update state.
//!
//! Values are passed into [`Updater`](crate::update::Updater) explicitly; nothing here reads a
//! process-wide file on its own. The on-disk TOML implementation lives in `daywall-infra`.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_REGION: &str = "en-US";
pub const DEFAULT_KEEP_HISTORY: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub state: UpdateState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether the unattended daily update should run.
    pub enabled: bool,
    /// Feed market, e.g. `en-US`.
    pub region: String,
    /// Maximum number of artifacts kept in the store.
    pub keep_history: usize,
    /// Storage directory; the platform default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallpaper_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: false,
            region: DEFAULT_REGION.to_string(),
            keep_history: DEFAULT_KEEP_HISTORY,
            wallpaper_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateState {
    /// Day of the last successful daily update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_date: Option<NaiveDate>,
}

/// Configuration persistence port.
pub trait ConfigStore {
    /// Load configuration, falling back to defaults for anything missing.
    fn load(&self) -> Result<Config, ConfigError>;

    fn save(&self, config: &Config) -> Result<(), ConfigError>;
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: RefCell<Config>,
    saves: Cell<usize>,
}

impl MemoryConfigStore {
    pub fn new(config: Config) -> Self {
        Self {
            config: RefCell::new(config),
            saves: Cell::new(0),
        }
    }

    pub fn snapshot(&self) -> Config {
        self.config.borrow().clone()
    }

    /// Number of successful [`ConfigStore::save`] calls.
    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.snapshot())
    }

    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        *self.config.borrow_mut() = config.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
