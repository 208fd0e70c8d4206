//! Application directory paths.
//!
//! | Purpose | Default (Linux) | Override |
//! |---------|-----------------|----------|
//! | Config | `~/.config/daywall/` | `DAYWALL_CONFIG_DIR` |
//! | Data (logs) | `~/.local/share/daywall/` | `DAYWALL_DATA_DIR` |
//! | Wallpapers | `~/Pictures/wallpapers/` | `settings.wallpaper_dir` |
//! | systemd user units | `~/.config/systemd/user/` | `DAYWALL_SYSTEMD_USER_DIR` |

use std::path::{Path, PathBuf};

use daywall_core::config::Settings;

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[must_use]
pub fn config_dir() -> PathBuf {
    env_dir("DAYWALL_CONFIG_DIR").unwrap_or_else(|| {
        dirs::config_dir()
            .map(|d| d.join("daywall"))
            .unwrap_or_else(|| PathBuf::from("/tmp/daywall-config"))
    })
}

#[must_use]
pub fn data_dir() -> PathBuf {
    env_dir("DAYWALL_DATA_DIR").unwrap_or_else(|| {
        dirs::data_dir()
            .map(|d| d.join("daywall"))
            .unwrap_or_else(|| PathBuf::from("/tmp/daywall-data"))
    })
}

/// `config_dir()/config.toml`.
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

#[must_use]
pub fn systemd_user_dir() -> PathBuf {
    env_dir("DAYWALL_SYSTEMD_USER_DIR").unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| home().join(".config"))
            .join("systemd/user")
    })
}

#[must_use]
pub fn default_wallpaper_dir() -> PathBuf {
    home().join("Pictures").join("wallpapers")
}

/// Store directory for `settings`, expanding a leading `~`.
#[must_use]
pub fn wallpaper_dir(settings: &Settings) -> PathBuf {
    match &settings.wallpaper_dir {
        Some(dir) => expand_home(dir),
        None => default_wallpaper_dir(),
    }
}

pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn overrides_win() {
        let _g = ENV_LOCK.lock().unwrap();
        let old = std::env::var_os("DAYWALL_CONFIG_DIR");

        unsafe { std::env::set_var("DAYWALL_CONFIG_DIR", "/srv/daywall") };
        assert_eq!(config_file(), PathBuf::from("/srv/daywall/config.toml"));

        unsafe { std::env::set_var("DAYWALL_CONFIG_DIR", "") };
        assert!(config_dir().ends_with("daywall"));
        assert_ne!(config_dir(), PathBuf::from(""));

        unsafe {
            match old {
                Some(v) => std::env::set_var("DAYWALL_CONFIG_DIR", v),
                None => std::env::remove_var("DAYWALL_CONFIG_DIR"),
            }
        }
    }

    #[test]
    fn tilde_expands_to_home() {
        let settings = Settings {
            wallpaper_dir: Some(PathBuf::from("~/Pictures/bing")),
            ..Settings::default()
        };
        let dir = wallpaper_dir(&settings);
        assert!(dir.is_absolute());
        assert!(dir.ends_with("Pictures/bing"));

        assert_eq!(
            expand_home(Path::new("/var/wall")),
            PathBuf::from("/var/wall")
        );
    }

    #[test]
    fn default_store_is_pictures_wallpapers() {
        assert!(wallpaper_dir(&Settings::default()).ends_with("Pictures/wallpapers"));
    }
}
