//! systemd user timer that runs `daywall update` once a day.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use daywall_core::fs_util::atomic_write;

use crate::paths;
use crate::process_runner::{tool, CommandRunner, Invocation, Output, RunError, SystemRunner};

pub const SERVICE_UNIT: &str = "daywall-daily.service";
pub const TIMER_UNIT: &str = "daywall-daily.timer";

const SYSTEMCTL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStatus {
    pub installed: bool,
    pub enabled: bool,
    pub active: bool,
}

pub struct TimerUnits<R = SystemRunner> {
    unit_dir: PathBuf,
    systemctl: OsString,
    runner: R,
}

impl TimerUnits {
    /// `~/.config/systemd/user`, real `systemctl` (or `DAYWALL_SYSTEMCTL_BIN`).
    pub fn from_env() -> Self {
        Self::new(paths::systemd_user_dir(), SystemRunner)
    }
}

impl<R: CommandRunner> TimerUnits<R> {
    pub fn new(unit_dir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            unit_dir: unit_dir.into(),
            systemctl: tool("DAYWALL_SYSTEMCTL_BIN", "systemctl"),
            runner,
        }
    }

    pub fn service_path(&self) -> PathBuf {
        self.unit_dir.join(SERVICE_UNIT)
    }

    pub fn timer_path(&self) -> PathBuf {
        self.unit_dir.join(TIMER_UNIT)
    }

    fn systemctl(&self, args: &[&str]) -> Result<Output, RunError> {
        let cmd = Invocation::new(
            &self.systemctl,
            std::iter::once("--user").chain(args.iter().copied()),
        );
        self.runner.run(&cmd, SYSTEMCTL_TIMEOUT)
    }

    /// Write both unit files for `exe` and reload the user manager.
    pub fn install(&self, exe: &Path) -> anyhow::Result<()> {
        let service = service_unit(exe, session_bus_address().as_deref());
        atomic_write(&self.service_path(), service.as_bytes())
            .with_context(|| format!("write {}", self.service_path().display()))?;
        atomic_write(&self.timer_path(), timer_unit().as_bytes())
            .with_context(|| format!("write {}", self.timer_path().display()))?;

        self.systemctl(&["daemon-reload"])
            .context("systemctl daemon-reload")?;
        info!(dir = %self.unit_dir.display(), "timer units installed");
        Ok(())
    }

    pub fn enable(&self, exe: &Path) -> anyhow::Result<()> {
        self.install(exe)?;
        self.systemctl(&["enable", "--now", TIMER_UNIT])
            .context("enable timer")?;
        info!("daily timer enabled");
        Ok(())
    }

    pub fn disable(&self) -> anyhow::Result<()> {
        if !self.timer_path().exists() {
            return Ok(());
        }
        self.systemctl(&["disable", "--now", TIMER_UNIT])
            .context("disable timer")?;
        info!("daily timer disabled");
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.systemctl(&["is-enabled", TIMER_UNIT]).is_ok()
    }

    pub fn is_active(&self) -> bool {
        self.systemctl(&["is-active", TIMER_UNIT]).is_ok()
    }

    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            installed: self.timer_path().exists(),
            enabled: self.is_enabled(),
            active: self.is_active(),
        }
    }

    /// Disable the timer and delete both unit files. Returns whether anything was removed.
    pub fn uninstall(&self) -> anyhow::Result<bool> {
        if let Err(err) = self.disable() {
            warn!(error = %format!("{err:#}"), "disable before uninstall failed");
        }

        let mut removed = false;
        for path in [self.timer_path(), self.service_path()] {
            match fs::remove_file(&path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("remove {}", path.display()));
                }
            }
        }
        if removed {
            self.systemctl(&["daemon-reload"])
                .context("systemctl daemon-reload")?;
        }
        Ok(removed)
    }
}

fn session_bus_address() -> Option<String> {
    let from_env = std::env::var("DBUS_SESSION_BUS_ADDRESS")
        .ok()
        .filter(|a| !a.is_empty());
    if from_env.is_some() {
        return from_env;
    }
    std::env::var("XDG_RUNTIME_DIR")
        .ok()
        .filter(|d| !d.is_empty())
        .map(|d| format!("unix:path={d}/bus"))
}

/// Quote one word for an `Exec*=` or `Environment=` line.
fn quote(word: &str) -> String {
    let escaped = word
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('%', "%%");
    format!("\"{escaped}\"")
}

pub fn service_unit(exe: &Path, bus_address: Option<&str>) -> String {
    let mut unit = String::from(
        "[Unit]\n\
         Description=Apply the daily wallpaper\n\
         After=network-online.target graphical-session.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         Type=oneshot\n",
    );
    unit.push_str(&format!(
        "ExecStart={} update\n",
        quote(&exe.to_string_lossy())
    ));
    if let Some(addr) = bus_address {
        unit.push_str(&format!(
            "Environment={}\n",
            quote(&format!("DBUS_SESSION_BUS_ADDRESS={addr}"))
        ));
    }
    unit.push_str("\n[Install]\nWantedBy=default.target\n");
    unit
}

pub fn timer_unit() -> String {
    format!(
        "[Unit]\n\
         Description=Run {SERVICE_UNIT} once a day\n\
         \n\
         [Timer]\n\
         OnCalendar=daily\n\
         OnBootSec=2min\n\
         Persistent=true\n\
         Unit={SERVICE_UNIT}\n\
         \n\
         [Install]\n\
         WantedBy=timers.target\n"
    )
}
