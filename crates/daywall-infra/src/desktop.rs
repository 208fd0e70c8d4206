//! GNOME background adapter.
//!
//! Each apply probes the session, builds a `gsettings` command plan for the keys the running
//! schema actually has, and executes it in order. The first failing command ends the run;
//! already-applied keys are not rolled back.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use daywall_core::ports::{Desktop, Notify, Urgency};
use daywall_core::ApplyError;

use crate::env_detect::{self, SessionKind};
use crate::notify::NotifierChain;
use crate::process_runner::{tool, CommandRunner, Invocation, SystemRunner};

pub const SCHEMA: &str = "org.gnome.desktop.background";
pub const KEY_PICTURE_OPTIONS: &str = "picture-options";
pub const KEY_PICTURE_URI: &str = "picture-uri";
pub const KEY_PICTURE_URI_DARK: &str = "picture-uri-dark";

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// What the running session supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub session: SessionKind,
    pub dual_theme_key: bool,
}

/// One `gsettings set` against [`SCHEMA`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigCommand {
    pub key: &'static str,
    pub value: String,
}

impl ConfigCommand {
    pub fn invocation(&self, gsettings: &OsString) -> Invocation {
        Invocation::new(gsettings, ["set", SCHEMA, self.key, self.value.as_str()])
    }
}

/// Commands for `uri`, in execution order.
pub fn plan(caps: Capabilities, uri: &str) -> Vec<ConfigCommand> {
    let mut commands = vec![
        ConfigCommand {
            key: KEY_PICTURE_OPTIONS,
            value: "zoom".to_string(),
        },
        ConfigCommand {
            key: KEY_PICTURE_URI,
            value: uri.to_string(),
        },
    ];
    if caps.dual_theme_key {
        commands.push(ConfigCommand {
            key: KEY_PICTURE_URI_DARK,
            value: uri.to_string(),
        });
    }
    commands
}

/// `file://` URI for an existing image.
pub fn file_uri(image: &Path) -> Result<String, ApplyError> {
    if !image.is_file() {
        return Err(ApplyError::ArtifactNotFound(image.to_path_buf()));
    }
    let abs = image
        .canonicalize()
        .map_err(|_| ApplyError::ArtifactNotFound(image.to_path_buf()))?;
    Url::from_file_path(&abs)
        .map(String::from)
        .map_err(|()| ApplyError::InvalidPath(abs))
}

pub struct GnomeDesktop<R = SystemRunner, N = NotifierChain> {
    runner: R,
    notifier: N,
    gsettings: OsString,
    session: Option<SessionKind>,
}

impl GnomeDesktop {
    /// Real processes, `DAYWALL_GSETTINGS_BIN` override, notifications via [`NotifierChain`].
    pub fn from_env() -> Self {
        Self::new(SystemRunner, NotifierChain::from_env())
    }
}

impl<R: CommandRunner, N: Notify> GnomeDesktop<R, N> {
    pub fn new(runner: R, notifier: N) -> Self {
        Self {
            runner,
            notifier,
            gsettings: tool("DAYWALL_GSETTINGS_BIN", "gsettings"),
            session: None,
        }
    }

    /// Pin the session type instead of reading `XDG_SESSION_TYPE`.
    pub fn with_session(mut self, session: SessionKind) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_gsettings(mut self, program: impl Into<OsString>) -> Self {
        self.gsettings = program.into();
        self
    }

    /// Probe the session. Never fails; a broken probe reports no dual-theme key.
    pub fn detect(&self) -> Capabilities {
        let session = self.session.unwrap_or_else(env_detect::detect_session);
        if session == SessionKind::X11 {
            return Capabilities {
                session,
                dual_theme_key: false,
            };
        }

        let probe = Invocation::new(&self.gsettings, ["list-keys", SCHEMA]);
        let dual_theme_key = match self.runner.run(&probe, COMMAND_TIMEOUT) {
            Ok(out) => out
                .stdout
                .lines()
                .any(|line| line.trim() == KEY_PICTURE_URI_DARK),
            Err(err) => {
                debug!(error = %err, "probe degraded; assuming no dark key");
                false
            }
        };
        Capabilities {
            session,
            dual_theme_key,
        }
    }

    fn execute(&self, image: &Path) -> Result<(), ApplyError> {
        let uri = file_uri(image)?;
        let caps = self.detect();
        let commands = plan(caps, &uri);
        debug!(?caps, commands = commands.len(), "applying background");

        for command in &commands {
            let cmd = command.invocation(&self.gsettings);
            self.runner.run(&cmd, COMMAND_TIMEOUT).map_err(|err| {
                warn!(key = command.key, error = %err, "gsettings failed");
                ApplyError::from(err)
            })?;
        }
        Ok(())
    }
}

impl<R: CommandRunner, N: Notify> Desktop for GnomeDesktop<R, N> {
    fn apply(&self, image: &Path) -> Result<(), ApplyError> {
        let result = self.execute(image);
        match &result {
            Ok(()) => {
                info!(path = %image.display(), "background applied");
                self.notifier.notify(
                    "Wallpaper Updated",
                    &display_name(image),
                    Urgency::Normal,
                );
            }
            Err(err) => {
                self.notifier
                    .notify("Wallpaper Error", &err.to_string(), Urgency::Critical);
            }
        }
        result
    }
}

fn display_name(image: &Path) -> String {
    image.file_name().map_or_else(
        || image.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
