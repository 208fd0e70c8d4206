//! Desktop notifications with an ordered fallback.
//!
//! `notify-send` first, then a raw `gdbus` call to the notification daemon. Delivery is
//! best-effort: a chain that fails everywhere logs and returns `false`.

use std::ffi::OsString;
use std::time::Duration;

use tracing::{debug, warn};

use daywall_core::ports::{Notify, Urgency};

use crate::process_runner::{tool, CommandRunner, Invocation, SystemRunner};

pub const APP_NAME: &str = "daywall";

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);
const EXPIRE_MS: &str = "5000";

/// One notification mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notifier {
    /// `notify-send` from libnotify.
    NotifySend { program: OsString },
    /// `org.freedesktop.Notifications.Notify` over the session bus via `gdbus`.
    Gdbus { program: OsString },
}

impl Notifier {
    pub fn invocation(&self, title: &str, message: &str, urgency: Urgency) -> Invocation {
        match self {
            Self::NotifySend { program } => Invocation::new(
                program,
                [
                    "-a".to_string(),
                    APP_NAME.to_string(),
                    "-u".to_string(),
                    urgency.to_string(),
                    "-i".to_string(),
                    icon(urgency).to_string(),
                    title.to_string(),
                    message.to_string(),
                ],
            ),
            Self::Gdbus { program } => Invocation::new(
                program,
                [
                    "call".to_string(),
                    "--session".to_string(),
                    "--dest".to_string(),
                    "org.freedesktop.Notifications".to_string(),
                    "--object-path".to_string(),
                    "/org/freedesktop/Notifications".to_string(),
                    "--method".to_string(),
                    "org.freedesktop.Notifications.Notify".to_string(),
                    gvariant_string(APP_NAME),
                    "0".to_string(),
                    gvariant_string(icon(urgency)),
                    gvariant_string(title),
                    gvariant_string(message),
                    "[]".to_string(),
                    format!("{{'urgency': <byte {}>}}", urgency_byte(urgency)),
                    EXPIRE_MS.to_string(),
                ],
            ),
        }
    }

    pub fn try_notify<R: CommandRunner>(
        &self,
        runner: &R,
        title: &str,
        message: &str,
        urgency: Urgency,
    ) -> bool {
        let cmd = self.invocation(title, message, urgency);
        match runner.run(&cmd, NOTIFY_TIMEOUT) {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "notifier failed");
                false
            }
        }
    }
}

fn icon(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "dialog-error",
        Urgency::Low | Urgency::Normal => "dialog-information",
    }
}

fn urgency_byte(urgency: Urgency) -> u8 {
    match urgency {
        Urgency::Low => 0,
        Urgency::Normal => 1,
        Urgency::Critical => 2,
    }
}

/// Quote `s` as a GVariant text-format string literal.
fn gvariant_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Tries each [`Notifier`] in order and stops at the first that delivers.
#[derive(Debug, Clone)]
pub struct NotifierChain<R = SystemRunner> {
    runner: R,
    notifiers: Vec<Notifier>,
}

impl NotifierChain<SystemRunner> {
    /// `notify-send` then `gdbus`, honoring `DAYWALL_NOTIFY_SEND_BIN` / `DAYWALL_GDBUS_BIN`.
    pub fn from_env() -> Self {
        Self::with_runner(SystemRunner)
    }
}

impl<R: CommandRunner> NotifierChain<R> {
    pub fn with_runner(runner: R) -> Self {
        Self::new(
            runner,
            vec![
                Notifier::NotifySend {
                    program: tool("DAYWALL_NOTIFY_SEND_BIN", "notify-send"),
                },
                Notifier::Gdbus {
                    program: tool("DAYWALL_GDBUS_BIN", "gdbus"),
                },
            ],
        )
    }

    pub fn new(runner: R, notifiers: Vec<Notifier>) -> Self {
        Self { runner, notifiers }
    }
}

impl<R: CommandRunner> Notify for NotifierChain<R> {
    fn notify(&self, title: &str, message: &str, urgency: Urgency) -> bool {
        if self
            .notifiers
            .iter()
            .any(|n| n.try_notify(&self.runner, title, message, urgency))
        {
            return true;
        }
        warn!(title, "no notification mechanism succeeded");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process_runner::{Output, RunError};
    use std::cell::RefCell;

    /// Fails any program whose name is listed in `failing`.
    #[derive(Default)]
    struct ScriptedRunner {
        failing: Vec<&'static str>,
        calls: RefCell<Vec<Invocation>>,
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, cmd: &Invocation, _timeout: Duration) -> Result<Output, RunError> {
            self.calls.borrow_mut().push(cmd.clone());
            let name = cmd.program.to_string_lossy();
            if self.failing.iter().any(|f| *f == name) {
                return Err(RunError::Failed {
                    command: cmd.to_string(),
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "no session bus".into(),
                });
            }
            Ok(Output::default())
        }
    }

    fn chain(runner: &ScriptedRunner) -> NotifierChain<&ScriptedRunner> {
        NotifierChain::new(
            runner,
            vec![
                Notifier::NotifySend {
                    program: "notify-send".into(),
                },
                Notifier::Gdbus {
                    program: "gdbus".into(),
                },
            ],
        )
    }

    #[test]
    fn first_mechanism_wins() {
        let runner = ScriptedRunner::default();
        assert!(chain(&runner).notify("Wallpaper Updated", "bing_20240501.jpg", Urgency::Normal));

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "notify-send");
        assert_eq!(
            calls[0].args,
            [
                "-a",
                "daywall",
                "-u",
                "normal",
                "-i",
                "dialog-information",
                "Wallpaper Updated",
                "bing_20240501.jpg"
            ]
        );
    }

    #[test]
    fn falls_back_to_gdbus() {
        let runner = ScriptedRunner {
            failing: vec!["notify-send"],
            ..Default::default()
        };
        assert!(chain(&runner).notify("Failed", "say \"hi\"", Urgency::Critical));

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].program, "gdbus");
        assert!(calls[1].args.contains(&"\"dialog-error\"".to_string()));
        assert!(calls[1].args.contains(&"\"say \\\"hi\\\"\"".to_string()));
        assert!(calls[1].args.contains(&"{'urgency': <byte 2>}".to_string()));
    }

    #[test]
    fn all_failing_returns_false() {
        let runner = ScriptedRunner {
            failing: vec!["notify-send", "gdbus"],
            ..Default::default()
        };
        assert!(!chain(&runner).notify("t", "m", Urgency::Low));
        assert_eq!(runner.calls.borrow().len(), 2);
    }

    #[test]
    fn gvariant_quoting() {
        assert_eq!(gvariant_string("plain"), "\"plain\"");
        assert_eq!(gvariant_string("a\\b"), "\"a\\\\b\"");
        assert_eq!(gvariant_string("x\ny"), "\"x\\ny\"");
    }
}
