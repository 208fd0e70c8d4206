//! Run external commands with a time budget.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use wait_timeout::ChildExt;

use daywall_core::ApplyError;

/// Resolve a tool name, honoring an environment override (absolute path or name).
pub fn tool(env_var: &str, default: &str) -> OsString {
    std::env::var_os(env_var)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.into())
}

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl AsRef<OsStr>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.as_ref().to_os_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("`{program}` not found")]
    ToolMissing { program: String },

    #[error("`{command}` timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },

    #[error("`{command}` exited with {}: {}", exit_label(.code), .stderr.trim())]
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl From<RunError> for ApplyError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::ToolMissing { program } => ApplyError::ToolMissing { program },
            RunError::Timeout { command, after } => ApplyError::Timeout { command, after },
            RunError::Failed {
                command,
                code,
                stdout,
                stderr,
            } => ApplyError::CommandFailed {
                command,
                code,
                stderr,
                stdout,
            },
            RunError::Io { command, source } => ApplyError::CommandFailed {
                command,
                code: None,
                stderr: source.to_string(),
                stdout: String::new(),
            },
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

/// Executes [`Invocation`]s. The seam the desktop adapter and the notifier are tested through.
pub trait CommandRunner {
    /// Run to completion within `timeout`. Non-zero exit is an error carrying captured output.
    fn run(&self, cmd: &Invocation, timeout: Duration) -> Result<Output, RunError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, cmd: &Invocation, timeout: Duration) -> Result<Output, RunError> {
        (**self).run(cmd, timeout)
    }
}

/// Runs real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &Invocation, timeout: Duration) -> Result<Output, RunError> {
        let command = cmd.to_string();
        let missing = || RunError::ToolMissing {
            program: cmd.program.to_string_lossy().into_owned(),
        };

        let exe = which::which(&cmd.program).map_err(|_| missing())?;
        debug!(%command, "running");

        let mut child = Command::new(exe)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    missing()
                } else {
                    RunError::Io {
                        command: command.clone(),
                        source,
                    }
                }
            })?;

        // Read both pipes while waiting, or a child with large output blocks on write.
        let stdout = spawn_drain(child.stdout.take());
        let stderr = spawn_drain(child.stderr.take());

        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = (stdout.join(), stderr.join());
                return Err(RunError::Timeout {
                    command,
                    after: timeout,
                });
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = (stdout.join(), stderr.join());
                return Err(RunError::Io { command, source });
            }
        };

        let output = Output {
            stdout: joined(stdout),
            stderr: joined(stderr),
        };
        if status.success() {
            return Ok(output);
        }
        Err(RunError::Failed {
            command,
            code: status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn spawn_drain<S: Read + Send + 'static>(stream: Option<S>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut s) = stream {
            let _ = s.read_to_end(&mut buf);
        }
        buf
    })
}

fn joined(reader: JoinHandle<Vec<u8>>) -> String {
    let bytes = reader.join().unwrap_or_default();
    String::from_utf8_lossy(&bytes).trim_end().to_string()
}
