//! Error taxonomy shared by the core and its adapters.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Remote metadata or image retrieval failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    /// The feed answered but the payload was unusable.
    #[error("feed error: {0}")]
    Feed(String),

    /// Downloaded bytes are not a supported image.
    #[error("invalid image: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("source image not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("generated name is not a recognized artifact name: {0}")]
    InvalidName(String),
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Failure to apply an artifact as the desktop background.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("cannot build a file URI for {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("required tool `{program}` not found on PATH")]
    ToolMissing { program: String },

    #[error("`{command}` timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },

    #[error("`{command}` failed ({}): {stderr}", describe_exit(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
        stdout: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit {c}"),
        None => "killed by signal".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("serialize config: {0}")]
    Serialize(String),

    #[error("write config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why an update workflow did not complete.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("apply failed: {0}")]
    Apply(#[from] ApplyError),

    #[error("config failed: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_mentions_exit_code_and_stderr() {
        let err = ApplyError::CommandFailed {
            command: "gsettings set org.gnome.desktop.background picture-uri x".into(),
            code: Some(1),
            stderr: "No such key".into(),
            stdout: String::new(),
        };
        let s = err.to_string();
        assert!(s.contains("exit 1"));
        assert!(s.contains("No such key"));

        let err = ApplyError::CommandFailed {
            command: "gsettings".into(),
            code: None,
            stderr: String::new(),
            stdout: String::new(),
        };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn update_error_wraps_sources() {
        let err: UpdateError = FetchError::Network("connection refused".into()).into();
        assert_eq!(err.to_string(), "fetch failed: network error: connection refused");
    }
}
