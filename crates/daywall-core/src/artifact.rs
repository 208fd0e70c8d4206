//! Stored wallpaper artifacts.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Tied to a calendar day of the image-of-the-day feed.
    Scheduled,
    /// Supplied by the user at an arbitrary moment.
    Custom,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => f.write_str("scheduled"),
            Self::Custom => f.write_str("custom"),
        }
    }
}

/// Attributes recovered from an artifact file name.
///
/// Scheduled artifacts carry a day; their timestamp is midnight of that day so both kinds
/// order on a single time axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub kind: ArtifactKind,
    pub timestamp: NaiveDateTime,
    /// Lower-cased, including the leading `.`.
    pub extension: String,
}

impl ParsedName {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub timestamp: NaiveDateTime,
    pub extension: String,
    pub path: PathBuf,
}

impl Artifact {
    pub fn from_parsed(parsed: ParsedName, path: PathBuf) -> Self {
        Self {
            kind: parsed.kind,
            timestamp: parsed.timestamp,
            extension: parsed.extension,
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// What to name a new artifact before its bytes are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPlan {
    Scheduled {
        date: NaiveDate,
        source_url: String,
    },
    Custom {
        extension: String,
        at: NaiveDateTime,
    },
}

impl ArtifactPlan {
    pub fn file_name(&self) -> String {
        match self {
            Self::Scheduled { date, source_url } => {
                crate::namer::scheduled_file_name(*date, source_url)
            }
            Self::Custom { extension, at } => crate::namer::custom_file_name(extension, *at),
        }
    }
}
