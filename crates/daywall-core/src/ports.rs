//! Collaborator ports used by the update workflow.

use std::fmt;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{ApplyError, FetchError};

/// One entry of the image-of-the-day feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Absolute URL of the full-size image.
    pub source_url: String,
    /// Day the image belongs to.
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
}

pub trait MetadataFeed {
    fn fetch_metadata(&self, region: &str) -> Result<FeedEntry, FetchError>;
}

/// Retrieves image bytes.
///
/// Implementations must reject anything that does not decode as a supported raster image,
/// and must not touch the filesystem; the store does the writing.
pub trait ImageDownloader {
    fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Makes an image file the active desktop background.
pub trait Desktop {
    fn apply(&self, image: &Path) -> Result<(), ApplyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Critical => "critical",
        })
    }
}

/// Best-effort user notification. Returns whether a notification was delivered.
pub trait Notify {
    fn notify(&self, title: &str, message: &str, urgency: Urgency) -> bool;
}

impl<T: Notify + ?Sized> Notify for &T {
    fn notify(&self, title: &str, message: &str, urgency: Urgency) -> bool {
        (**self).notify(title, message, urgency)
    }
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Notify for Silent {
    fn notify(&self, _title: &str, _message: &str, _urgency: Urgency) -> bool {
        false
    }
}
