//! Canonical artifact file names.
//!
//! Two encodings share the store directory:
//!
//! | Kind | Pattern | Example |
//! |------|---------|---------|
//! | Scheduled | `bing_YYYYMMDD<ext>` | `bing_20240501.jpg` |
//! | Custom | `custom_YYYYMMDD_HHMMSS<ext>` | `custom_20240501_153000.png` |
//!
//! Both are fixed-width and zero-padded, so names of the same kind sort lexicographically in
//! chronological order. Anything else in the directory is ignored by [`parse`].

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use url::Url;

use crate::artifact::{ArtifactKind, ParsedName};

pub const SCHEDULED_PREFIX: &str = "bing_";
pub const CUSTOM_PREFIX: &str = "custom_";
pub const DEFAULT_EXTENSION: &str = ".jpg";

const DATE_FMT: &str = "%Y%m%d";
const DATETIME_FMT: &str = "%Y%m%d_%H%M%S";

static SCHEDULED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bing_(\d{8})(\..+)$").expect("scheduled name regex"));
static CUSTOM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^custom_(\d{8}_\d{6})(\..+)$").expect("custom name regex"));

/// Name for the feed image of `date`.
///
/// The extension comes from the last path segment of `source_url`; `.jpg` when the URL has
/// none or cannot be parsed. Time of day plays no part, so a second fetch on the same day maps
/// to the same file.
pub fn scheduled_file_name(date: NaiveDate, source_url: &str) -> String {
    let ext = url_extension(source_url).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{SCHEDULED_PREFIX}{}{ext}", date.format(DATE_FMT))
}

/// Name for a user-supplied image saved at `at` (second granularity).
///
/// Two saves within the same second produce the same name.
pub fn custom_file_name(extension: &str, at: NaiveDateTime) -> String {
    format!(
        "{CUSTOM_PREFIX}{}{}",
        at.format(DATETIME_FMT),
        normalize_extension(extension)
    )
}

/// Lower-case with exactly one leading `.`; `.jpg` when empty or not alphanumeric.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return DEFAULT_EXTENSION.to_string();
    }
    format!(".{}", trimmed.to_lowercase())
}

/// Recover kind, timestamp and extension from a file name produced by this module.
///
/// Returns `None` for anything else, including names that match the pattern but carry a date
/// or time that does not exist on the calendar.
pub fn parse(file_name: &str) -> Option<ParsedName> {
    if let Some(caps) = SCHEDULED_RE.captures(file_name) {
        let date = NaiveDate::parse_from_str(&caps[1], DATE_FMT).ok()?;
        return Some(ParsedName {
            kind: ArtifactKind::Scheduled,
            timestamp: date.and_hms_opt(0, 0, 0)?,
            extension: caps[2].to_lowercase(),
        });
    }

    if let Some(caps) = CUSTOM_RE.captures(file_name) {
        let ts = NaiveDateTime::parse_from_str(&caps[1], DATETIME_FMT).ok()?;
        return Some(ParsedName {
            kind: ArtifactKind::Custom,
            timestamp: ts,
            extension: caps[2].to_lowercase(),
        });
    }

    None
}

/// Parse the day reported by the feed.
///
/// Accepts the compact `YYYYMMDD` form and ISO `YYYY-MM-DD`, optionally followed by a `T...`
/// time part which is dropped.
pub fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split('T').next()?.replace('-', "");
    if day.len() != 8 || !day.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&day, DATE_FMT).ok()
}

/// Extension of the last path segment of `raw`, lower-cased with a leading `.`.
pub fn url_extension(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let segment = url.path_segments()?.next_back()?;
    path_extension(segment)
}

/// Extension of a bare file name, lower-cased with a leading `.`.
pub fn path_extension(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    // ".hidden" has no extension.
    if dot == 0 {
        return None;
    }
    let ext = &name[dot + 1..];
    if ext.is_empty() || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}
