//! Directory-backed artifact history.
//!
//! The directory is the only source of truth: every query rescans it and rebuilds the
//! ordering from file names, so nothing has to be kept in sync across runs. Files whose
//! names the [`namer`](crate::namer) does not recognize are never listed and never deleted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::artifact::{Artifact, ArtifactPlan};
use crate::error::StoreError;
use crate::fs_util::atomic_write;
use crate::namer;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io("create dir", &self.dir, e))
    }

    /// Recognized artifacts, newest first, at most `max` of them.
    ///
    /// Equal timestamps fall back to descending file name so the order is stable. A missing
    /// or unreadable directory lists as empty.
    pub fn list(&self, max: usize) -> Vec<Artifact> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                if self.dir.exists() {
                    warn!(dir = %self.dir.display(), error = %err, "cannot scan wallpaper directory");
                } else {
                    debug!(dir = %self.dir.display(), "wallpaper directory does not exist yet");
                }
                return Vec::new();
            }
        };

        let mut artifacts: Vec<Artifact> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                match namer::parse(name) {
                    Some(parsed) => Some(Artifact::from_parsed(parsed, path.clone())),
                    None => {
                        debug!(file = name, "ignoring file with unrecognized name");
                        None
                    }
                }
            })
            .collect();

        artifacts.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.file_name().cmp(a.file_name()))
        });
        artifacts.truncate(max);
        artifacts
    }

    pub fn list_all(&self) -> Vec<Artifact> {
        self.list(usize::MAX)
    }

    /// The artifact stored under exactly `file_name`, if present.
    pub fn find(&self, file_name: &str) -> Option<Artifact> {
        let parsed = namer::parse(file_name)?;
        let path = self.dir.join(file_name);
        path.is_file().then(|| Artifact::from_parsed(parsed, path))
    }

    /// Write `bytes` under the name derived from `plan`.
    ///
    /// Bytes go to a hidden temporary file first and are renamed into place, so a failed write
    /// never leaves a recognizable artifact behind.
    pub fn save(&self, bytes: &[u8], plan: &ArtifactPlan) -> Result<Artifact, StoreError> {
        self.ensure_dir()?;

        let name = plan.file_name();
        let parsed = namer::parse(&name).ok_or_else(|| StoreError::InvalidName(name.clone()))?;
        let path = self.dir.join(&name);
        atomic_write(&path, bytes).map_err(|e| StoreError::io("write", &path, e))?;

        info!(path = %path.display(), bytes = bytes.len(), kind = %parsed.kind, "saved wallpaper");
        Ok(Artifact::from_parsed(parsed, path))
    }

    /// Copy a local image into the store as a custom artifact stamped `at`.
    pub fn import_file(&self, src: &Path, at: NaiveDateTime) -> Result<Artifact, StoreError> {
        if !src.is_file() {
            return Err(StoreError::SourceMissing(src.to_path_buf()));
        }
        let extension = src
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(namer::path_extension)
            .unwrap_or_default();
        let bytes = fs::read(src).map_err(|e| StoreError::io("read", src, e))?;
        self.save(&bytes, &ArtifactPlan::Custom { extension, at })
    }

    /// Delete everything except the `keep` newest artifacts.
    ///
    /// Returns how many files were actually removed. A file that cannot be deleted is logged
    /// and skipped; the remaining deletions still run.
    pub fn evict(&self, keep: usize) -> usize {
        let all = self.list_all();
        if all.len() <= keep {
            debug!(found = all.len(), keep, "no eviction needed");
            return 0;
        }

        info!(found = all.len(), keep, evicting = all.len() - keep, "evicting old wallpapers");
        remove_each(&all[keep..])
    }

    /// Delete every recognized artifact. Unrelated files stay.
    pub fn purge(&self) -> usize {
        remove_each(&self.list_all())
    }
}

fn remove_each(artifacts: &[Artifact]) -> usize {
    let mut removed = 0;
    for artifact in artifacts {
        match fs::remove_file(artifact.path()) {
            Ok(()) => {
                info!(file = artifact.file_name(), "deleted wallpaper");
                removed += 1;
            }
            Err(err) => {
                warn!(path = %artifact.path().display(), error = %err, "cannot delete wallpaper");
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use chrono::NaiveDate;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"img").unwrap();
    }

    fn names(artifacts: &[Artifact]) -> Vec<&str> {
        artifacts.iter().map(Artifact::file_name).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn list_orders_newest_first_across_kinds() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bing_20240501.jpg");
        touch(dir.path(), "custom_20240501_080000.png");
        touch(dir.path(), "bing_20240430.jpg");
        touch(dir.path(), "custom_20240429_235959.jpg");
        touch(dir.path(), "bing_20240502.jpg");

        let store = ArtifactStore::new(dir.path());
        assert_eq!(
            names(&store.list(10)),
            vec![
                "bing_20240502.jpg",
                "custom_20240501_080000.png",
                "bing_20240501.jpg",
                "bing_20240430.jpg",
                "custom_20240429_235959.jpg",
            ]
        );
    }

    #[test]
    fn list_skips_unrecognized_entries_and_respects_max() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bing_20240501.jpg");
        touch(dir.path(), "bing_20240502.jpg");
        touch(dir.path(), "bing_20240503.jpg");
        touch(dir.path(), "wallpaper.png");
        touch(dir.path(), "bing_2024.jpg");
        touch(dir.path(), ".bing_20240504.jpg.tmp");
        fs::create_dir(dir.path().join("bing_20240505.jpg")).unwrap();

        let store = ArtifactStore::new(dir.path());
        let all = store.list(usize::MAX);
        assert_eq!(
            names(&all),
            vec!["bing_20240503.jpg", "bing_20240502.jpg", "bing_20240501.jpg"]
        );
        assert_eq!(store.list(2).len(), 2);
        assert!(store.list(0).is_empty());
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nope"));
        assert!(store.list(5).is_empty());
        assert_eq!(store.evict(0), 0);
    }

    #[test]
    fn equal_timestamps_order_by_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bing_20240501.jpg");
        touch(dir.path(), "bing_20240501.png");

        let store = ArtifactStore::new(dir.path());
        assert_eq!(
            names(&store.list(10)),
            vec!["bing_20240501.png", "bing_20240501.jpg"]
        );
    }

    #[test]
    fn save_creates_dir_and_writes_under_planned_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("wallpapers"));

        let plan = ArtifactPlan::Scheduled {
            date: day(2024, 5, 1),
            source_url: "https://example.com/img.jpg".into(),
        };
        let artifact = store.save(b"jpeg bytes", &plan).unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Scheduled);
        assert_eq!(artifact.file_name(), "bing_20240501.jpg");
        assert_eq!(artifact.extension, ".jpg");
        assert_eq!(fs::read(artifact.path()).unwrap(), b"jpeg bytes");
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
        assert_eq!(store.find("bing_20240501.jpg"), Some(artifact));
    }

    #[test]
    fn save_same_day_twice_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let plan = ArtifactPlan::Scheduled {
            date: day(2024, 5, 1),
            source_url: "https://example.com/img.jpg".into(),
        };
        store.save(b"first", &plan).unwrap();
        let second = store.save(b"second", &plan).unwrap();

        assert_eq!(store.list_all().len(), 1);
        assert_eq!(fs::read(second.path()).unwrap(), b"second");
    }

    #[test]
    fn save_reports_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        touch(dir.path(), "file");

        let store = ArtifactStore::new(blocker.join("sub"));
        let plan = ArtifactPlan::Custom {
            extension: "png".into(),
            at: day(2024, 5, 1).and_hms_opt(1, 2, 3).unwrap(),
        };
        let err = store.save(b"x", &plan).unwrap_err();
        assert!(matches!(err, StoreError::Io { action: "create dir", .. }));
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let occupied = dir.path().join("bing_20240501.jpg");
        fs::create_dir(&occupied).unwrap();
        touch(&occupied, "inner");

        let store = ArtifactStore::new(dir.path());
        let plan = ArtifactPlan::Scheduled {
            date: day(2024, 5, 1),
            source_url: "https://example.com/img.jpg".into(),
        };
        let err = store.save(b"x", &plan).unwrap_err();

        assert!(matches!(err, StoreError::Io { action: "write", .. }));
        assert!(!dir.path().join(".bing_20240501.jpg.tmp").exists());
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn find_ignores_missing_and_foreign_names() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "wallpaper.png");
        let store = ArtifactStore::new(dir.path());
        assert!(store.find("wallpaper.png").is_none());
        assert!(store.find("bing_20240501.jpg").is_none());
    }

    #[test]
    fn import_file_copies_as_custom() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Holiday.PNG");
        fs::write(&src, b"png").unwrap();

        let store = ArtifactStore::new(dir.path().join("store"));
        let at = day(2024, 6, 1).and_hms_opt(10, 11, 12).unwrap();
        let artifact = store.import_file(&src, at).unwrap();

        assert_eq!(artifact.file_name(), "custom_20240601_101112.png");
        assert_eq!(artifact.kind, ArtifactKind::Custom);
        assert!(src.exists());

        let err = store.import_file(&dir.path().join("missing.jpg"), at).unwrap_err();
        assert!(matches!(err, StoreError::SourceMissing(_)));
    }

    #[test]
    fn evict_keeps_the_newest() {
        let dir = tempfile::tempdir().unwrap();
        for d in 1..=9 {
            touch(dir.path(), &format!("bing_202405{d:02}.jpg"));
        }
        touch(dir.path(), "custom_20240510_000001.jpg");
        touch(dir.path(), "notes.txt");

        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.evict(3), 7);

        assert_eq!(
            names(&store.list_all()),
            vec![
                "custom_20240510_000001.jpg",
                "bing_20240509.jpg",
                "bing_20240508.jpg",
            ]
        );
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn evict_below_limit_removes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bing_20240501.jpg");
        touch(dir.path(), "bing_20240502.jpg");

        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.evict(2), 0);
        assert_eq!(store.evict(7), 0);
        assert_eq!(store.list_all().len(), 2);
    }

    #[test]
    fn evict_zero_removes_everything_recognized() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bing_20240501.jpg");
        touch(dir.path(), "custom_20240502_120000.jpg");
        touch(dir.path(), "keep-me.jpg");

        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.evict(0), 2);
        assert!(store.list_all().is_empty());
        assert!(dir.path().join("keep-me.jpg").exists());
    }

    #[test]
    fn purge_leaves_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "bing_20240501.jpg");
        touch(dir.path(), "custom_20240502_120000.jpg");
        touch(dir.path(), "thumb.jpg");

        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.purge(), 2);
        assert!(dir.path().join("thumb.jpg").exists());
    }
}
