//! The update workflows: the unattended daily run and the interactive apply actions.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::artifact::{Artifact, ArtifactPlan};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigStore};
use crate::error::UpdateError;
use crate::namer;
use crate::ports::{Desktop, FeedEntry, ImageDownloader, MetadataFeed, Notify, Silent, Urgency};
use crate::store::ArtifactStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    AlreadyAppliedToday(NaiveDate),
}

#[derive(Debug)]
pub enum UpdateOutcome {
    Succeeded(Artifact),
    Skipped(SkipReason),
    Failed(UpdateError),
}

/// Wires the store to its collaborators.
///
/// Every dependency is borrowed, so callers decide lifetimes and tests can hand in fakes.
pub struct Updater<'a> {
    store: &'a ArtifactStore,
    config: &'a dyn ConfigStore,
    feed: &'a dyn MetadataFeed,
    downloader: &'a dyn ImageDownloader,
    desktop: &'a dyn Desktop,
    notifier: &'a dyn Notify,
    clock: &'a dyn Clock,
}

impl<'a> Updater<'a> {
    pub fn new(
        store: &'a ArtifactStore,
        config: &'a dyn ConfigStore,
        feed: &'a dyn MetadataFeed,
        downloader: &'a dyn ImageDownloader,
        desktop: &'a dyn Desktop,
    ) -> Self {
        Self {
            store,
            config,
            feed,
            downloader,
            desktop,
            notifier: &Silent,
            clock: &SystemClock,
        }
    }

    pub fn with_notifier(mut self, notifier: &'a dyn Notify) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Fetch, store and apply today's feed image.
    ///
    /// Skips when disabled or when today's update already succeeded. On failure nothing in
    /// the persisted state changes, so the next scheduled run starts over.
    pub fn run_daily_update(&self) -> UpdateOutcome {
        info!("starting daily update");

        let mut config = match self.config.load() {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "cannot load configuration");
                self.notify_failure("Cannot read configuration; daily update aborted.");
                return UpdateOutcome::Failed(err.into());
            }
        };

        if !config.settings.enabled {
            info!("daily updates are disabled");
            return UpdateOutcome::Skipped(SkipReason::Disabled);
        }

        let today = self.clock.today();
        if config.state.last_update_date == Some(today) {
            info!(%today, "wallpaper already updated today");
            return UpdateOutcome::Skipped(SkipReason::AlreadyAppliedToday(today));
        }
        info!(
            last = ?config.state.last_update_date,
            %today,
            region = %config.settings.region,
            keep = config.settings.keep_history,
            "proceeding with daily update"
        );

        let entry = match self.feed.fetch_metadata(&config.settings.region) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(region = %config.settings.region, error = %err, "cannot fetch feed metadata");
                self.notify_failure(&format!(
                    "Could not fetch image information for region {}.",
                    config.settings.region
                ));
                return UpdateOutcome::Failed(err.into());
            }
        };
        info!(date = %entry.date, title = %entry.title, "fetched feed entry");

        let artifact = match self.ensure_scheduled(&entry) {
            Ok(artifact) => artifact,
            Err(err) => {
                warn!(url = %entry.source_url, error = %err, "cannot store today's image");
                self.notify_failure("Could not download today's image.");
                return UpdateOutcome::Failed(err);
            }
        };

        if let Err(err) = self.desktop.apply(artifact.path()) {
            error!(path = %artifact.path().display(), error = %err, "cannot apply wallpaper");
            return UpdateOutcome::Failed(err.into());
        }

        config.state.last_update_date = Some(today);
        if let Err(err) = self.config.save(&config) {
            error!(error = %err, "wallpaper applied but last update date not saved");
        }

        self.evict(&config);
        info!(file = artifact.file_name(), "daily update completed");
        UpdateOutcome::Succeeded(artifact)
    }

    /// Make sure today's feed image is in the store without applying it.
    pub fn fetch_today(&self) -> Result<(FeedEntry, Artifact), UpdateError> {
        let config = self.config.load()?;
        let entry = self.feed.fetch_metadata(&config.settings.region)?;
        let artifact = self.ensure_scheduled(&entry)?;
        self.evict(&config);
        Ok((entry, artifact))
    }

    /// Download an arbitrary image, keep it as a custom artifact and apply it.
    pub fn apply_custom_url(&self, url: &str) -> Result<Artifact, UpdateError> {
        let config = self.config.load()?;

        let bytes = self.downloader.download(url)?;
        let plan = ArtifactPlan::Custom {
            extension: namer::url_extension(url).unwrap_or_default(),
            at: self.clock.now(),
        };
        let artifact = self.store.save(&bytes, &plan)?;

        self.desktop.apply(artifact.path())?;
        self.evict(&config);
        Ok(artifact)
    }

    /// Apply an image already on disk.
    ///
    /// A recognized artifact inside the store is applied as is; any other file is first
    /// imported into the store as a custom artifact.
    pub fn apply_existing(&self, image: &Path) -> Result<Artifact, UpdateError> {
        let config = self.config.load()?;

        let artifact = match self.stored_artifact(image) {
            Some(artifact) => artifact,
            None => self.store.import_file(image, self.clock.now())?,
        };

        self.desktop.apply(artifact.path())?;
        self.evict(&config);
        Ok(artifact)
    }

    /// The store entry `image` points at, however the path is spelled.
    fn stored_artifact(&self, image: &Path) -> Option<Artifact> {
        let image = image.canonicalize().ok()?;
        let dir = self.store.dir().canonicalize().ok()?;
        if image.parent() != Some(dir.as_path()) {
            return None;
        }
        self.store.find(image.file_name()?.to_str()?)
    }

    fn ensure_scheduled(&self, entry: &FeedEntry) -> Result<Artifact, UpdateError> {
        let name = namer::scheduled_file_name(entry.date, &entry.source_url);
        if let Some(existing) = self.store.find(&name) {
            info!(file = %name, "today's image already downloaded");
            return Ok(existing);
        }

        info!(url = %entry.source_url, file = %name, "downloading image");
        let bytes = self.downloader.download(&entry.source_url)?;
        let plan = ArtifactPlan::Scheduled {
            date: entry.date,
            source_url: entry.source_url.clone(),
        };
        Ok(self.store.save(&bytes, &plan)?)
    }

    fn evict(&self, config: &Config) {
        let removed = self.store.evict(config.settings.keep_history);
        if removed > 0 {
            info!(removed, keep = config.settings.keep_history, "history cleanup done");
        }
    }

    fn notify_failure(&self, message: &str) {
        self.notifier
            .notify("Wallpaper Update Failed", message, Urgency::Normal);
    }
}
