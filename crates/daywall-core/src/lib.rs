//! daywall-core: wallpaper artifact naming, the on-disk store and the daily update workflow.

pub mod artifact;
pub mod clock;
pub mod config;
pub mod error;
pub mod fs_util;
pub mod namer;
pub mod ports;
pub mod store;
pub mod update;

pub use artifact::{Artifact, ArtifactKind, ArtifactPlan, ParsedName};
pub use error::{ApplyError, ConfigError, FetchError, StoreError, UpdateError};
pub use store::ArtifactStore;
pub use update::{SkipReason, UpdateOutcome, Updater};
