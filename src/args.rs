//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "daywall", version)]
#[command(about = "Daily Bing wallpaper for GNOME", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the daily update (what the timer invokes).
    Update,

    /// Download today's image into the history without applying it.
    Fetch,

    /// Download an image from a URL, keep it in the history and apply it.
    Custom {
        /// http(s) URL of a JPEG or PNG image.
        url: String,
    },

    /// Apply an image file, either from the history or from anywhere on disk.
    Set {
        /// Absolute or relative path to an image file.
        image: PathBuf,
    },

    /// Download and validate an image to a path, outside the history.
    Download { url: String, dest: PathBuf },

    /// List stored wallpapers, newest first.
    List {
        /// Show every stored wallpaper instead of the history limit.
        #[arg(long)]
        all: bool,
    },

    /// Remove stored wallpapers beyond the history limit.
    Clean,

    /// Manage the daily systemd user timer.
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Show or edit settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Remove the timer and the configuration file.
    Uninstall {
        /// Also delete every stored wallpaper.
        #[arg(long)]
        purge: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScheduleAction {
    /// Install and start the timer; turns daily updates on.
    Enable,
    /// Stop the timer; turns daily updates off.
    Disable,
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    Show,
    /// Feed market, e.g. `en-US` or `de-DE`.
    SetRegion { region: String },
    /// Number of wallpapers to keep.
    SetKeep { keep: usize },
    /// Directory wallpapers are stored in.
    SetDir { dir: PathBuf },
}
