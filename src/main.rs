mod args;
mod logging;
mod output;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing::{debug, warn};

use daywall_core::config::{Config, ConfigStore, Settings};
use daywall_core::{ArtifactStore, SkipReason, UpdateOutcome, Updater};
use daywall_infra::bing::{self, BingClient};
use daywall_infra::config_file::TomlConfigStore;
use daywall_infra::desktop::GnomeDesktop;
use daywall_infra::notify::NotifierChain;
use daywall_infra::paths;
use daywall_infra::systemd::TimerUnits;

fn main() -> ExitCode {
    let _log_guard = logging::init(&paths::data_dir());

    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn real_main() -> anyhow::Result<()> {
    use clap::Parser as _;

    use args::{Command, ConfigAction, ScheduleAction};

    let cli = args::Cli::parse();
    let config = TomlConfigStore::default_location();

    match cli.cmd {
        Command::Update => daily_update(&config),
        Command::Fetch => with_updater(&config, |updater| {
            let (entry, artifact) = updater.fetch_today()?;
            println!("{}", entry.title);
            if !entry.description.is_empty() {
                println!("{}", entry.description);
            }
            println!("{}", artifact.path().display());
            Ok(())
        }),
        Command::Custom { url } => with_updater(&config, |updater| {
            let artifact = updater
                .apply_custom_url(&url)
                .with_context(|| format!("custom wallpaper from {url}"))?;
            println!("Applied {}", artifact.path().display());
            Ok(())
        }),
        Command::Set { image } => with_updater(&config, |updater| {
            let image = std::path::absolute(&image)
                .with_context(|| format!("resolve {}", image.display()))?;
            let artifact = updater
                .apply_existing(&image)
                .with_context(|| format!("set wallpaper {}", image.display()))?;
            println!("Applied {}", artifact.path().display());
            Ok(())
        }),
        Command::Download { url, dest } => bing::download_to(&BingClient::new(), &url, &dest),
        Command::List { all } => list(&config, all),
        Command::Clean => clean(&config),
        Command::Schedule { action } => match action {
            ScheduleAction::Enable => schedule(&config, true),
            ScheduleAction::Disable => schedule(&config, false),
            ScheduleAction::Status => schedule_status(&config),
        },
        Command::Config { action } => match action {
            ConfigAction::Show => show_config(&config),
            ConfigAction::SetRegion { region } => {
                let region = region.trim().to_string();
                if region.is_empty() || region.contains(char::is_whitespace) {
                    bail!("invalid region {region:?}");
                }
                edit_config(&config, |s| s.region = region)
            }
            ConfigAction::SetKeep { keep } => edit_config(&config, |s| s.keep_history = keep),
            ConfigAction::SetDir { dir } => {
                let dir = std::path::absolute(paths::expand_home(&dir))
                    .with_context(|| format!("resolve {}", dir.display()))?;
                edit_config(&config, |s| s.wallpaper_dir = Some(dir))
            }
        },
        Command::Uninstall { purge } => uninstall(&config, purge),
    }
}

/// Settings for locating the store. A broken file falls back to defaults here; the
/// operation that actually needs the config reports the error.
fn settings_or_default(config: &TomlConfigStore) -> Settings {
    match config.load() {
        Ok(c) => c.settings,
        Err(err) => {
            debug!(error = %err, "config unreadable; using default settings");
            Settings::default()
        }
    }
}

fn with_updater<T>(
    config: &TomlConfigStore,
    f: impl FnOnce(&Updater<'_>) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let store = ArtifactStore::new(paths::wallpaper_dir(&settings_or_default(config)));
    let client = BingClient::new();
    let desktop = GnomeDesktop::from_env();
    let notifier = NotifierChain::from_env();

    let updater =
        Updater::new(&store, config, &client, &client, &desktop).with_notifier(&notifier);
    f(&updater)
}

fn daily_update(config: &TomlConfigStore) -> anyhow::Result<()> {
    let outcome = with_updater(config, |updater| Ok(updater.run_daily_update()))?;
    match outcome {
        UpdateOutcome::Succeeded(artifact) => {
            println!("Applied {}", artifact.path().display());
            Ok(())
        }
        UpdateOutcome::Skipped(SkipReason::Disabled) => {
            println!("Daily updates are disabled (run `daywall schedule enable`).");
            Ok(())
        }
        UpdateOutcome::Skipped(SkipReason::AlreadyAppliedToday(day)) => {
            println!("Already updated for {day}.");
            Ok(())
        }
        UpdateOutcome::Failed(err) => Err(anyhow::Error::new(err).context("daily update")),
    }
}

fn load(config: &TomlConfigStore) -> anyhow::Result<Config> {
    config
        .load()
        .with_context(|| format!("load {}", config.path().display()))
}

fn list(config: &TomlConfigStore, all: bool) -> anyhow::Result<()> {
    let settings = load(config)?.settings;
    let store = ArtifactStore::new(paths::wallpaper_dir(&settings));
    let max = if all { usize::MAX } else { settings.keep_history };

    let artifacts = store.list(max);
    if artifacts.is_empty() {
        println!("No wallpapers stored in {}", store.dir().display());
    }
    for artifact in &artifacts {
        println!("{}", output::artifact_line(artifact));
    }
    Ok(())
}

fn clean(config: &TomlConfigStore) -> anyhow::Result<()> {
    let settings = load(config)?.settings;
    let store = ArtifactStore::new(paths::wallpaper_dir(&settings));
    let removed = store.evict(settings.keep_history);
    println!(
        "Removed {removed} wallpaper(s); keeping at most {}.",
        settings.keep_history
    );
    Ok(())
}

fn schedule(config: &TomlConfigStore, enable: bool) -> anyhow::Result<()> {
    let units = TimerUnits::from_env();
    if enable {
        let exe = std::env::current_exe().context("locate daywall executable")?;
        units.enable(&exe)?;
    } else {
        units.disable()?;
    }

    edit_config(config, |s| s.enabled = enable)?;
    println!(
        "Daily updates {}.",
        if enable { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn schedule_status(config: &TomlConfigStore) -> anyhow::Result<()> {
    let cfg = load(config)?;
    let status = TimerUnits::from_env().status();

    println!("enabled in config: {}", output::yes_no(cfg.settings.enabled));
    println!("timer installed:   {}", output::yes_no(status.installed));
    println!("timer enabled:     {}", output::yes_no(status.enabled));
    println!("timer active:      {}", output::yes_no(status.active));
    match cfg.state.last_update_date {
        Some(day) => println!("last update:       {day}"),
        None => println!("last update:       never"),
    }
    Ok(())
}

fn show_config(config: &TomlConfigStore) -> anyhow::Result<()> {
    let cfg = load(config)?;
    println!("config file:   {}", config.path().display());
    println!("enabled:       {}", output::yes_no(cfg.settings.enabled));
    println!("region:        {}", cfg.settings.region);
    println!("keep history:  {}", cfg.settings.keep_history);
    println!(
        "wallpaper dir: {}",
        paths::wallpaper_dir(&cfg.settings).display()
    );
    Ok(())
}

fn edit_config(config: &TomlConfigStore, edit: impl FnOnce(&mut Settings)) -> anyhow::Result<()> {
    let mut cfg = load(config)?;
    edit(&mut cfg.settings);
    config
        .save(&cfg)
        .with_context(|| format!("save {}", config.path().display()))?;
    debug!(settings = ?cfg.settings, "config updated");
    Ok(())
}

fn uninstall(config: &TomlConfigStore, purge: bool) -> anyhow::Result<()> {
    match TimerUnits::from_env().uninstall() {
        Ok(true) => println!("Removed daily timer."),
        Ok(false) => {}
        Err(err) => warn!(error = %format!("{err:#}"), "timer removal incomplete"),
    }

    if purge {
        let store = ArtifactStore::new(paths::wallpaper_dir(&settings_or_default(config)));
        let removed = store.purge();
        println!(
            "Deleted {removed} wallpaper(s) from {}.",
            store.dir().display()
        );
    }

    if config.delete()? {
        println!("Removed {}", config.path().display());
    }
    remove_if_empty(config.path().parent());
    Ok(())
}

fn remove_if_empty(dir: Option<&Path>) {
    if let Some(dir) = dir {
        let _ = std::fs::remove_dir(dir);
    }
}
