//! daywall-infra: OS adapters (gsettings, notifications, Bing HTTP, TOML config, systemd).

pub mod bing;
pub mod config_file;
pub mod desktop;
pub mod env_detect;
pub mod notify;
pub mod paths;
pub mod process_runner;
pub mod systemd;

