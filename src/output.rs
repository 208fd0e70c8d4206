//! CLI output formatting.

use daywall_core::{Artifact, ArtifactKind};

pub fn debug_enabled() -> bool {
    std::env::var_os("DAYWALL_DEBUG").is_some_and(|v| !v.is_empty())
}

pub fn print_error(err: &anyhow::Error) {
    eprintln!("{}", format_error(err, debug_enabled()));
}

/// Top-level message only, or the whole cause chain when debugging.
pub fn format_error(err: &anyhow::Error, debug: bool) -> String {
    if debug {
        format!("error: {err:#}")
    } else {
        format!("error: {err}")
    }
}

/// One history line: `<file name>  <kind>  <date or date-time>`.
pub fn artifact_line(artifact: &Artifact) -> String {
    let when = match artifact.kind {
        ArtifactKind::Scheduled => artifact.timestamp.format("%Y-%m-%d").to_string(),
        ArtifactKind::Custom => artifact.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    format!(
        "{:<32} {:<9} {when}",
        artifact.file_name(),
        artifact.kind.to_string()
    )
}

pub fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}
