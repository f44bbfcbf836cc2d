//! Shared utilities for CLI commands

use pgit_core::{FileChange, SkippedFile};

/// Render a version for display; the empty version means "never applied".
pub(crate) fn display_version(version: &str) -> &str {
    if version.is_empty() {
        "-"
    } else {
        version
    }
}

/// Format a version transition, shortening commit ids.
pub(crate) fn format_change(change: &FileChange) -> String {
    format!(
        "{}  {} -> {}",
        change.path,
        short_version(&change.from_version),
        short_version(&change.to_version)
    )
}

/// Shorten 40/64-character commit ids to the usual 12-character prefix.
pub(crate) fn short_version(version: &str) -> &str {
    if version.len() >= 40 && version.chars().all(|c| c.is_ascii_hexdigit()) {
        &version[..12]
    } else {
        display_version(version)
    }
}

/// Print skipped files to stderr.
pub(crate) fn print_skipped(skipped: &[SkippedFile]) {
    if skipped.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("Skipped {} file(s):", skipped.len());
    for file in skipped {
        eprintln!(
            "  {} (at {}): {}",
            file.path,
            short_version(&file.version),
            file.reason
        );
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
