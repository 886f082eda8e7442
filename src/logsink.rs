//! Append-only log sink.
//!
//! State changes go to a plain text file next to the configuration.
//! Recognized-utterance lines are the one exception: they are shown in
//! the transcript pane only and never persisted.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use murmur_core::{DEFAULT_LOG_LEVEL, RECOGNIZED_PREFIX};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the logger with an append-only file sink.
pub fn init(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory at {:?}", parent))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file at {:?}", log_path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MURMUR_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .init();

    Ok(())
}

/// Records a state-change message, skipping pane-only recognized lines.
pub fn log_line(message: &str) {
    if should_persist(message) {
        info!("{}", message);
    }
}

fn should_persist(message: &str) -> bool {
    !message.starts_with(RECOGNIZED_PREFIX)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_init_creates_file_and_filters_recognized_lines() {
        let temp = tempdir().expect("Failed to create temp dir");
        let log_path = temp.path().join("logs").join("murmur.log");
        init(&log_path).unwrap();

        log_line("Started listening.");
        log_line("Recognized: testing one two");

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("Started listening."));
        assert!(!contents.contains("Recognized:"));
    }

    #[test]
    fn test_recognized_lines_stay_on_screen_only() {
        assert!(!should_persist("Recognized: testing one two"));
    }

    #[test]
    fn test_state_changes_are_persisted() {
        assert!(should_persist("Started listening."));
        assert!(should_persist("LLM dump timer disabled."));
        // Only the line prefix is excluded.
        assert!(should_persist("Note: Recognized: embedded"));
    }
}
