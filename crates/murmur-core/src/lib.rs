//! Core types and configuration for murmur.
//!
//! This crate provides platform-agnostic types that can be used across
//! all murmur sub-crates.

mod config;
mod countdown;

use std::time::Duration;

pub use config::{Config, ConfigManager};
pub use countdown::Countdown;

/// Application name
pub const APP_NAME: &str = "murmur";

/// Pretty application name for display
pub const APP_NAME_PRETTY: &str = "Murmur";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Sample rate the recognizer is bound to, in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Samples per audio block fed to the recognizer (0.5 s at 16 kHz).
pub const BLOCK_SIZE: usize = 8_000;

/// Capacity of the bounded audio block queue. Blocks produced while the
/// queue is full are dropped.
pub const QUEUE_CAPACITY: usize = 20;

/// Consumer poll timeout on the audio queue. Also bounds how quickly the
/// feed loop observes a stop request.
pub const QUEUE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default seconds between automatic transcript dumps.
pub const DUMP_INTERVAL_SECS: u32 = 120;

/// Base directory containing one subdirectory per speech model.
pub const MODEL_DIR: &str = "model";

/// Prefix of pane-only transcript lines. Lines starting with this prefix
/// are shown on screen but never written to the log file.
pub const RECOGNIZED_PREFIX: &str = "Recognized:";
