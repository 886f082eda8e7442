//! Speech recognition seam for murmur.
//!
//! This crate provides a trait-based abstraction over the speech engine:
//! raw PCM blocks go in, finalized utterance text comes out. The actual
//! engine (Vosk) is an external capability and is only linked when the
//! `local-vosk` feature is enabled.

#[cfg(feature = "local-vosk")]
mod local;

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "local-vosk")]
pub use local::VoskRecognizer;
use thiserror::Error;

/// Errors that can occur while setting up or driving a recognizer.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("model directory not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("no model subdirectories found in {0}")]
    NoModels(PathBuf),

    #[error("speech engine failed: {0}")]
    Engine(String),

    #[error("built without a local speech engine (enable the `local-vosk` feature)")]
    EngineUnavailable,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for speech operations.
pub type Result<T> = std::result::Result<T, SpeechError>;

/// Trait for speech recognizers.
///
/// A recognizer consumes fixed-size blocks of mono 16-bit PCM and decides
/// on its own when an utterance is complete.
pub trait Recognizer: Send {
    /// Feed one block of audio. Returns the finalized utterance text when
    /// the engine decides this block completes an utterance with non-empty
    /// text, `None` otherwise.
    fn accept(&mut self, block: &[i16]) -> Option<String>;

    /// Returns the name of this recognizer for logging/debugging.
    fn name(&self) -> &str;
}

/// Lists the model subdirectories under `base`, sorted by name.
///
/// A missing base directory or an empty one is an error so that startup
/// can treat "no models installed at all" as fatal.
pub fn list_models(base: &Path) -> Result<Vec<String>> {
    if !base.is_dir() {
        return Err(SpeechError::ModelNotFound(base.to_path_buf()));
    }

    let mut models = Vec::new();
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if entry.path().is_dir() {
            models.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    models.sort();

    if models.is_empty() {
        return Err(SpeechError::NoModels(base.to_path_buf()));
    }
    Ok(models)
}

/// Returns the on-disk path of the named model under `base`.
pub fn model_path(base: &Path, name: &str) -> PathBuf {
    base.join(name)
}

/// Constructs the local recognizer for the model directory at `path`.
#[cfg(feature = "local-vosk")]
pub fn local_recognizer(path: &Path, sample_rate: u32) -> Result<Box<dyn Recognizer>> {
    Ok(Box::new(VoskRecognizer::new(path, sample_rate)?))
}

/// Constructs the local recognizer for the model directory at `path`.
///
/// Without the `local-vosk` feature there is no engine to construct; the
/// model path is still validated so selection errors surface first.
#[cfg(not(feature = "local-vosk"))]
pub fn local_recognizer(path: &Path, _sample_rate: u32) -> Result<Box<dyn Recognizer>> {
    if !path.is_dir() {
        return Err(SpeechError::ModelNotFound(path.to_path_buf()));
    }
    Err(SpeechError::EngineUnavailable)
}
