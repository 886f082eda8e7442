//! Local Vosk recognition.
//!
//! Wraps the Vosk engine behind the [`Recognizer`](crate::Recognizer)
//! trait. The model directory is loaded once at construction and the
//! engine keeps all utterance segmentation state internally.

use std::path::Path;

use tracing::info;
use vosk::{CompleteResult, DecodingState, Model};

use crate::{Result, SpeechError};

/// Recognizer backed by a Vosk model directory.
pub struct VoskRecognizer {
    inner: vosk::Recognizer,
}

impl VoskRecognizer {
    /// Loads the model at `model_dir` and binds a recognizer to the given
    /// sample rate.
    pub fn new(model_dir: &Path, sample_rate: u32) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(SpeechError::ModelNotFound(model_dir.to_path_buf()));
        }

        let path = model_dir
            .to_str()
            .ok_or_else(|| SpeechError::Engine("invalid model path".to_string()))?;

        info!(path = ?model_dir, "Loading speech model");
        let model = Model::new(path).ok_or_else(|| {
            SpeechError::Engine(format!("failed to load model from {:?}", model_dir))
        })?;
        let inner = vosk::Recognizer::new(&model, sample_rate as f32)
            .ok_or_else(|| SpeechError::Engine("failed to construct recognizer".to_string()))?;
        info!("Speech model loaded");

        Ok(Self { inner })
    }
}

impl crate::Recognizer for VoskRecognizer {
    fn accept(&mut self, block: &[i16]) -> Option<String> {
        match self.inner.accept_waveform(block) {
            DecodingState::Finalized => match self.inner.result() {
                CompleteResult::Single(result) if !result.text.is_empty() => {
                    Some(result.text.to_string())
                }
                _ => None,
            },
            DecodingState::Running | DecodingState::Failed => None,
        }
    }

    fn name(&self) -> &str {
        "vosk"
    }
}
