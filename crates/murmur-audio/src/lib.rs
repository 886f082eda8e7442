//! Module for microphone capture. There can only be one active capture at
//! a time; the capture thread owns the input stream, the bounded block
//! queue, and the recognizer, and reports back through events.

mod capture;

use cpal::traits::{DeviceTrait, HostTrait};
pub use capture::{BlockAssembler, Capture, CaptureEvent, CaptureHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Named input device is not present on the host
    #[error("input device not found: {0}")]
    DeviceNotFound(String),
    /// Device enumeration failed
    #[error("failed to enumerate input devices: {0}")]
    Devices(String),
    /// Build stream error
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    /// Play stream error
    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),
    /// Recognizer construction failed
    #[error(transparent)]
    Speech(#[from] murmur_speech::SpeechError),
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// A selectable input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    pub index: usize,
    pub name: String,
}

impl std::fmt::Display for InputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.index, self.name)
    }
}

/// Returns the available input devices of the default host.
pub fn input_devices() -> Result<Vec<InputDevice>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::Devices(e.to_string()))?;

    let mut out = Vec::new();
    for (index, device) in devices.enumerate() {
        let name = device.name().unwrap_or_else(|_| format!("device {}", index));
        out.push(InputDevice { index, name });
    }
    Ok(out)
}
