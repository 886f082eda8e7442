use std::path::Path;

use anyhow::{Result, bail};
use murmur::app::MurmurApp;
use murmur::logsink;
use murmur::{APP_NAME_PRETTY, ConfigManager};
use murmur_core::MODEL_DIR;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    // Initialize the logger
    let config_manager = ConfigManager::new()?;
    logsink::init(&config_manager.log_path())?;
    info!(version = murmur::VERSION, "Starting {}", APP_NAME_PRETTY);

    // Enumerate input devices. None available is survivable; the user
    // can still watch probe results.
    let devices = match murmur_audio::input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Failed to enumerate input devices: {}", e);
            Vec::new()
        }
    };
    for device in &devices {
        info!("Found input device: {}", device);
    }

    // No models means nothing can ever be recognized, so refuse to start.
    let models = match murmur_speech::list_models(Path::new(MODEL_DIR)) {
        Ok(models) => models,
        Err(e) => {
            error!("{}", e);
            bail!("{}", e);
        }
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([800.0, 750.0]),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME_PRETTY,
        options,
        Box::new(move |cc| Ok(Box::new(MurmurApp::new(cc, config_manager, devices, models)?))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application window: {e}"))?;

    info!("Shutting down");
    Ok(())
}
