//! Presentation shell: widget layout and user-action wiring.
//!
//! The shell owns all mutable application state. Background workers only
//! talk to it through channels, so the transcript buffer has exactly one
//! owner and read-and-clear on dump needs no locking. Every user action
//! is idempotent against rapid repeated clicks.

use std::path::Path;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use eframe::egui;
use murmur_audio::{Capture, CaptureEvent, CaptureHandle, InputDevice};
use murmur_core::{
    Config, ConfigManager, Countdown, DUMP_INTERVAL_SECS, MODEL_DIR, RECOGNIZED_PREFIX,
    SAMPLE_RATE,
};
use murmur_llm::{DEFAULT_BASE_URL, ProbeStatus, default_endpoints};
use tracing::error;

use crate::event::AppEvent;
use crate::logsink;
use crate::pipeline::LlmPipeline;

pub struct MurmurApp {
    config_manager: ConfigManager,

    devices: Vec<InputDevice>,
    models: Vec<String>,
    selected_device: usize,
    selected_model: usize,

    listening: bool,
    capture: Option<CaptureHandle>,
    capture_events: Option<Receiver<CaptureEvent>>,

    /// Accumulated finalized utterances awaiting the next dump.
    transcript: String,
    transcript_pane: String,
    response_pane: String,

    probe_rows: Vec<(&'static str, ProbeStatus)>,

    countdown: Countdown,
    last_tick: Instant,

    events: Receiver<AppEvent>,
    pipeline: LlmPipeline,
}

impl MurmurApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config_manager: ConfigManager,
        devices: Vec<InputDevice>,
        models: Vec<String>,
    ) -> anyhow::Result<Self> {
        // The loaded line is only emitted when a file was actually read.
        let config = match config_manager.try_load() {
            Some(config) => {
                logsink::log_line("Configuration loaded.");
                config
            }
            None => Config::default(),
        };

        // A saved selection that no longer exists falls back to the first
        // available entry.
        let selected_device = config
            .microphone()
            .and_then(|name| devices.iter().position(|d| d.name == name))
            .unwrap_or(0);
        let selected_model = config
            .model()
            .and_then(|name| models.iter().position(|m| m == name))
            .unwrap_or(0);

        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let pipeline = LlmPipeline::new(DEFAULT_BASE_URL, events_tx, cc.egui_ctx.clone())?;
        pipeline.spawn_probes();

        let probe_rows = default_endpoints(DEFAULT_BASE_URL)
            .iter()
            .map(|endpoint| (endpoint.name, ProbeStatus::Pending))
            .collect();

        let mut countdown = Countdown::new(DUMP_INTERVAL_SECS);
        countdown.start();

        Ok(Self {
            config_manager,
            devices,
            models,
            selected_device,
            selected_model,
            listening: false,
            capture: None,
            capture_events: None,
            transcript: String::new(),
            transcript_pane: String::new(),
            response_pane: String::new(),
            probe_rows,
            countdown,
            last_tick: Instant::now(),
            events: events_rx,
            pipeline,
        })
    }

    fn toggle_listening(&mut self) {
        if self.capture.is_some() {
            if self.listening {
                if let Some(capture) = &self.capture {
                    capture.stop();
                }
                self.listening = false;
                logsink::log_line("Stopping listening...");
            }
            // A previous capture is still winding down; nothing to do.
            return;
        }

        let Some(device) = self.devices.get(self.selected_device) else {
            error!("No input device selected");
            return;
        };
        let Some(model) = self.models.get(self.selected_model) else {
            error!("No model selected");
            return;
        };

        // The selection is persisted when listening starts.
        let config = Config {
            microphone: Some(device.name.clone()),
            model: Some(model.clone()),
        };
        match self.config_manager.save(&config) {
            Ok(()) => logsink::log_line("Configuration saved."),
            Err(e) => error!("Error saving config: {}", e),
        }

        let model_path = murmur_speech::model_path(Path::new(MODEL_DIR), model);
        let make_recognizer =
            Box::new(move || murmur_speech::local_recognizer(&model_path, SAMPLE_RATE));

        let (capture_tx, capture_rx) = crossbeam_channel::unbounded();
        self.capture = Some(Capture::spawn(
            device.name.clone(),
            make_recognizer,
            capture_tx,
        ));
        self.capture_events = Some(capture_rx);
        self.listening = true;
        logsink::log_line("Started listening.");
    }

    /// Dump: take the buffer if non-blank, submit it, reset the countdown.
    fn dump(&mut self) {
        let pipeline = &self.pipeline;
        perform_dump(&mut self.transcript, &mut self.countdown, |payload| {
            pipeline.submit_dump(payload)
        });
    }

    fn toggle_timer(&mut self) {
        if self.countdown.is_enabled() {
            self.countdown.disable();
            logsink::log_line("LLM dump timer disabled.");
        } else {
            self.countdown.enable();
            logsink::log_line("LLM dump timer enabled.");
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                AppEvent::LlmResponse(text) => {
                    self.response_pane.push_str("LLM Response: ");
                    self.response_pane.push_str(&text);
                    self.response_pane.push('\n');
                }
                AppEvent::Probe { index, status } => {
                    if let Some((_, slot)) = self.probe_rows.get_mut(index) {
                        *slot = status;
                    }
                }
            }
        }

        let pending: Vec<CaptureEvent> = match &self.capture_events {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for event in pending {
            match event {
                CaptureEvent::Utterance(text) => {
                    append_utterance(&mut self.transcript, &mut self.transcript_pane, &text);
                    logsink::log_line(&format!("{} {}", RECOGNIZED_PREFIX, text));
                }
                CaptureEvent::Stopped => {
                    // The thread has already exited, so dropping the handle
                    // joins it without waiting.
                    self.capture = None;
                    self.capture_events = None;
                    self.listening = false;
                }
            }
        }
    }

    fn tick_countdown(&mut self) {
        if !self.countdown.is_ticking() {
            self.last_tick = Instant::now();
            return;
        }
        while self.last_tick.elapsed() >= Duration::from_secs(1) {
            self.last_tick += Duration::from_secs(1);
            if self.countdown.tick() {
                self.dump();
            }
        }
    }
}

impl eframe::App for MurmurApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.tick_countdown();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Select Microphone:");
                let device_text = self
                    .devices
                    .get(self.selected_device)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| "none".to_string());
                egui::ComboBox::from_id_salt("microphone")
                    .selected_text(device_text)
                    .show_ui(ui, |ui| {
                        for (i, device) in self.devices.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_device, i, device.to_string());
                        }
                    });

                ui.label("Select Model:");
                let model_text = self
                    .models
                    .get(self.selected_model)
                    .cloned()
                    .unwrap_or_else(|| "none".to_string());
                egui::ComboBox::from_id_salt("model")
                    .selected_text(model_text)
                    .show_ui(ui, |ui| {
                        for (i, model) in self.models.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_model, i, model.clone());
                        }
                    });

                let listen_label = if self.listening {
                    "Stop Listening"
                } else {
                    "Start Listening"
                };
                if ui.button(listen_label).clicked() {
                    self.toggle_listening();
                }

                if ui.button("Manually Dump").clicked() {
                    self.dump();
                }

                let timer_label = if self.countdown.is_enabled() {
                    "Disable Timer"
                } else {
                    "Enable Timer"
                };
                if ui.button(timer_label).clicked() {
                    self.toggle_timer();
                }
            });

            if self.countdown.is_enabled() {
                ui.label(format!(
                    "Next dump in: {} seconds",
                    self.countdown.remaining()
                ));
            } else {
                ui.label("Timer disabled");
            }

            ui.separator();
            for (name, status) in &self.probe_rows {
                ui.horizontal(|ui| {
                    ui.label(format!("{}:", name));
                    ui.label(status.to_string());
                });
            }

            ui.separator();
            let pane_height = ui.available_height() / 2.0 - 12.0;
            egui::ScrollArea::vertical()
                .id_salt("transcript")
                .auto_shrink([false, false])
                .max_height(pane_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.label(&self.transcript_pane);
                });

            ui.separator();
            egui::ScrollArea::vertical()
                .id_salt("responses")
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.label(&self.response_pane);
                });
        });

        // The countdown and capture events are polled, so keep frames
        // coming while either is live.
        if self.countdown.is_ticking() || self.capture.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

/// Takes the dump payload, clearing the buffer, unless it is blank.
fn take_dump_payload(buffer: &mut String) -> Option<String> {
    if buffer.trim().is_empty() {
        None
    } else {
        Some(std::mem::take(buffer))
    }
}

/// Dump operation: hand the buffer to `submit` if non-blank (the buffer is
/// cleared before the call resolves), then reset the countdown either way.
fn perform_dump(buffer: &mut String, countdown: &mut Countdown, submit: impl FnOnce(String)) {
    if let Some(payload) = take_dump_payload(buffer) {
        submit(payload);
    }
    countdown.reset();
}

/// Appends a finalized utterance to the dump buffer and mirrors it to the
/// transcript pane.
fn append_utterance(buffer: &mut String, pane: &mut String, text: &str) {
    buffer.push_str(text);
    buffer.push('\n');
    pane.push_str(RECOGNIZED_PREFIX);
    pane.push(' ');
    pane.push_str(text);
    pane.push('\n');
}
