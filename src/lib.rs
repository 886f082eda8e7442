// Re-export from sub-crates
pub use murmur_audio::{Capture, CaptureEvent, CaptureHandle, InputDevice};
pub use murmur_core::{
    APP_NAME, APP_NAME_PRETTY, Config, ConfigManager, Countdown, DEFAULT_LOG_LEVEL,
};
pub use murmur_llm::{LlmClient, ProbeStatus};

// App-specific modules
pub mod app;
pub mod event;
pub mod logsink;
pub mod pipeline;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
