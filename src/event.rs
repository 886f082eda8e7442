//! Application events delivered from background workers to the shell.

use murmur_llm::ProbeStatus;

/// Events drained by the shell on every frame.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A dump round trip finished: the extracted content, or the fixed
    /// error string when the call failed
    LlmResponse(String),
    /// A probe cycle finished for the endpoint at `index`
    Probe { index: usize, status: ProbeStatus },
}
