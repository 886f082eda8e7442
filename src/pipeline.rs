//! Background HTTP work: transcript dumps and endpoint probes.
//!
//! The pipeline owns a small tokio runtime so neither kind of call ever
//! runs on the UI thread. Dumps are fire-and-forget: the buffer was
//! already cleared by the caller, so a failed call only produces the
//! fixed error string in the response pane.

use crossbeam_channel::Sender;
use eframe::egui;
use murmur_llm::{LlmClient, PROBE_INTERVAL, default_endpoints, probe};
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::event::AppEvent;

/// Fixed string surfaced in the response pane when a dump fails.
pub const DUMP_ERROR_TEXT: &str = "Error in LLM API request.";

pub struct LlmPipeline {
    runtime: Runtime,
    http: reqwest::Client,
    client: LlmClient,
    events: Sender<AppEvent>,
    ctx: egui::Context,
}

impl LlmPipeline {
    /// Create a new pipeline instance against the given base URL.
    pub fn new(
        base_url: &str,
        events: Sender<AppEvent>,
        ctx: egui::Context,
    ) -> anyhow::Result<Self> {
        // Set up tokio runtime
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        let http = reqwest::Client::new();
        let client = LlmClient::with_base_url(http.clone(), base_url);

        Ok(Self {
            runtime,
            http,
            client,
            events,
            ctx,
        })
    }

    fn post(events: &Sender<AppEvent>, ctx: &egui::Context, event: AppEvent) {
        events.send(event).ok();
        ctx.request_repaint();
    }

    /// Submits a dumped transcript for extraction. Non-blocking; the
    /// result arrives later as an [`AppEvent::LlmResponse`].
    pub fn submit_dump(&self, transcript: String) {
        info!(bytes = transcript.len(), "Dumping transcript to LLM");

        let client = self.client.clone();
        let events = self.events.clone();
        let ctx = self.ctx.clone();

        self.runtime.spawn(async move {
            let text = match client.extract(transcript).await {
                Ok(content) => {
                    info!("Useful information extracted:\n{}", content);
                    content
                }
                Err(e) => {
                    error!("Error sending to LLM: {}", e);
                    DUMP_ERROR_TEXT.to_string()
                }
            };
            Self::post(&events, &ctx, AppEvent::LlmResponse(text));
        });
    }

    /// Starts one probe loop per endpoint. Each loop probes, publishes
    /// the result, then sleeps out the probe interval; cycles of one
    /// endpoint are strictly sequential and independent of the others.
    pub fn spawn_probes(&self) {
        for (index, endpoint) in default_endpoints(self.client.base_url())
            .into_iter()
            .enumerate()
        {
            let http = self.http.clone();
            let events = self.events.clone();
            let ctx = self.ctx.clone();

            self.runtime.spawn(async move {
                loop {
                    let status = probe(&http, &endpoint).await;
                    Self::post(&events, &ctx, AppEvent::Probe { index, status });
                    tokio::time::sleep(PROBE_INTERVAL).await;
                }
            });
        }
    }
}
