//! Liveness probes against the local LLM server.

use std::fmt;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

/// Delay between consecutive probes of one endpoint.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(600);

/// Per-request probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Get,
    Post,
}

/// One health-check target.
#[derive(Debug, Clone)]
pub struct ProbeEndpoint {
    pub name: &'static str,
    pub method: ProbeMethod,
    pub url: String,
    pub body: Option<Value>,
}

/// The fixed set of endpoints probed for liveness.
pub fn default_endpoints(base_url: &str) -> Vec<ProbeEndpoint> {
    let base = base_url.trim_end_matches('/');
    vec![
        ProbeEndpoint {
            name: "Models",
            method: ProbeMethod::Get,
            url: format!("{base}/models"),
            body: None,
        },
        ProbeEndpoint {
            name: "Chat Completions",
            method: ProbeMethod::Post,
            url: format!("{base}/chat/completions"),
            body: Some(json!({"messages": [{"role": "user", "content": "Test"}]})),
        },
        ProbeEndpoint {
            name: "Completions",
            method: ProbeMethod::Post,
            url: format!("{base}/completions"),
            body: Some(json!({"prompt": "Test", "max_tokens": 5})),
        },
        ProbeEndpoint {
            name: "Embeddings",
            method: ProbeMethod::Post,
            url: format!("{base}/embeddings"),
            body: Some(json!({"input": "Test"})),
        },
    ]
}

/// Outcome of the most recent probe of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// No probe has completed yet.
    Pending,
    /// Last probe returned HTTP 200.
    Ok,
    /// Last probe failed; the message carries the cause.
    Error(String),
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Pending => write!(f, "Checking..."),
            ProbeStatus::Ok => write!(f, "OK"),
            ProbeStatus::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Issues one probe and classifies the outcome. HTTP 200 is ok; any other
/// status or a transport error is an error carrying the cause.
pub async fn probe(client: &reqwest::Client, endpoint: &ProbeEndpoint) -> ProbeStatus {
    debug!(name = endpoint.name, url = %endpoint.url, "Probing endpoint");

    let request = match endpoint.method {
        ProbeMethod::Get => client.get(&endpoint.url),
        ProbeMethod::Post => {
            let body = endpoint.body.clone().unwrap_or_else(|| json!({}));
            client.post(&endpoint.url).json(&body)
        }
    };

    match request.timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => classify_status(response.status().as_u16()),
        Err(e) => ProbeStatus::Error(e.to_string()),
    }
}

fn classify_status(status: u16) -> ProbeStatus {
    if status == 200 {
        ProbeStatus::Ok
    } else {
        ProbeStatus::Error(format!("status {status}"))
    }
}
