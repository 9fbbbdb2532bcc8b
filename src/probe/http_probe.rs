use reqwest::Client;
use std::fmt;

/// Classification of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Vulnerable,
    NotVulnerable,
    Error(String),
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanOutcome::Vulnerable => f.write_str("vulnerable"),
            ScanOutcome::NotVulnerable => f.write_str("not vulnerable"),
            ScanOutcome::Error(e) => write!(f, "error: {}", e),
        }
    }
}

/// Reflection is a literal substring match, nothing more.
pub fn classify_body(body: &str, marker: &str) -> ScanOutcome {
    if body.contains(marker) {
        ScanOutcome::Vulnerable
    } else {
        ScanOutcome::NotVulnerable
    }
}

/// Issues single GET probes and looks for the marker in the response body.
#[derive(Clone)]
pub struct Prober {
    client: Client,
    marker: String,
}

impl Prober {
    pub fn new(client: Client, marker: impl Into<String>) -> Self {
        Self { client, marker: marker.into() }
    }

    /// One attempt, no retry. Transport and body-read failures become `Error`.
    pub async fn probe_url(&self, url: &str) -> ScanOutcome {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return ScanOutcome::Error(e.to_string()),
        };
        match resp.text().await {
            Ok(body) => classify_body(&body, &self.marker),
            Err(e) => ScanOutcome::Error(e.to_string()),
        }
    }
}
