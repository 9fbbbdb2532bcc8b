use ahash::AHashSet;
use anyhow::Result;
use reqwest::Client;
use std::time::Duration;

use crate::config::ArchiveConfig;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay after the failed attempt `attempt` (1-based): `base * 2^attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1) }
    }
}

/// Queries Wayback CDX endpoints for archived URLs of a domain.
pub struct ArchiveFetcher {
    client: Client,
    endpoints: Vec<String>,
    retry: RetryPolicy,
}

impl ArchiveFetcher {
    pub fn new(client: Client, endpoints: Vec<String>, retry: RetryPolicy) -> Self {
        Self { client, endpoints, retry }
    }

    pub fn from_config(client: Client, cfg: &ArchiveConfig) -> Self {
        let retry = RetryPolicy {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
        };
        Self::new(client, cfg.endpoints.clone(), retry)
    }

    /// Collect raw URLs from every endpoint. Endpoints that keep failing contribute nothing.
    pub async fn fetch(&self, domain: &str) -> Vec<String> {
        let mut all = AHashSet::new();
        for template in &self.endpoints {
            let endpoint = endpoint_url(template, domain);
            match self.fetch_with_retries(&endpoint).await {
                Ok(body) => {
                    let urls = parse_cdx_body(&body);
                    tracing::debug!(endpoint=%endpoint, count = urls.len(), "archive endpoint answered");
                    all.extend(urls);
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch {} after {} attempts: {}", endpoint, self.retry.max_attempts, e);
                }
            }
        }
        let mut out: Vec<String> = all.into_iter().collect();
        out.sort();
        out
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<String> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let wait = self.retry.delay_after(attempt);
                    tracing::debug!(attempt, wait_ms = wait.as_millis() as u64, error=%e, "archive fetch failed, backing off");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}

pub fn endpoint_url(template: &str, domain: &str) -> String {
    template.replace("{domain}", &urlencoding::encode(domain))
}

/// Parse a CDX response. JSON bodies are an array of rows whose first row is the
/// header; anything else is treated as whitespace-delimited URLs.
pub fn parse_cdx_body(body: &str) -> Vec<String> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('[') {
        return match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(v) => parse_cdx_json(&v),
            Err(e) => {
                tracing::debug!(error=%e, "discarding malformed CDX json");
                Vec::new()
            }
        };
    }
    body.split_whitespace().map(|s| s.to_string()).collect()
}

fn parse_cdx_json(v: &serde_json::Value) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(rows) = v.as_array() {
        for row in rows.iter().skip(1) {
            let cell = match row {
                serde_json::Value::Array(cells) => cells.first().and_then(|c| c.as_str()),
                other => other.as_str(),
            };
            if let Some(s) = cell {
                out.push(s.to_string());
            }
        }
    }
    out
}
