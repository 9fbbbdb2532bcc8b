use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::concurrent::WorkQueue;
use crate::errors::HunterError;
use crate::filter::CandidateUrl;
use crate::http_client::create_client;
use crate::output::{StatusPrinter, VulnerableSet};
use crate::probe::{Prober, ScanOutcome};
use crate::scan::progress::ProgressState;
use crate::scan::reporter::{spawn_reporter, ScanEvent};

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub workers: usize,
    pub marker: String,
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub progress_interval: Duration,
    pub draw_progress: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            marker: crate::config::DEFAULT_PLACEHOLDER.to_string(),
            timeout: Duration::from_secs(20),
            proxy: None,
            progress_interval: Duration::from_secs(1),
            draw_progress: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub total: usize,
    pub processed: usize,
    pub workers: usize,
    pub errors: usize,
    pub vulnerable: Vec<String>,
    pub interrupted: bool,
    pub elapsed: Duration,
}

/// Never more workers than items, and at least one when there is work.
pub fn effective_workers(requested: usize, candidates: usize) -> usize {
    requested.max(1).min(candidates)
}

/// Fixed-size pool of probe workers sharing one queue and one result set.
pub struct ScanPool {
    settings: ScanSettings,
    vulnerable: Arc<VulnerableSet>,
    printer: StatusPrinter,
    cancel: CancellationToken,
}

impl ScanPool {
    pub fn new(
        settings: ScanSettings,
        vulnerable: Arc<VulnerableSet>,
        printer: StatusPrinter,
        cancel: CancellationToken,
    ) -> Self {
        Self { settings, vulnerable, printer, cancel }
    }

    pub async fn run(&self, candidates: Vec<CandidateUrl>) -> Result<ScanSummary, HunterError> {
        let started = Instant::now();
        let total = candidates.len();
        if total == 0 {
            self.printer.info("No URLs with parameters to scan.");
            return Ok(ScanSummary::default());
        }
        let workers = effective_workers(self.settings.workers, total);

        // build every client up front so a bad proxy fails before any probe goes out
        let mut probers = Vec::with_capacity(workers);
        for _ in 0..workers {
            let client = create_client(self.settings.timeout, self.settings.proxy.as_deref())?;
            probers.push(Prober::new(client, self.settings.marker.clone()));
        }

        self.printer
            .detail(&format!("Starting scan on {} URLs with query parameters...", total));
        tracing::info!(total, workers, "starting probe phase");

        let queue = WorkQueue::from_items(candidates);
        queue.close();
        let progress = Arc::new(ProgressState::new(total));
        let errors = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel::<ScanEvent>(1024);
        let reporter = spawn_reporter(
            progress.clone(),
            self.printer,
            rx,
            self.settings.progress_interval,
            self.settings.draw_progress,
        );

        let mut set = JoinSet::new();
        for (id, prober) in probers.into_iter().enumerate() {
            let worker = Worker {
                id,
                queue: queue.clone(),
                prober,
                vulnerable: self.vulnerable.clone(),
                progress: progress.clone(),
                errors: errors.clone(),
                events: tx.clone(),
                cancel: self.cancel.clone(),
            };
            set.spawn(worker.run());
        }
        drop(tx);

        tokio::select! {
            _ = queue.wait_until_drained() => {}
            _ = self.cancel.cancelled() => {
                tracing::warn!(pending = queue.pending(), "scan cancelled, waiting for in-flight probes");
            }
        }
        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                tracing::error!(error=%e, "scan worker failed");
            }
        }
        if let Err(e) = reporter.await {
            tracing::error!(error=%e, "progress reporter failed");
        }

        let processed = progress.processed();
        Ok(ScanSummary {
            total,
            processed,
            workers,
            errors: errors.load(Ordering::SeqCst),
            vulnerable: self.vulnerable.snapshot(),
            interrupted: self.cancel.is_cancelled(),
            elapsed: started.elapsed(),
        })
    }
}

struct Worker {
    id: usize,
    queue: Arc<WorkQueue<CandidateUrl>>,
    prober: Prober,
    vulnerable: Arc<VulnerableSet>,
    progress: Arc<ProgressState>,
    errors: Arc<AtomicUsize>,
    events: mpsc::Sender<ScanEvent>,
    cancel: CancellationToken,
}

/// Counts the item as processed when dropped, including on unwind.
struct Processed<'a>(&'a ProgressState);

impl Drop for Processed<'_> {
    fn drop(&mut self) {
        self.0.record();
    }
}

impl Worker {
    async fn run(self) {
        loop {
            let ticket = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = self.queue.pop() => match next {
                    Some(t) => t,
                    None => break,
                },
            };
            // declared after `ticket` so it drops first: count, then acknowledge
            let _processed = Processed(self.progress.as_ref());

            let url = ticket.as_str();
            let outcome = self.prober.probe_url(url).await;
            match &outcome {
                ScanOutcome::Vulnerable => {
                    if self.vulnerable.insert(url) {
                        tracing::debug!(worker = self.id, url, "new vulnerable url");
                    }
                }
                ScanOutcome::NotVulnerable => {}
                ScanOutcome::Error(e) => {
                    self.errors.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(worker = self.id, url, error=%e, "probe failed");
                }
            }
            if let Err(e) = self.events.send(ScanEvent { url: url.to_string(), outcome }).await {
                tracing::debug!(worker = self.id, url, error=%e, "progress reporter gone, event dropped");
            }
        }
        tracing::debug!(worker = self.id, "worker exiting");
    }
}
