use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::output::{StatusKind, StatusPrinter};
use crate::probe::ScanOutcome;
use crate::scan::progress::ProgressState;

/// Result notification sent by a worker after each probe.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub url: String,
    pub outcome: ScanOutcome,
}

/// Spawn the task that prints worker events and redraws the progress line every `interval`.
/// It only reads `progress`. Ends once every event sender is dropped.
pub fn spawn_reporter(
    progress: Arc<ProgressState>,
    printer: StatusPrinter,
    mut rx: mpsc::Receiver<ScanEvent>,
    interval: Duration,
    draw: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bar = if draw {
            ProgressBar::new(progress.total() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{msg}") {
            bar.set_style(style);
        }
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                ev = rx.recv() => match ev {
                    Some(ev) => bar.suspend(|| print_event(&printer, &ev)),
                    None => break,
                },
                _ = tick.tick() => {
                    let snap = progress.snapshot();
                    bar.set_position(snap.processed as u64);
                    bar.set_message(snap.render());
                }
            }
        }

        let snap = progress.snapshot();
        tracing::debug!("{}", snap);
        bar.finish_and_clear();
    })
}

fn print_event(printer: &StatusPrinter, ev: &ScanEvent) {
    match &ev.outcome {
        ScanOutcome::Vulnerable => printer.vulnerable(&ev.url),
        ScanOutcome::NotVulnerable => printer.emit(StatusKind::NotVulnerable, &ev.url, false),
        ScanOutcome::Error(e) => printer.emit(StatusKind::Error, &format!("{} {}", ev.url, e), false),
    }
}
