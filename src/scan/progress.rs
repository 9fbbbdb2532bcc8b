use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const BAR_CELLS: usize = 30;

/// Shared scan counters. Workers call [`ProgressState::record`]; everyone else only reads.
pub struct ProgressState {
    processed: AtomicUsize,
    total: usize,
    started: Instant,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self { processed: AtomicUsize::new(0), total, started: Instant::now() }
    }

    /// Count one finished item. Returns the new processed count.
    pub fn record(&self) -> usize {
        self.processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            processed: self.processed(),
            total: self.total,
            elapsed: self.started.elapsed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total as f64 * 100.0
    }

    /// `None` until the first item finishes.
    pub fn eta(&self) -> Option<Duration> {
        if self.processed == 0 {
            return None;
        }
        let per_item = self.elapsed.as_secs_f64() / self.processed as f64;
        let remaining = self.total.saturating_sub(self.processed) as f64;
        Some(Duration::from_secs_f64(per_item * remaining))
    }

    pub fn render(&self) -> String {
        let filled = if self.total == 0 {
            BAR_CELLS
        } else {
            (BAR_CELLS * self.processed / self.total).min(BAR_CELLS)
        };
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled));
        let eta = match self.eta() {
            Some(d) => format!("ETA: {}s", d.as_secs()),
            None => "ETA: calculating...".to_string(),
        };
        format!(
            "Progress: [{}] {:.1}% ({}/{}) | {}",
            bar,
            self.percentage(),
            self.processed,
            self.total,
            eta
        )
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(processed: usize, total: usize, secs: u64) -> ProgressSnapshot {
        ProgressSnapshot { processed, total, elapsed: Duration::from_secs(secs) }
    }

    #[test]
    fn eta_is_calculating_before_first_item() {
        let s = snap(0, 10, 5);
        assert_eq!(s.eta(), None);
        assert!(s.render().ends_with("ETA: calculating..."));
        assert_eq!(s.percentage(), 0.0);
    }

    #[test]
    fn eta_extrapolates_elapsed_time() {
        let s = snap(4, 10, 8);
        assert_eq!(s.eta(), Some(Duration::from_secs(12)));
        assert_eq!(s.percentage(), 40.0);
        let line = s.render();
        assert!(line.contains("40.0% (4/10)"), "{}", line);
        assert!(line.ends_with("ETA: 12s"), "{}", line);
        assert_eq!(line.matches('█').count(), 12);
        assert_eq!(line.matches('░').count(), 18);
    }

    #[test]
    fn empty_scan_is_complete() {
        let s = snap(0, 0, 0);
        assert_eq!(s.percentage(), 100.0);
        assert_eq!(s.render().matches('█').count(), BAR_CELLS);
    }

    #[test]
    fn record_is_monotonic() {
        let p = ProgressState::new(3);
        assert_eq!(p.record(), 1);
        assert_eq!(p.record(), 2);
        let s = p.snapshot();
        assert_eq!((s.processed, s.total), (2, 3));
    }
}
