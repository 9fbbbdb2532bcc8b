pub mod pool;
pub mod progress;
pub mod reporter;

pub use pool::{effective_workers, ScanPool, ScanSettings, ScanSummary};
pub use progress::{ProgressSnapshot, ProgressState};
pub use reporter::ScanEvent;
