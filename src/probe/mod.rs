pub mod http_probe;

pub use http_probe::{classify_body, Prober, ScanOutcome};
