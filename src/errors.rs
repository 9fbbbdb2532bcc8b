use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a domain or the whole run.
///
/// Per-URL probe failures never show up here; they are folded into
/// [`crate::probe::ScanOutcome::Error`].
#[derive(Error, Debug)]
pub enum HunterError {
    #[error("please provide either the -d option or the -l option")]
    NoTargets,

    #[error("failed to read domain list {}: {source}", path.display())]
    TargetList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to open output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("scan interrupted by user")]
    Interrupted,
}

impl HunterError {
    /// Fatal errors end the whole batch; anything else only ends the current domain.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HunterError::OutputFile { .. })
    }
}
