pub mod wayback;

pub use wayback::{ArchiveFetcher, RetryPolicy};
