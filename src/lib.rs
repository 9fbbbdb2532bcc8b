pub mod concurrent;
pub mod config;
pub mod errors;
pub mod filter;
pub mod gather;
pub mod http_client;
pub mod output;
pub mod probe;
pub mod scan;
pub mod utils;

// re-export the types integration tests and the binary reach for
pub use crate::errors::HunterError;
pub use crate::filter::{CandidateUrl, Normalizer};
