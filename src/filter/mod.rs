pub mod normalize;

pub use normalize::{CandidateUrl, Normalizer};
