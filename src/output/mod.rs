pub mod status;
pub mod vulnerable;

pub use status::{StatusKind, StatusPrinter};
pub use vulnerable::VulnerableSet;
