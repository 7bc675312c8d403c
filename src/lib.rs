//! Library crate for recon-scan-rs: bounded-concurrency probe engine plus the
//! enumerators and probes each recon tool is built from.
pub mod config;
pub mod enumerate;
pub mod error;
pub mod probe;
pub mod recon;
pub mod scheduler;
pub mod summary;
pub mod types;

pub use error::{Result, ScanError};
pub use scheduler::{run_bounded, ResultCollector, RunOptions};
pub use types::{Measurement, ProbeOutcome, ScanResults, Summary};
