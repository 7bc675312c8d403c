//! Probe functions: classify one candidate within a timeout.
use std::future::Future;
use std::time::Duration;

use crate::types::ProbeOutcome;

pub mod dns;
pub mod http;
pub mod tcp;

pub use dns::DnsProbe;
pub use http::PathProbe;
pub use tcp::{HostProbe, PortProbe};

/// A bounded-time network check over candidates of type `C`.
///
/// Implementations always return an outcome: failures become negative outcomes
/// carrying error text, and nothing may run much past `timeout`.
pub trait Probe<C>: Send + Sync + 'static {
    fn probe(&self, candidate: C, timeout: Duration) -> impl Future<Output = ProbeOutcome> + Send;
}
