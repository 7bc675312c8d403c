use std::net::{IpAddr, SocketAddr};

use ::time::{format_description::well_known, OffsetDateTime};
use serde::{Deserialize, Serialize};

/// What a positive (or partially successful) probe measured.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    /// TCP connect round-trip time and the peer that accepted the connection.
    Rtt { ms: u64, peer: Option<SocketAddr> },
    /// HTTP status code and response content length, if the server sent one.
    Http { status: u16, size: Option<u64> },
    /// Addresses a hostname resolved to.
    Addresses { ips: Vec<IpAddr> },
}

/// Result of probing one candidate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub target: String,
    pub positive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl ProbeOutcome {
    pub fn positive(target: impl Into<String>, measurement: Measurement) -> Self {
        Self {
            target: target.into(),
            positive: true,
            measurement: Some(measurement),
            error: None,
            timestamp: now_rfc3339(),
        }
    }

    pub fn negative(target: impl Into<String>, error: Option<String>) -> Self {
        Self {
            target: target.into(),
            positive: false,
            measurement: None,
            error,
            timestamp: now_rfc3339(),
        }
    }

    /// Attach a measurement to a negative outcome (e.g. a 404 status).
    pub fn with_measurement(mut self, measurement: Measurement) -> Self {
        self.measurement = Some(measurement);
        self
    }

    /// Round-trip time in milliseconds, if this was a connect probe.
    pub fn rtt_ms(&self) -> Option<u64> {
        match self.measurement {
            Some(Measurement::Rtt { ms, .. }) => Some(ms),
            _ => None,
        }
    }

    /// HTTP status code, if this was an HTTP probe that got a response.
    pub fn status(&self) -> Option<u16> {
        match self.measurement {
            Some(Measurement::Http { status, .. }) => Some(status),
            _ => None,
        }
    }
}

/// Every outcome of one run.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanResults {
    pub subject: String,
    pub scanned_total: u64,
    pub elapsed_ms: u64,
    pub entries: Vec<ProbeOutcome>,
}

/// Aggregate view over a finished [`ScanResults`].
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Summary {
    pub subject: String,
    pub total: u64,
    pub positive: u64,
    pub negative: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops_per_sec: Option<f64>,
    pub positives: Vec<ProbeOutcome>,
}

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
