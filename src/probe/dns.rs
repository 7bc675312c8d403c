use std::net::IpAddr;
use std::time::Duration;

use tokio::net::lookup_host;
use tokio::time;

use super::Probe;
use crate::types::{Measurement, ProbeOutcome};

/// Resolve candidate hostnames through the system resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DnsProbe;

impl Probe<String> for DnsProbe {
    async fn probe(&self, candidate: String, timeout: Duration) -> ProbeOutcome {
        match resolve_host(&candidate, timeout).await {
            Ok(ips) => ProbeOutcome::positive(candidate, Measurement::Addresses { ips }),
            Err(e) => ProbeOutcome::negative(candidate, Some(e)),
        }
    }
}

/// `www` + `example.com` -> `www.example.com`.
pub fn qualify(word: &str, domain: &str) -> String {
    format!(
        "{}.{}",
        word.trim_end_matches('.'),
        domain.trim_start_matches('.')
    )
}

/// Resolve within `timeout` to a sorted, de-duplicated address set. An empty
/// answer counts as a failure.
pub async fn resolve_host(hostname: &str, timeout: Duration) -> Result<Vec<IpAddr>, String> {
    match time::timeout(timeout, lookup_host((hostname, 0))).await {
        Ok(Ok(addrs)) => {
            let mut ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
            ips.sort();
            ips.dedup();
            if ips.is_empty() {
                Err(format!("{hostname}: no addresses"))
            } else {
                Ok(ips)
            }
        }
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!(
            "{hostname}: lookup timed out after {}ms",
            timeout.as_millis()
        )),
    }
}
