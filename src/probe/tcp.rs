use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{self, Instant};
use tracing::trace;

use super::Probe;
use crate::types::{Measurement, ProbeOutcome};

/// Connect-based reachability check for a host.
///
/// If the primary port refuses or times out and a fallback port is set, the
/// fallback is tried once before the host is declared unreachable. This is a
/// "does anything answer" heuristic, not a retry: the `peer` in the outcome's
/// measurement tells which port actually accepted. With a fallback configured
/// a probe can take up to twice `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostProbe {
    pub port: u16,
    pub fallback_port: Option<u16>,
}

impl HostProbe {
    pub const fn new(port: u16) -> Self {
        Self {
            port,
            fallback_port: None,
        }
    }

    pub const fn with_fallback(mut self, port: u16) -> Self {
        self.fallback_port = Some(port);
        self
    }

    /// Subnet sweep policy: port 80, then 443.
    pub const fn sweep() -> Self {
        Self::new(80).with_fallback(443)
    }

    /// Single-host ping policy: the requested port, then 80 unless that was
    /// the requested port already.
    pub fn ping(port: u16) -> Self {
        Self {
            port,
            fallback_port: (port != 80).then_some(80),
        }
    }

    async fn reach(&self, host: &str, timeout: Duration) -> ProbeOutcome {
        let result = match timed_connect((host, self.port), timeout).await {
            Ok(hit) => Ok(hit),
            Err(e) => match self.fallback_port {
                Some(fallback) => {
                    trace!(
                        host,
                        port = self.port,
                        fallback,
                        error = %e,
                        "primary port failed, trying fallback"
                    );
                    timed_connect((host, fallback), timeout)
                        .await
                        .map_err(|fe| format!("port {}: {e}; port {fallback}: {fe}", self.port))
                }
                None => Err(format!("port {}: {e}", self.port)),
            },
        };
        match result {
            Ok((ms, peer)) => ProbeOutcome::positive(host, Measurement::Rtt { ms, peer }),
            Err(e) => ProbeOutcome::negative(host, Some(e)),
        }
    }
}

impl Probe<IpAddr> for HostProbe {
    async fn probe(&self, candidate: IpAddr, timeout: Duration) -> ProbeOutcome {
        self.reach(&candidate.to_string(), timeout).await
    }
}

impl Probe<String> for HostProbe {
    async fn probe(&self, candidate: String, timeout: Duration) -> ProbeOutcome {
        self.reach(&candidate, timeout).await
    }
}

/// Connect check of one port on a fixed host. The outcome target is the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortProbe {
    pub host: String,
}

impl PortProbe {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Probe<u16> for PortProbe {
    async fn probe(&self, candidate: u16, timeout: Duration) -> ProbeOutcome {
        match timed_connect((self.host.as_str(), candidate), timeout).await {
            Ok((ms, peer)) => {
                ProbeOutcome::positive(candidate.to_string(), Measurement::Rtt { ms, peer })
            }
            Err(e) => ProbeOutcome::negative(candidate.to_string(), Some(e)),
        }
    }
}

/// Connect within `timeout`, returning the connect time in milliseconds and the
/// peer address. The stream is dropped straight away; no data is exchanged.
pub(crate) async fn timed_connect<A: ToSocketAddrs>(
    addr: A,
    timeout: Duration,
) -> Result<(u64, Option<SocketAddr>), String> {
    let start = Instant::now();
    match time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => {
            let ms = start.elapsed().as_millis() as u64;
            let peer = stream.peer_addr().ok();
            drop(stream);
            Ok((ms, peer))
        }
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}ms", timeout.as_millis())),
    }
}
