//! One entry point per tool: enumerate, guard, schedule.
//!
//! Run-level problems (bad spec, too many or zero candidates) come back as
//! [`ScanError`] before any probe starts. Everything that goes wrong per
//! candidate is inside the returned [`ScanResults`].

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::ToolConfig;
use crate::enumerate::{cidr, ports, wordlist};
use crate::error::{Result, ScanError};
use crate::probe::{dns, DnsProbe, HostProbe, PathProbe, PortProbe, Probe};
use crate::scheduler::run_bounded;
use crate::types::{ProbeOutcome, ScanResults};

/// TCP reachability sweep of every host in a CIDR (port 80, falling back to 443).
pub async fn sweep(spec: &str, cfg: &ToolConfig) -> Result<ScanResults> {
    sweep_with(spec, cfg, HostProbe::sweep()).await
}

/// Sweep with a caller-chosen host probe.
pub async fn sweep_with<P: Probe<IpAddr>>(
    spec: &str,
    cfg: &ToolConfig,
    probe: P,
) -> Result<ScanResults> {
    let hosts = cidr::expand_cidr(spec, cfg.max_candidates)?;
    let hosts = guard(spec, hosts, cfg)?;
    info!(network = spec, hosts = hosts.len(), "sweeping subnet");
    Ok(run_bounded(spec.trim(), hosts, Arc::new(probe), cfg.into()).await)
}

/// Connect scan of `host` over a port spec, or the default ports when `spec`
/// is `None`.
pub async fn scan_ports(host: &str, spec: Option<&str>, cfg: &ToolConfig) -> Result<ScanResults> {
    let candidates = match spec {
        Some(s) => ports::parse_port_spec(s),
        None => ports::default_ports(),
    };
    scan_port_list(host, candidates, cfg).await
}

/// Connect scan of `host` over an already-enumerated port list.
pub async fn scan_port_list(
    host: &str,
    port_list: Vec<u16>,
    cfg: &ToolConfig,
) -> Result<ScanResults> {
    let host = validate_name(host)?;
    let candidates = guard(host, port_list, cfg)?;
    info!(host, ports = candidates.len(), "scanning ports");
    Ok(run_bounded(host, candidates, Arc::new(PortProbe::new(host)), cfg.into()).await)
}

/// Look for paths under `base_url` from a wordlist (or the built-in list).
pub async fn bust_dirs(
    base_url: &str,
    wordlist_path: Option<&Path>,
    cfg: &ToolConfig,
) -> Result<ScanResults> {
    let probe = PathProbe::new(base_url.trim())?;
    bust_dirs_with(probe, wordlist_path, cfg).await
}

/// Directory bust through an already-configured probe (custom client, proxy
/// settings and so on).
pub async fn bust_dirs_with(
    probe: PathProbe,
    wordlist_path: Option<&Path>,
    cfg: &ToolConfig,
) -> Result<ScanResults> {
    let words = wordlist::load_wordlist(wordlist_path, wordlist::DEFAULT_PATHS);
    let words = guard(probe.base(), words, cfg)?;
    info!(base = probe.base(), paths = words.len(), "probing paths");
    Ok(run_bounded(probe.base().to_owned(), words, Arc::new(probe), cfg.into()).await)
}

/// Resolve `<word>.<domain>` for every word of a wordlist (or the built-in list).
pub async fn brute_subdomains(
    domain: &str,
    wordlist_path: Option<&Path>,
    cfg: &ToolConfig,
) -> Result<ScanResults> {
    let domain = validate_name(domain)?;
    let hostnames: Vec<String> =
        wordlist::load_wordlist(wordlist_path, wordlist::DEFAULT_SUBDOMAINS)
            .iter()
            .map(|w| dns::qualify(w, domain))
            .collect();
    let hostnames = guard(domain, hostnames, cfg)?;
    info!(domain, names = hostnames.len(), "resolving subdomains");
    Ok(run_bounded(domain, hostnames, Arc::new(DnsProbe), cfg.into()).await)
}

/// Single-host TCP ping on `port`, falling back to 80.
pub async fn ping(host: &str, port: u16, cfg: &ToolConfig) -> Result<ProbeOutcome> {
    let host = validate_name(host)?;
    if port == 0 {
        return Err(ScanError::InvalidSpecification("port 0".into()));
    }
    Ok(HostProbe::ping(port)
        .probe(host.to_owned(), cfg.timeout())
        .await)
}

/// Resolve one hostname. A bare label gets `.domain` appended when a domain is
/// given.
pub async fn resolve(host: &str, domain: Option<&str>, cfg: &ToolConfig) -> Result<ProbeOutcome> {
    let host = validate_name(host)?;
    let name = match domain {
        Some(d) if !host.contains('.') => dns::qualify(host, validate_name(d)?),
        _ => host.to_owned(),
    };
    Ok(DnsProbe.probe(name, cfg.timeout()).await)
}

fn guard<T>(subject: &str, candidates: Vec<T>, cfg: &ToolConfig) -> Result<Vec<T>> {
    if candidates.is_empty() {
        return Err(ScanError::EmptyCandidateSet(subject.trim().to_owned()));
    }
    if let Some(limit) = cfg.max_candidates {
        if candidates.len() > limit {
            return Err(ScanError::ResourceExhaustion {
                count: candidates.len() as u128,
                limit,
            });
        }
    }
    Ok(candidates)
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) || name.contains('/') {
        return Err(ScanError::InvalidSpecification(format!(
            "{name:?} is not a host name"
        )));
    }
    Ok(name)
}
