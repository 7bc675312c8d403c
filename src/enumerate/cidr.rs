use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use if_addrs::{get_if_addrs, IfAddr};
use ipnet::{IpNet, Ipv4Net};

use crate::error::{Result, ScanError};

/// Parse an `address/prefix` string. Host bits may be set; they are masked off
/// when iterating.
pub fn parse_cidr(spec: &str) -> Result<IpNet> {
    let s = spec.trim();
    if !s.contains('/') {
        return Err(ScanError::InvalidSpecification(format!(
            "{s}: expected address/prefix"
        )));
    }
    s.parse::<IpNet>()
        .map_err(|e| ScanError::InvalidSpecification(format!("{s}: {e}")))
}

/// Number of addresses covered by the network, saturating at `u128::MAX`.
pub fn address_count(net: &IpNet) -> u128 {
    let host_bits = u32::from(net.max_prefix_len() - net.prefix_len());
    1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
}

/// Number of addresses [`expand_hosts`] returns for this network.
pub fn host_count(net: &IpNet) -> u128 {
    let total = address_count(net);
    if total > 2 {
        total - 2
    } else {
        total
    }
}

/// Big-endian, carry-propagating increment. Returns `false` once every byte
/// has wrapped back to zero.
pub fn increment(octets: &mut [u8]) -> bool {
    for b in octets.iter_mut().rev() {
        *b = b.wrapping_add(1);
        if *b != 0 {
            return true;
        }
    }
    false
}

/// Lazily walks every address of a network, starting at the masked network
/// address, until the address leaves the network.
#[derive(Debug, Clone)]
pub struct AddressIter {
    net: IpNet,
    next: Option<IpAddr>,
}

impl AddressIter {
    pub fn new(net: IpNet) -> Self {
        Self {
            next: Some(net.network()),
            net,
        }
    }
}

impl Iterator for AddressIter {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        let current = self.next.take()?;
        if !self.net.contains(&current) {
            return None;
        }
        self.next = step(current);
        Some(current)
    }
}

fn step(addr: IpAddr) -> Option<IpAddr> {
    match addr {
        IpAddr::V4(v4) => {
            let mut o = v4.octets();
            increment(&mut o).then(|| IpAddr::V4(Ipv4Addr::from(o)))
        }
        IpAddr::V6(v6) => {
            let mut o = v6.octets();
            increment(&mut o).then(|| IpAddr::V6(Ipv6Addr::from(o)))
        }
    }
}

/// Expand a network into host addresses.
///
/// When the network holds more than two addresses, the network (all-zero) and
/// broadcast (all-ones) addresses are left out; /31 and /32 return everything.
pub fn expand_hosts(net: &IpNet) -> Vec<IpAddr> {
    let total = address_count(net);
    let iter = AddressIter::new(*net);
    if total > 2 {
        let hosts = usize::try_from(total - 2).unwrap_or(usize::MAX);
        iter.skip(1).take(hosts).collect()
    } else {
        iter.collect()
    }
}

/// Parse a CIDR and expand it, refusing to generate more than `cap` hosts.
pub fn expand_cidr(spec: &str, cap: Option<usize>) -> Result<Vec<IpAddr>> {
    let net = parse_cidr(spec)?;
    let count = host_count(&net);
    if let Some(limit) = cap {
        if count > limit as u128 {
            return Err(ScanError::ResourceExhaustion { count, limit });
        }
    }
    Ok(expand_hosts(&net))
}

/// Detect local non-loopback IPv4 addresses and convert each to a default /24
/// network. Duplicates are removed; output is sorted.
pub fn detect_local_cidrs() -> anyhow::Result<Vec<IpNet>> {
    let mut set = HashSet::<Ipv4Net>::new();
    for iface in get_if_addrs()? {
        if let IfAddr::V4(v4) = iface.addr {
            if v4.ip.is_loopback() {
                continue;
            }
            set.insert(ipv4_to_default_cidr(v4.ip));
        }
    }
    let mut nets: Vec<Ipv4Net> = set.into_iter().collect();
    nets.sort_by_key(|n| (u32::from(n.network()), n.prefix_len()));
    Ok(nets.into_iter().map(IpNet::V4).collect())
}

/// `192.168.1.42` becomes `192.168.1.0/24`.
pub fn ipv4_to_default_cidr(ip: Ipv4Addr) -> Ipv4Net {
    let o = ip.octets();
    Ipv4Net::new(Ipv4Addr::new(o[0], o[1], o[2], 0), 24).expect("/24 is always valid")
}
