// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member addresses and `host[port]` list parsing.
//!
//! A member address is an IP endpoint. Bootstrap lists use the `host[port]`
//! notation, comma-delimited:
//!
//! ```text
//! hostA[7800],10.1.2.3[7801],[::1][7802]
//! ```
//!
//! [`parse_comma_delimited_hosts`] expands every entry over a port span so a
//! joiner can probe several consecutive ports per host.

use std::fmt;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

// ============================================================================
// Address
// ============================================================================

/// One member endpoint: IP plus port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    ip: IpAddr,
    port: u16,
}

impl Address {
    #[must_use]
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    #[inline]
    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SocketAddr brackets IPv6 for us.
        write!(f, "{}", self.socket_addr())
    }
}

impl From<SocketAddr> for Address {
    fn from(sa: SocketAddr) -> Self {
        Self::new(sa.ip(), sa.port())
    }
}

impl FromStr for Address {
    type Err = HostParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SocketAddr>()
            .map(Self::from)
            .map_err(|_| HostParseError::InvalidAddress(s.to_string()))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failure to parse a host list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostParseError {
    /// Entry lacks the `[port]` suffix.
    MissingPort(String),
    /// Port part is not a valid u16.
    InvalidPort(String),
    /// Hostname resolved to no address.
    UnknownHost(String),
    /// Not a parsable `ip:port` endpoint.
    InvalidAddress(String),
}

impl fmt::Display for HostParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPort(entry) => {
                write!(f, "host entry {:?} lacks a [port] suffix", entry)
            }
            Self::InvalidPort(entry) => {
                write!(f, "host entry {:?} has an unparsable port", entry)
            }
            Self::UnknownHost(host) => write!(f, "unknown host {:?}", host),
            Self::InvalidAddress(s) => write!(f, "invalid address {:?}", s),
        }
    }
}

impl std::error::Error for HostParseError {}

// ============================================================================
// Parsing
// ============================================================================

/// Parse `host[port]` entries, expanding each host over `max(1, port_range)`
/// consecutive ports starting at the declared one.
///
/// Blank entries are skipped. Ports past 65535 are clamped off the end of a
/// host's span. Duplicate endpoints are kept as declared.
pub fn parse_comma_delimited_hosts(
    raw: &str,
    port_range: i32,
) -> Result<Vec<Address>, HostParseError> {
    let span = port_range.max(1) as u32;
    let mut out = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (ip, base) = resolve_entry(entry)?;
        for offset in 0..span {
            match u16::try_from(u32::from(base) + offset) {
                Ok(port) => out.push(Address::new(ip, port)),
                Err(_) => {
                    log::debug!("[net] port span for {:?} runs past 65535, clamping", entry);
                    break;
                }
            }
        }
    }
    Ok(out)
}

/// Parse `host[port]` entries into socket addresses, one per declared entry.
pub fn parse_comma_delimited_hosts2(raw: &str) -> Result<Vec<SocketAddr>, HostParseError> {
    let mut out = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (ip, port) = resolve_entry(entry)?;
        out.push(SocketAddr::new(ip, port));
    }
    Ok(out)
}

/// Split one `host[port]` entry and resolve the host part.
fn resolve_entry(entry: &str) -> Result<(IpAddr, u16), HostParseError> {
    let open = entry
        .rfind('[')
        .ok_or_else(|| HostParseError::MissingPort(entry.to_string()))?;
    if !entry.ends_with(']') {
        return Err(HostParseError::MissingPort(entry.to_string()));
    }
    let port: u16 = entry[open + 1..entry.len() - 1]
        .parse()
        .map_err(|_| HostParseError::InvalidPort(entry.to_string()))?;
    let host = entry[..open].trim();
    // IPv6 literals may themselves be bracketed.
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(HostParseError::MissingPort(entry.to_string()));
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok((ip, port));
    }
    match (host, port).to_socket_addrs() {
        Ok(mut addrs) => addrs
            .next()
            .map(|sa| (sa.ip(), port))
            .ok_or_else(|| HostParseError::UnknownHost(host.to_string())),
        Err(_) => Err(HostParseError::UnknownHost(host.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn v4(a: u8, b: u8, c: u8, d: u8, port: u16) -> Address {
        Address::new(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), port)
    }

    #[test]
    fn expands_each_host_over_the_port_span() {
        let hosts = parse_comma_delimited_hosts("10.0.0.1[7800],10.0.0.2[7900]", 3).unwrap();
        assert_eq!(
            hosts,
            vec![
                v4(10, 0, 0, 1, 7800),
                v4(10, 0, 0, 1, 7801),
                v4(10, 0, 0, 1, 7802),
                v4(10, 0, 0, 2, 7900),
                v4(10, 0, 0, 2, 7901),
                v4(10, 0, 0, 2, 7902),
            ]
        );
    }

    #[test]
    fn zero_and_negative_ranges_mean_one_port() {
        let hosts = parse_comma_delimited_hosts("10.0.0.1[7800]", 0).unwrap();
        assert_eq!(hosts, vec![v4(10, 0, 0, 1, 7800)]);
        let hosts = parse_comma_delimited_hosts("10.0.0.1[7800]", -4).unwrap();
        assert_eq!(hosts, vec![v4(10, 0, 0, 1, 7800)]);
    }

    #[test]
    fn keeps_declared_duplicates() {
        let hosts = parse_comma_delimited_hosts("10.0.0.1[7800],10.0.0.1[7800]", 1).unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0], hosts[1]);
    }

    #[test]
    fn clamps_spans_at_the_port_ceiling() {
        let hosts = parse_comma_delimited_hosts("10.0.0.1[65534]", 5).unwrap();
        assert_eq!(
            hosts,
            vec![v4(10, 0, 0, 1, 65534), v4(10, 0, 0, 1, 65535)]
        );
    }

    #[test]
    fn parses_bracketed_ipv6_literals() {
        let hosts = parse_comma_delimited_hosts("[::1][7800],::1[7801]", 1).unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].ip(), "::1".parse::<IpAddr>().unwrap());
        assert_eq!(hosts[0].port(), 7800);
        assert_eq!(hosts[1].port(), 7801);
    }

    #[test]
    fn blank_entries_are_skipped() {
        let hosts = parse_comma_delimited_hosts(" ,10.0.0.1[7800], ", 1).unwrap();
        assert_eq!(hosts.len(), 1);
        assert!(parse_comma_delimited_hosts("", 1).unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(matches!(
            parse_comma_delimited_hosts("10.0.0.1", 1),
            Err(HostParseError::MissingPort(_))
        ));
        assert!(matches!(
            parse_comma_delimited_hosts("10.0.0.1[99999]", 1),
            Err(HostParseError::InvalidPort(_))
        ));
        assert!(matches!(
            parse_comma_delimited_hosts("no.such.host.invalid[7800]", 1),
            Err(HostParseError::UnknownHost(_))
        ));
    }

    #[test]
    fn hosts2_keeps_one_port_per_entry() {
        let sockets = parse_comma_delimited_hosts2("10.0.0.1[7800],10.0.0.2[7801]").unwrap();
        assert_eq!(sockets.len(), 2);
        assert_eq!(sockets[0].port(), 7800);
        assert_eq!(sockets[1].port(), 7801);
    }

    #[test]
    fn address_round_trips_through_display() {
        let addr = v4(192, 168, 1, 10, 7800);
        assert_eq!(addr.to_string(), "192.168.1.10:7800");
        assert_eq!("192.168.1.10:7800".parse::<Address>().unwrap(), addr);
        let v6: Address = "[::1]:7800".parse().unwrap();
        assert_eq!(v6.to_string(), "[::1]:7800");
    }
}
