// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Network boundary: interface enumeration and bind-address selection.
//!
//! Configuration never touches the OS directly. Everything that needs to
//! know about NICs goes through [`NetworkEnv`], so assembly is deterministic
//! under test ([`StaticNet`]) and live in production ([`SystemNet`]).
//!
//! Bind selection walks a fixed policy ladder:
//!
//! ```text
//! HGROUPS_BIND_ADDR env var
//!   -> bind_addr entry (literal, or scope keyword GLOBAL / SITE_LOCAL /
//!      LINK_LOCAL / NON_LOOPBACK / LOOPBACK)
//!   -> bind_interface entry (first address of the named NIC)
//!   -> first non-loopback address
//!   -> loopback
//! ```

mod hosts;

pub use hosts::{
    parse_comma_delimited_hosts, parse_comma_delimited_hosts2, Address, HostParseError,
};

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use crate::conf::PropertySet;

/// Raw-set key consulted for an explicit bind address or scope keyword.
pub const BIND_ADDR_PROP: &str = "bind_addr";
/// Raw-set key naming the NIC to bind on.
pub const BIND_INTERFACE_PROP: &str = "bind_interface";

// ============================================================================
// Interfaces
// ============================================================================

/// One host interface with its assigned addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetInterface {
    name: String,
    addrs: Vec<IpAddr>,
}

impl NetInterface {
    #[must_use]
    pub fn new(name: impl Into<String>, addrs: Vec<IpAddr>) -> Self {
        Self {
            name: name.into(),
            addrs,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }
}

impl fmt::Display for NetInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where the process learns about its NICs.
///
/// Infallible by contract: implementations log and return an empty list when
/// the platform query fails. Callers treat "no interfaces" as a policy
/// outcome, not an I/O error.
pub trait NetworkEnv: Send + Sync {
    fn interfaces(&self) -> Vec<NetInterface>;
}

/// Live enumeration through the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNet;

impl NetworkEnv for SystemNet {
    fn interfaces(&self) -> Vec<NetInterface> {
        let pairs = match local_ip_address::list_afinet_netifas() {
            Ok(pairs) => pairs,
            Err(e) => {
                log::warn!(
                    "[net] interface enumeration failed: {}, continuing with empty list",
                    e
                );
                return Vec::new();
            }
        };
        // Group per NIC, keeping first-seen order.
        let mut order: Vec<String> = Vec::new();
        let mut by_name: HashMap<String, Vec<IpAddr>> = HashMap::new();
        for (name, ip) in pairs {
            if !by_name.contains_key(&name) {
                order.push(name.clone());
            }
            by_name.entry(name).or_default().push(ip);
        }
        order
            .into_iter()
            .map(|name| {
                let addrs = by_name.remove(&name).unwrap_or_default();
                NetInterface::new(name, addrs)
            })
            .collect()
    }
}

/// Fixed interface table for tests and pinned deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticNet {
    interfaces: Vec<NetInterface>,
}

impl StaticNet {
    #[must_use]
    pub fn new(interfaces: Vec<NetInterface>) -> Self {
        Self { interfaces }
    }
}

impl NetworkEnv for StaticNet {
    fn interfaces(&self) -> Vec<NetInterface> {
        self.interfaces.clone()
    }
}

// ============================================================================
// Bind policy
// ============================================================================

/// Failure to pick a bind address under the configured policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// No enumerated address falls in the requested scope.
    NoScopeMatch(String),
    /// `bind_interface` names a NIC this host does not have.
    UnknownInterface(String),
    /// The named NIC carries no address.
    InterfaceHasNoAddr(String),
    /// `bind_addr` is neither a keyword nor an IP literal.
    Unparsable(String),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoScopeMatch(scope) => {
                write!(f, "no address in scope {} on this host", scope)
            }
            Self::UnknownInterface(name) => write!(f, "no interface named {:?}", name),
            Self::InterfaceHasNoAddr(name) => {
                write!(f, "interface {:?} carries no address", name)
            }
            Self::Unparsable(raw) => {
                write!(f, "bind address {:?} is neither a keyword nor an IP literal", raw)
            }
        }
    }
}

impl std::error::Error for BindError {}

/// Pick the address a transport should bind, walking the policy ladder over
/// the raw set and the interface table.
pub fn select_bind_addr(props: &PropertySet, env: &dyn NetworkEnv) -> Result<IpAddr, BindError> {
    if let Ok(raw) = std::env::var("HGROUPS_BIND_ADDR") {
        match raw.parse::<IpAddr>() {
            Ok(ip) => {
                log::debug!("[net] bind addr {} taken from HGROUPS_BIND_ADDR", ip);
                return Ok(ip);
            }
            Err(_) => {
                log::warn!("[net] ignoring unparsable HGROUPS_BIND_ADDR {:?}", raw);
            }
        }
    }

    if let Some(Some(raw)) = props.value(BIND_ADDR_PROP) {
        let raw = raw.trim();
        return match raw {
            "GLOBAL" | "SITE_LOCAL" | "LINK_LOCAL" | "NON_LOOPBACK" | "LOOPBACK" => {
                scope_scan(raw, env)
            }
            literal => literal
                .parse::<IpAddr>()
                .map_err(|_| BindError::Unparsable(literal.to_string())),
        };
    }

    if let Some(Some(name)) = props.value(BIND_INTERFACE_PROP) {
        let name = name.trim();
        let nic = env
            .interfaces()
            .into_iter()
            .find(|nic| nic.name() == name)
            .ok_or_else(|| BindError::UnknownInterface(name.to_string()))?;
        return nic
            .addrs()
            .first()
            .copied()
            .ok_or_else(|| BindError::InterfaceHasNoAddr(name.to_string()));
    }

    let fallback = all_addrs(env).into_iter().find(|ip| !ip.is_loopback());
    match fallback {
        Some(ip) => Ok(ip),
        None => {
            log::debug!("[net] no non-loopback address, binding loopback");
            Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
        }
    }
}

fn scope_scan(keyword: &str, env: &dyn NetworkEnv) -> Result<IpAddr, BindError> {
    let pred: fn(&IpAddr) -> bool = match keyword {
        "GLOBAL" => is_global,
        "SITE_LOCAL" => is_site_local,
        "LINK_LOCAL" => is_link_local,
        "NON_LOOPBACK" => |ip| !ip.is_loopback(),
        _ => |ip| ip.is_loopback(),
    };
    all_addrs(env)
        .into_iter()
        .find(|ip| pred(ip))
        .ok_or_else(|| BindError::NoScopeMatch(keyword.to_string()))
}

fn all_addrs(env: &dyn NetworkEnv) -> Vec<IpAddr> {
    env.interfaces()
        .into_iter()
        .flat_map(|nic| nic.addrs().to_vec())
        .collect()
}

fn is_site_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private(),
        // fc00::/7 plus the legacy fec0::/10 site scope.
        IpAddr::V6(v6) => {
            (v6.segments()[0] & 0xfe00) == 0xfc00 || (v6.segments()[0] & 0xffc0) == 0xfec0
        }
    }
}

fn is_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

fn is_global(ip: &IpAddr) -> bool {
    !ip.is_loopback() && !ip.is_unspecified() && !is_link_local(ip) && !is_site_local(ip)
}
