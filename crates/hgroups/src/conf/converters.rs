// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Property converters.
//!
//! Seven strategies turn raw strings into [`PropertyValue`]s. The set is
//! closed: every declared property names its converter up front and the
//! match in [`Converter::convert`] is the entire dispatch surface.
//!
//! | Converter       | Produces      | Notes                               |
//! |-----------------|---------------|-------------------------------------|
//! | `Default`       | scalar/string | null raw is rejected                |
//! | `InterfaceList` | `Interfaces`  | names resolved against the env      |
//! | `BindAddress`   | `BindAddr`    | policy over the whole raw set       |
//! | `LongArray`     | `LongArray`   | permissive, absent on garbage       |
//! | `InitialHosts`  | `Hosts`       | sibling `port_range` expansion      |
//! | `InitialHosts2` | `SocketHosts` | fixed single-port expansion         |
//! | `FlushInvoker`  | `Invoker`     | resolved from the registry          |
//!
//! `render` is the reverse direction; it produces the canonical raw form
//! where one exists and `None` where it does not.

use std::net::SocketAddr;

use crate::conf::{ConfigError, InvokerRegistry, PropertyKind, PropertySet, PropertyValue};
use crate::net::{
    parse_comma_delimited_hosts, parse_comma_delimited_hosts2, select_bind_addr, Address,
    HostParseError, NetworkEnv,
};
use crate::util;

/// Sibling field consulted by `InitialHosts` for its expansion span.
pub const PORT_RANGE_PROP: &str = "port_range";

// ============================================================================
// Context
// ============================================================================

/// Read access to sibling fields of the layer under assembly.
pub trait SiblingLookup {
    fn sibling(&self, name: &str) -> Option<PropertyValue>;
}

/// Lookup that never finds anything.
pub struct NoSiblings;

impl SiblingLookup for NoSiblings {
    fn sibling(&self, _name: &str) -> Option<PropertyValue> {
        None
    }
}

/// Everything a converter may consult besides the raw string.
pub struct ConvertCtx<'a> {
    /// Layer under assembly, for diagnostics.
    pub layer: &'static str,
    /// Property being converted.
    pub property: &'a str,
    /// Declared scalar kind, drives `Default` parsing.
    pub kind: PropertyKind,
    /// The whole raw set of the layer.
    pub props: &'a PropertySet,
    /// Already-assigned sibling fields.
    pub siblings: &'a dyn SiblingLookup,
    /// Interface source.
    pub net: &'a dyn NetworkEnv,
    /// Flush-invoker constructors.
    pub invokers: &'a InvokerRegistry,
}

// ============================================================================
// Converter
// ============================================================================

/// Conversion strategy a declared property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Default,
    InterfaceList,
    BindAddress,
    LongArray,
    InitialHosts,
    InitialHosts2,
    FlushInvoker,
}

impl Converter {
    /// Turn a raw string into a typed value. `raw` is `None` for an
    /// explicitly null entry, which every strategy except `LongArray` and
    /// `BindAddress` rejects.
    pub fn convert(
        self,
        raw: Option<&str>,
        ctx: &ConvertCtx<'_>,
    ) -> Result<PropertyValue, ConfigError> {
        match self {
            Self::Default => convert_scalar(require(raw, ctx)?, ctx),
            Self::InterfaceList => convert_interfaces(require(raw, ctx)?, ctx),
            Self::BindAddress => convert_bind_addr(ctx),
            Self::LongArray => Ok(PropertyValue::LongArray(
                raw.and_then(util::parse_comma_delimited_longs),
            )),
            Self::InitialHosts => convert_initial_hosts(require(raw, ctx)?, ctx),
            Self::InitialHosts2 => convert_initial_hosts2(require(raw, ctx)?, ctx),
            Self::FlushInvoker => convert_invoker(require(raw, ctx)?, ctx),
        }
    }

    /// Canonical raw form of a converted value, `None` when the value has no
    /// string rendering (or the variant is not this strategy's output).
    #[must_use]
    pub fn render(self, value: &PropertyValue) -> Option<String> {
        match (self, value) {
            (Self::Default, v) => render_scalar(v),
            (Self::InterfaceList, PropertyValue::Interfaces(nics)) => {
                Some(util::join_comma(nics))
            }
            (Self::BindAddress, PropertyValue::BindAddr(ip)) => Some(ip.to_string()),
            (Self::LongArray, PropertyValue::LongArray(longs)) => {
                longs.as_ref().map(|l| util::join_comma(l))
            }
            // Expanded lists have no faithful raw form; render the type path
            // as a placeholder.
            (Self::InitialHosts, PropertyValue::Hosts(_)) => {
                Some(std::any::type_name::<Vec<Address>>().to_string())
            }
            (Self::InitialHosts2, PropertyValue::SocketHosts(_)) => {
                Some(std::any::type_name::<Vec<SocketAddr>>().to_string())
            }
            (Self::FlushInvoker, PropertyValue::Invoker(handle)) => {
                Some(handle.name().to_string())
            }
            _ => None,
        }
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn require<'a>(raw: Option<&'a str>, ctx: &ConvertCtx<'_>) -> Result<&'a str, ConfigError> {
    raw.ok_or_else(|| ConfigError::NullValue {
        layer: ctx.layer,
        property: ctx.property.to_string(),
    })
}

fn invalid(ctx: &ConvertCtx<'_>, value: &str, detail: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        layer: ctx.layer,
        property: ctx.property.to_string(),
        value: value.to_string(),
        detail: detail.to_string(),
    }
}

fn convert_scalar(raw: &str, ctx: &ConvertCtx<'_>) -> Result<PropertyValue, ConfigError> {
    let raw = raw.trim();
    let bad = || invalid(ctx, raw, format!("expected {}", ctx.kind));
    Ok(match ctx.kind {
        PropertyKind::Bool => PropertyValue::Bool(raw.parse().map_err(|_| bad())?),
        PropertyKind::U8 => PropertyValue::U8(raw.parse().map_err(|_| bad())?),
        PropertyKind::I16 => PropertyValue::I16(raw.parse().map_err(|_| bad())?),
        PropertyKind::I32 => PropertyValue::I32(raw.parse().map_err(|_| bad())?),
        PropertyKind::I64 => PropertyValue::I64(raw.parse().map_err(|_| bad())?),
        PropertyKind::F32 => PropertyValue::F32(raw.parse().map_err(|_| bad())?),
        PropertyKind::F64 => PropertyValue::F64(raw.parse().map_err(|_| bad())?),
        PropertyKind::Str => PropertyValue::Str(raw.to_string()),
    })
}

fn render_scalar(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Bool(v) => Some(v.to_string()),
        PropertyValue::U8(v) => Some(v.to_string()),
        PropertyValue::I16(v) => Some(v.to_string()),
        PropertyValue::I32(v) => Some(v.to_string()),
        PropertyValue::I64(v) => Some(v.to_string()),
        PropertyValue::F32(v) => Some(v.to_string()),
        PropertyValue::F64(v) => Some(v.to_string()),
        PropertyValue::Str(v) => Some(v.clone()),
        _ => None,
    }
}

fn convert_interfaces(raw: &str, ctx: &ConvertCtx<'_>) -> Result<PropertyValue, ConfigError> {
    let known = ctx.net.interfaces();
    let mut picked = Vec::new();
    for name in raw.split(',') {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        match known.iter().find(|nic| nic.name() == name) {
            Some(nic) => picked.push(nic.clone()),
            None => {
                return Err(ConfigError::InterfaceResolution {
                    layer: ctx.layer,
                    property: ctx.property.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }
    Ok(PropertyValue::Interfaces(picked))
}

fn convert_bind_addr(ctx: &ConvertCtx<'_>) -> Result<PropertyValue, ConfigError> {
    select_bind_addr(ctx.props, ctx.net)
        .map(PropertyValue::BindAddr)
        .map_err(|e| ConfigError::BindAddress {
            layer: ctx.layer,
            property: ctx.property.to_string(),
            detail: e.to_string(),
        })
}

fn convert_initial_hosts(raw: &str, ctx: &ConvertCtx<'_>) -> Result<PropertyValue, ConfigError> {
    let range = match ctx.siblings.sibling(PORT_RANGE_PROP) {
        Some(v) => v.as_i32().unwrap_or_else(|| {
            log::debug!(
                "[conf] {}.{}: sibling {} holds {}, expanding single ports",
                ctx.layer,
                ctx.property,
                PORT_RANGE_PROP,
                v.kind_name()
            );
            0
        }),
        None => {
            log::debug!(
                "[conf] {}.{}: no {} sibling set, expanding single ports",
                ctx.layer,
                ctx.property,
                PORT_RANGE_PROP
            );
            0
        }
    };
    parse_comma_delimited_hosts(raw, range)
        .map(PropertyValue::Hosts)
        .map_err(|e: HostParseError| invalid(ctx, raw, e))
}

fn convert_initial_hosts2(raw: &str, ctx: &ConvertCtx<'_>) -> Result<PropertyValue, ConfigError> {
    parse_comma_delimited_hosts2(raw)
        .map(PropertyValue::SocketHosts)
        .map_err(|e| invalid(ctx, raw, e))
}

fn convert_invoker(raw: &str, ctx: &ConvertCtx<'_>) -> Result<PropertyValue, ConfigError> {
    let name = raw.trim();
    ctx.invokers
        .resolve(name)
        .map(PropertyValue::Invoker)
        .ok_or_else(|| ConfigError::InvokerResolution {
            layer: ctx.layer,
            property: ctx.property.to_string(),
            name: name.to_string(),
        })
}
