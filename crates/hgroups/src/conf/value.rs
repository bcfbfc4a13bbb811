// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed property values.
//!
//! Every configurable field declares a [`PropertyKind`] and receives a
//! [`PropertyValue`] from its converter. The unions are closed on purpose:
//! a converter can only hand back one of the variants below, and accessors
//! reject the wrong variant at assembly time instead of at runtime.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::conf::InvokerHandle;
use crate::net::{Address, NetInterface};

/// Scalar shape of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Bool,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
}

impl PropertyKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Str => "string",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A converted configuration value on its way into a layer field.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    U8(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Resolved NICs, declaration order preserved.
    Interfaces(Vec<NetInterface>),
    /// Address picked by the bind policy.
    BindAddr(IpAddr),
    /// Parsed long list, `None` when the raw form opted the feature out.
    LongArray(Option<Vec<i64>>),
    /// Bootstrap endpoints after port expansion.
    Hosts(Vec<Address>),
    /// Bootstrap endpoints, one socket per declared entry.
    SocketHosts(Vec<SocketAddr>),
    /// Resolved flush-invoker constructor.
    Invoker(InvokerHandle),
}

impl PropertyValue {
    /// Variant name for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Str(_) => "string",
            Self::Interfaces(_) => "interfaces",
            Self::BindAddr(_) => "bind-addr",
            Self::LongArray(_) => "long-array",
            Self::Hosts(_) => "hosts",
            Self::SocketHosts(_) => "socket-hosts",
            Self::Invoker(_) => "invoker",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}
