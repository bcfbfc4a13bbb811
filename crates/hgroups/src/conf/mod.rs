// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed configuration: raw property sets, converters, fail-fast assembly.
//!
//! ```text
//!   raw strings (PropertySet)
//!        |
//!        |  Converter, one per declared field
//!        v
//!   PropertyValue --(PropertySpec.set)--> layer fields
//! ```
//!
//! Submodules:
//! - [`value`]: closed kind/value unions
//! - [`converters`]: the seven conversion strategies
//! - [`configurator`]: declaration tables and the assembly walk
//! - [`invoker`]: flush-invoker factory registry

pub mod configurator;
pub mod converters;
pub mod invoker;
pub mod value;

pub use configurator::{Configurable, Configurator, PropertySpec};
pub use converters::{ConvertCtx, Converter, NoSiblings, SiblingLookup, PORT_RANGE_PROP};
pub use invoker::{FlushInvoker, InvokerCtor, InvokerHandle, InvokerRegistry};
pub use value::{PropertyKind, PropertyValue};

use std::collections::BTreeMap;
use std::fmt;

/// Raw configuration of one layer: name to optional raw string.
///
/// An entry holding `None` models an explicitly null raw value, which the
/// mandatory converters reject. Iteration order is lexicographic, keeping
/// diagnostics stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    entries: BTreeMap<String, Option<String>>,
}

impl PropertySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from literal pairs, mostly for tests and fixtures.
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut set = Self::new();
        for (name, value) in pairs {
            set.put(*name, *value);
        }
        set
    }

    pub fn put(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), Some(value.into()));
    }

    /// Record an explicitly null raw value.
    pub fn put_null(&mut self, name: impl Into<String>) {
        self.entries.insert(name.into(), None);
    }

    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        self.entries.remove(name)
    }

    /// Outer `None`: no such entry. Inner `None`: entry present but null.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Option<&str>> {
        self.entries.get(name).map(Option::as_deref)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// Shorthand for assembly results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Assembly failure. Every variant names the layer and property so a bad
/// configuration is actionable from the message alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Mandatory property carried an explicit null.
    NullValue {
        layer: &'static str,
        property: String,
    },
    /// Raw set names a property the layer never declared.
    UnknownProperty {
        layer: &'static str,
        property: String,
    },
    /// Raw string failed conversion.
    InvalidValue {
        layer: &'static str,
        property: String,
        value: String,
        detail: String,
    },
    /// Interface name matched nothing on this host.
    InterfaceResolution {
        layer: &'static str,
        property: String,
        name: String,
    },
    /// No address satisfied the bind policy.
    BindAddress {
        layer: &'static str,
        property: String,
        detail: String,
    },
    /// Flush-invoker name is not registered.
    InvokerResolution {
        layer: &'static str,
        property: String,
        name: String,
    },
    /// Converter produced a variant the field cannot hold.
    TypeMismatch {
        layer: &'static str,
        property: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullValue { layer, property } => {
                write!(f, "{}.{}: null value for mandatory property", layer, property)
            }
            Self::UnknownProperty { layer, property } => {
                write!(f, "{}: unknown property {:?}", layer, property)
            }
            Self::InvalidValue {
                layer,
                property,
                value,
                detail,
            } => write!(f, "{}.{}: invalid value {:?} ({})", layer, property, value, detail),
            Self::InterfaceResolution {
                layer,
                property,
                name,
            } => write!(f, "{}.{}: no interface named {:?}", layer, property, name),
            Self::BindAddress {
                layer,
                property,
                detail,
            } => write!(f, "{}.{}: {}", layer, property, detail),
            Self::InvokerResolution {
                layer,
                property,
                name,
            } => write!(
                f,
                "{}.{}: no flush invoker registered as {:?}",
                layer, property, name
            ),
            Self::TypeMismatch {
                layer,
                property,
                expected,
            } => write!(f, "{}.{}: converted value is not {}", layer, property, expected),
        }
    }
}

impl std::error::Error for ConfigError {}
