// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flush-invoker factories resolved by logical name.
//!
//! The raw configuration names an invoker; concrete constructors are
//! registered up front. Resolution happens at assembly time, so a missing
//! name rejects the configuration before any traffic flows.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use crate::stack::View;

/// Callback run when a flush round completes against a membership view.
pub trait FlushInvoker: Send {
    /// Run the callback once. Returns the round outcome.
    fn invoke(&mut self) -> bool;
}

/// Constructor shape every registered invoker must satisfy: built from the
/// view the flush ran over.
pub type InvokerCtor = fn(View) -> Box<dyn FlushInvoker>;

/// A named constructor handed out by the registry.
#[derive(Clone)]
pub struct InvokerHandle {
    name: String,
    ctor: InvokerCtor,
}

impl InvokerHandle {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn instantiate(&self, view: View) -> Box<dyn FlushInvoker> {
        (self.ctor)(view)
    }
}

impl fmt::Debug for InvokerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokerHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for InvokerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Thread-safe name to constructor table.
#[derive(Default)]
pub struct InvokerRegistry {
    ctors: RwLock<HashMap<String, InvokerCtor>>,
}

impl InvokerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. First writer wins; a clash is logged and
    /// reported as `false`.
    pub fn register(&self, name: impl Into<String>, ctor: InvokerCtor) -> bool {
        let name = name.into();
        let mut ctors = self.ctors.write();
        if ctors.contains_key(&name) {
            log::warn!("[conf] flush invoker {:?} already registered", name);
            return false;
        }
        ctors.insert(name, ctor);
        true
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<InvokerHandle> {
        self.ctors.read().get(name).map(|ctor| InvokerHandle {
            name: name.to_string(),
            ctor: *ctor,
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.ctors.read().contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ctors.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ctors.read().is_empty()
    }
}
