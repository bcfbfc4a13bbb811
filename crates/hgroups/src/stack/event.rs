// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Events moving through a chain.

use crate::net::Address;
use crate::stack::{Message, View};

/// One unit of work traveling a chain, owned by exactly one layer at a
/// time. Control variants carry their payload inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Data-carrying traffic.
    Message(Message),
    /// New membership installed.
    ViewChange(View),
    /// Join the named cluster.
    Connect(String),
    /// Leave the cluster.
    Disconnect,
    /// Transport reports the local endpoint.
    SetLocalAddress(Address),
}

impl Event {
    /// Stable label for logs.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::ViewChange(_) => "view-change",
            Self::Connect(_) => "connect",
            Self::Disconnect => "disconnect",
            Self::SetLocalAddress(_) => "set-local-address",
        }
    }

    #[must_use]
    pub fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Message(msg) => Some(msg),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Message(msg) => Some(msg),
            _ => None,
        }
    }
}
