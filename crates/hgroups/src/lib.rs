// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hgroups - layered group communication core
//!
//! A pure Rust protocol-chain kernel: typed configuration assembled
//! fail-fast into immutable layer chains, with fork multiplexing so several
//! private stacks can share one transport.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use hgroups::{ChannelSink, Event, ForkDemux, Message, ProtocolStack};
//!
//! // Shared chain with the demultiplexer on top of the wire.
//! let demux = Arc::new(ForkDemux::new());
//! let shared = ProtocolStack::builder("shared")
//!     .arc_layer(demux.clone())
//!     .build()?;
//! let (wire, wire_rx) = ChannelSink::unbounded();
//! shared.set_bottom_sink(wire);
//!
//! // Private fork stack grafted on top; its traffic is stamped with its id.
//! let counters = demux.fork("counters", Vec::new())?;
//! counters.down(Event::Message(Message::new(None).with_payload(b"inc".to_vec())));
//!
//! let out = wire_rx.try_recv()?;
//! assert!(out.message().and_then(|m| m.header(hgroups::FORK_ID)).is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                     Application sinks                        |
//! +--------------------------------------------------------------+
//! |  ForkStack "A"   ForkStack "B"     (private layer chains)    |
//! |  [layers+mux]    [layers+mux]                                |
//! +--------\--------------/--------------------------------------+
//! |         [ ForkDemux ]              (shared chain)            |
//! |         [ other layers ... ]                                 |
//! +--------------------------------------------------------------+
//! |  Transport sink        configuration: PropertySet ->         |
//! |                        Converter -> layer fields (fail-fast) |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ProtocolStack`] | Immutable chain of layers, traversed up and down |
//! | [`StackBuilder`] | Assembles and configures a chain top-down |
//! | [`PropertySet`] | Raw name/value configuration of one layer |
//! | [`Configurator`] | Fail-fast property conversion and assignment |
//! | [`ForkDemux`] | Shared-chain fan-out point for fork traffic |
//! | [`ForkStack`] | Private chain riding on the shared one |
//!
//! ## Modules Overview
//!
//! - [`stack`] - chains, events, messages, views (start here)
//! - [`conf`] - typed configuration and converters
//! - [`fork`] - fork multiplexing
//! - [`net`] - interface enumeration, bind policy, host lists

pub mod conf;
pub mod fork;
pub mod net;
pub mod stack;
pub mod util;

pub use conf::{
    Configurable, ConfigError, ConfigResult, Configurator, Converter, FlushInvoker,
    InvokerHandle, InvokerRegistry, PropertyKind, PropertySet, PropertySpec, PropertyValue,
};
pub use fork::{ForkDemux, ForkHeader, ForkMux, ForkStack, FORK_ID};
pub use net::{Address, NetInterface, NetworkEnv, StaticNet, SystemNet};
pub use stack::{
    ChannelSink, Event, EventSink, Header, Message, Protocol, ProtocolId, ProtocolStack,
    StackBuilder, StackError, Verdict, View, ViewId,
};

/// Library version for diagnostics.
pub const VERSION: &str = "0.4.2";
