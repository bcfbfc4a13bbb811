// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bidirectional protocol chains.
//!
//! ```text
//!          application / top sink
//!             ^ up         | down
//!        +----+------------v----+
//!        |       layer 0        |   (top)
//!        +---------------------+
//!        |       layer 1        |
//!        +---------------------+
//!        |       layer n        |   (bottom)
//!        +----+------------+----+
//!             | up         v down
//!          transport / bottom sink
//! ```
//!
//! Layers live in an arena (`Vec<Arc<dyn Protocol>>`, index 0 on top) and
//! neighbor links are plain indexes, so a chain owns no cycles. Assembly is
//! single threaded; after [`StackBuilder::build`] the chain is immutable
//! and traversal needs no locks. Events that survive the last layer in a
//! direction land in that end's sink, or come back to the caller when no
//! sink is installed.

mod event;
mod message;
mod view;

pub use event::Event;
pub use message::{Header, Message, ProtocolId};
pub use view::{View, ViewId};

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::conf::{Configurable, ConfigError, Configurator, InvokerRegistry, PropertySet};
use crate::net::{NetworkEnv, SystemNet};

// ============================================================================
// Layer trait
// ============================================================================

/// What a layer did with an event.
#[derive(Debug)]
pub enum Verdict {
    /// Keep moving in the same direction.
    Pass(Event),
    /// The layer took ownership; traversal stops here.
    Consumed,
}

/// One protocol layer.
///
/// Both directions default to pass-through so a layer only overrides the
/// paths it cares about. Handlers take `&self`: a layer that mutates state
/// manages its own interior mutability.
pub trait Protocol: Send + Sync {
    fn name(&self) -> &'static str;

    /// Identity this layer stamps headers under. Zero means "stamps none".
    fn id(&self) -> ProtocolId {
        0
    }

    fn down(&self, event: Event) -> Verdict {
        Verdict::Pass(event)
    }

    fn up(&self, event: Event) -> Verdict {
        Verdict::Pass(event)
    }

    /// Called once per layer during `build`, top to bottom.
    fn attach(&self, stack: &Arc<ProtocolStack>, index: usize) {
        let _ = (stack, index);
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Terminal for events that leave a chain at either end.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: Event);
}

/// Sink backed by an unbounded crossbeam channel.
pub struct ChannelSink {
    tx: crossbeam::channel::Sender<Event>,
}

impl ChannelSink {
    #[must_use]
    pub fn unbounded() -> (Arc<Self>, crossbeam::channel::Receiver<Event>) {
        let (tx, rx) = crossbeam::channel::unbounded();
        (Arc::new(Self { tx }), rx)
    }
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: Event) {
        if self.tx.send(event).is_err() {
            log::debug!("[stack] sink receiver dropped, discarding event");
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Chain assembly and fork failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// `build` was called with no layers.
    EmptyStack,
    /// Fork stack id already grafted on this demultiplexer.
    ForkIdTaken(String),
    /// Operation requires an attached chain (`build` has not run).
    NotAttached(&'static str),
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStack => f.write_str("cannot build an empty chain"),
            Self::ForkIdTaken(id) => write!(f, "fork stack id {:?} already present", id),
            Self::NotAttached(who) => write!(f, "{} is not attached to a chain", who),
        }
    }
}

impl std::error::Error for StackError {}

// ============================================================================
// Stack
// ============================================================================

/// Immutable chain of layers, index 0 on top.
pub struct ProtocolStack {
    name: String,
    layers: Vec<Arc<dyn Protocol>>,
    top_sink: OnceLock<Arc<dyn EventSink>>,
    bottom_sink: OnceLock<Arc<dyn EventSink>>,
}

impl ProtocolStack {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> StackBuilder {
        StackBuilder::new(name)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&Arc<dyn Protocol>> {
        self.layers.get(index)
    }

    /// Index of the first layer with this name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }

    /// Index of the neighbor closer to the top, `None` at the top.
    #[must_use]
    pub fn above(&self, index: usize) -> Option<usize> {
        (index > 0 && index < self.layers.len()).then(|| index - 1)
    }

    /// Index of the neighbor closer to the transport, `None` at the bottom.
    #[must_use]
    pub fn below(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.layers.len()).then_some(next)
    }

    /// Install the delivery target above the top layer. First caller wins;
    /// returns whether this call installed it.
    pub fn set_top_sink(&self, sink: Arc<dyn EventSink>) -> bool {
        self.top_sink.set(sink).is_ok()
    }

    /// Install the delivery target below the bottom layer. First caller
    /// wins; returns whether this call installed it.
    pub fn set_bottom_sink(&self, sink: Arc<dyn EventSink>) -> bool {
        self.bottom_sink.set(sink).is_ok()
    }

    /// Send an event down the whole chain.
    pub fn down(&self, event: Event) -> Option<Event> {
        self.down_from(0, event)
    }

    /// Send an event down starting at `index`. A survivor reaches the
    /// bottom sink when one is installed, otherwise it is handed back.
    pub fn down_from(&self, index: usize, event: Event) -> Option<Event> {
        let mut event = event;
        for layer in self.layers.iter().skip(index) {
            match layer.down(event) {
                Verdict::Pass(next) => event = next,
                Verdict::Consumed => return None,
            }
        }
        match self.bottom_sink.get() {
            Some(sink) => {
                sink.deliver(event);
                None
            }
            None => Some(event),
        }
    }

    /// Receive an event at the bottom of the chain and walk it to the top.
    pub fn up(&self, event: Event) -> Option<Event> {
        if self.layers.is_empty() {
            return self.finish_up(event);
        }
        self.up_from(self.layers.len() - 1, event)
    }

    /// Receive an event at `index` and walk it to the top.
    pub fn up_from(&self, index: usize, event: Event) -> Option<Event> {
        let mut event = event;
        for layer in self.layers.iter().take(index + 1).rev() {
            match layer.up(event) {
                Verdict::Pass(next) => event = next,
                Verdict::Consumed => return None,
            }
        }
        self.finish_up(event)
    }

    fn finish_up(&self, event: Event) -> Option<Event> {
        match self.top_sink.get() {
            Some(sink) => {
                sink.deliver(event);
                None
            }
            None => Some(event),
        }
    }
}

impl fmt::Debug for ProtocolStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.layers.iter().map(|layer| layer.name()).collect();
        f.debug_struct("ProtocolStack")
            .field("name", &self.name)
            .field("layers", &names)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a chain top-down, configuring layers on the way in.
pub struct StackBuilder {
    name: String,
    net: Arc<dyn NetworkEnv>,
    invokers: Arc<InvokerRegistry>,
    layers: Vec<Arc<dyn Protocol>>,
}

impl StackBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            net: Arc::new(SystemNet),
            invokers: Arc::new(InvokerRegistry::new()),
            layers: Vec::new(),
        }
    }

    /// Swap the interface source consulted while configuring layers.
    #[must_use]
    pub fn with_net(mut self, net: Arc<dyn NetworkEnv>) -> Self {
        self.net = net;
        self
    }

    /// Swap the flush-invoker constructors consulted while configuring.
    #[must_use]
    pub fn with_invokers(mut self, invokers: Arc<InvokerRegistry>) -> Self {
        self.invokers = invokers;
        self
    }

    /// Append a layer that takes no raw configuration.
    #[must_use]
    pub fn layer(mut self, proto: impl Protocol + 'static) -> Self {
        self.layers.push(Arc::new(proto));
        self
    }

    /// Append an already-shared layer, keeping the caller's handle live.
    #[must_use]
    pub fn arc_layer(mut self, proto: Arc<dyn Protocol>) -> Self {
        self.layers.push(proto);
        self
    }

    /// Append a layer after assembling its declared properties from `props`.
    pub fn configured_layer<P>(mut self, mut proto: P, props: &PropertySet) -> Result<Self, ConfigError>
    where
        P: Protocol + Configurable + 'static,
    {
        let name = proto.name();
        Configurator::new(props, self.net.as_ref(), self.invokers.as_ref())
            .apply(&mut proto, name)?;
        self.layers.push(Arc::new(proto));
        Ok(self)
    }

    /// Freeze the chain and attach every layer.
    pub fn build(self) -> Result<Arc<ProtocolStack>, StackError> {
        if self.layers.is_empty() {
            return Err(StackError::EmptyStack);
        }
        let stack = Arc::new(ProtocolStack {
            name: self.name,
            layers: self.layers,
            top_sink: OnceLock::new(),
            bottom_sink: OnceLock::new(),
        });
        for (index, layer) in stack.layers.iter().enumerate() {
            layer.attach(&stack, index);
        }
        log::debug!("[stack] {:?}: chain of {} layers built", stack.name, stack.len());
        Ok(stack)
    }
}

impl fmt::Debug for StackBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.layers.iter().map(|layer| layer.name()).collect();
        f.debug_struct("StackBuilder")
            .field("name", &self.name)
            .field("layers", &names)
            .finish_non_exhaustive()
    }
}
