// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fork multiplexing: private layer chains grafted onto a shared chain.
//!
//! ```text
//!    fork stack "A"        fork stack "B"
//!    [ layers ... ]        [ layers ... ]
//!    [ ForkMux    ]        [ ForkMux    ]
//!          \                    /           down: stamp id, splice in
//!           v                  v
//!    ==========[ ForkDemux ]==========      shared chain
//!    [ remaining shared layers ]
//!               transport
//! ```
//!
//! Down: the [`ForkMux`] sentinel at the bottom of each fork stack stamps
//! its fork id onto messages and splices them into the shared chain below
//! the demultiplexer. Up: the [`ForkDemux`] routes tagged messages into the
//! matching fork stack; untagged traffic continues up the shared chain.
//! Ownership cycles are broken by weak back-references, so dropping the
//! shared chain never leaks fork stacks.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use arc_swap::ArcSwapOption;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::stack::{
    Event, EventSink, Header, Message, Protocol, ProtocolId, ProtocolStack, StackError, Verdict,
    View,
};

/// Header key shared by the fork layers.
pub const FORK_ID: ProtocolId = 0xF0;

// ============================================================================
// Header and wire form
// ============================================================================

/// Routing tag for fork traffic.
///
/// `fork_stack_id` selects the fork stack on the receiving side.
/// `fork_channel_id` optionally selects a channel inside it and is never
/// touched by restamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkHeader {
    fork_stack_id: String,
    fork_channel_id: Option<String>,
}

impl ForkHeader {
    #[must_use]
    pub fn new(fork_stack_id: impl Into<String>, fork_channel_id: Option<String>) -> Self {
        Self {
            fork_stack_id: fork_stack_id.into(),
            fork_channel_id,
        }
    }

    #[inline]
    #[must_use]
    pub fn fork_stack_id(&self) -> &str {
        &self.fork_stack_id
    }

    #[inline]
    #[must_use]
    pub fn fork_channel_id(&self) -> Option<&str> {
        self.fork_channel_id.as_deref()
    }

    pub fn set_fork_stack_id(&mut self, id: impl Into<String>) {
        self.fork_stack_id = id.into();
    }

    /// Serialize as `u16` LE length + id bytes, a presence byte, then the
    /// channel id the same way when present.
    pub fn encode(&self) -> Result<Vec<u8>, HeaderEncodeError> {
        let cap = 3 + self.fork_stack_id.len()
            + self.fork_channel_id.as_ref().map_or(0, |ch| 2 + ch.len());
        let mut buf = Vec::with_capacity(cap);
        encode_str(&mut buf, &self.fork_stack_id)?;
        match &self.fork_channel_id {
            Some(ch) => {
                buf.push(1);
                encode_str(&mut buf, ch)?;
            }
            None => buf.push(0),
        }
        Ok(buf)
    }

    /// Parse a header from the front of `buf`. Trailing bytes are ignored;
    /// truncated or malformed input yields `None`.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let (fork_stack_id, rest) = decode_str(buf)?;
        let (&presence, rest) = rest.split_first()?;
        let fork_channel_id = match presence {
            0 => None,
            1 => Some(decode_str(rest)?.0),
            _ => return None,
        };
        Some(Self {
            fork_stack_id,
            fork_channel_id,
        })
    }
}

impl fmt::Display for ForkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fork-stack={}, fork-ch={}",
            self.fork_stack_id,
            self.fork_channel_id.as_deref().unwrap_or("-")
        )
    }
}

fn encode_str(buf: &mut Vec<u8>, s: &str) -> Result<(), HeaderEncodeError> {
    let len = u16::try_from(s.len()).map_err(|_| HeaderEncodeError::IdTooLong(s.len()))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn decode_str(buf: &[u8]) -> Option<(String, &[u8])> {
    let len_bytes = buf.get(..2)?;
    let len = usize::from(u16::from_le_bytes([len_bytes[0], len_bytes[1]]));
    let bytes = buf.get(2..2 + len)?;
    let s = std::str::from_utf8(bytes).ok()?;
    Some((s.to_string(), &buf[2 + len..]))
}

/// Header serialization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderEncodeError {
    /// Id does not fit the u16 length prefix.
    IdTooLong(usize),
}

impl fmt::Display for HeaderEncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdTooLong(len) => {
                write!(f, "fork id of {} bytes exceeds the u16 length prefix", len)
            }
        }
    }
}

impl std::error::Error for HeaderEncodeError {}

// ============================================================================
// ForkMux: bottom sentinel of a fork stack
// ============================================================================

/// Stamps downward messages with its fork id and splices them into the
/// shared chain below the demultiplexer.
///
/// The stamp is idempotent: an existing fork header is retagged in place
/// and its channel id left untouched, so re-sending through another fork
/// only flips the stack id. Upward traffic passes unmodified.
pub struct ForkMux {
    fork_stack_id: String,
    shared: Weak<ProtocolStack>,
    splice: usize,
}

impl ForkMux {
    #[must_use]
    pub fn new(
        fork_stack_id: impl Into<String>,
        shared: &Arc<ProtocolStack>,
        splice: usize,
    ) -> Self {
        Self {
            fork_stack_id: fork_stack_id.into(),
            shared: Arc::downgrade(shared),
            splice,
        }
    }

    fn stamp(&self, message: &mut Message) {
        if let Some(header) = message.header_mut(FORK_ID).and_then(Header::as_fork_mut) {
            header.set_fork_stack_id(self.fork_stack_id.as_str());
            return;
        }
        message.put_header(
            FORK_ID,
            Header::Fork(ForkHeader::new(self.fork_stack_id.as_str(), None)),
        );
    }
}

impl Protocol for ForkMux {
    fn name(&self) -> &'static str {
        "ForkMux"
    }

    fn id(&self) -> ProtocolId {
        FORK_ID
    }

    fn down(&self, event: Event) -> Verdict {
        let event = match event {
            Event::Message(mut message) => {
                self.stamp(&mut message);
                Event::Message(message)
            }
            other => other,
        };
        let Some(shared) = self.shared.upgrade() else {
            log::warn!(
                "[fork] {:?}: shared chain is gone, dropping {} event",
                self.fork_stack_id,
                event.kind_name()
            );
            return Verdict::Consumed;
        };
        match shared.down_from(self.splice, event) {
            Some(survivor) => Verdict::Pass(survivor),
            None => Verdict::Consumed,
        }
    }
}

// ============================================================================
// ForkStack: a private chain riding on the shared one
// ============================================================================

/// Fork-private layers plus the [`ForkMux`] sentinel at the bottom.
///
/// Traffic surfacing at the top goes to the installed sink; with no sink it
/// is handed back to the caller.
pub struct ForkStack {
    id: String,
    layers: Vec<Arc<dyn Protocol>>,
    sink: OnceLock<Arc<dyn EventSink>>,
}

impl ForkStack {
    fn new(id: String, mut layers: Vec<Arc<dyn Protocol>>, mux: ForkMux) -> Arc<Self> {
        layers.push(Arc::new(mux));
        Arc::new(Self {
            id,
            layers,
            sink: OnceLock::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Layer count including the sentinel.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Install the top-side delivery target. First caller wins.
    pub fn set_sink(&self, sink: Arc<dyn EventSink>) -> bool {
        self.sink.set(sink).is_ok()
    }

    /// Send an event down this fork's chain; the sentinel carries it on
    /// into the shared chain.
    pub fn down(&self, event: Event) -> Option<Event> {
        let mut event = event;
        for layer in &self.layers {
            match layer.down(event) {
                Verdict::Pass(next) => event = next,
                Verdict::Consumed => return None,
            }
        }
        Some(event)
    }

    /// Walk an event from the sentinel to the top, then into the sink.
    pub fn up(&self, event: Event) -> Option<Event> {
        let mut event = event;
        for layer in self.layers.iter().rev() {
            match layer.up(event) {
                Verdict::Pass(next) => event = next,
                Verdict::Consumed => return None,
            }
        }
        match self.sink.get() {
            Some(sink) => {
                sink.deliver(event);
                None
            }
            None => Some(event),
        }
    }
}

impl fmt::Debug for ForkStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkStack")
            .field("id", &self.id)
            .field("layers", &self.layers.len())
            .finish()
    }
}

// ============================================================================
// ForkDemux: shared-chain fan-out point
// ============================================================================

struct Attachment {
    shared: Weak<ProtocolStack>,
    index: usize,
}

/// Shared-chain member that fans fork traffic out to fork stacks.
///
/// Grafting and removal are safe at any time; routing holds no lock while
/// walking a fork stack. View changes are snapshotted and fanned out to
/// every fork stack before continuing up the shared chain.
pub struct ForkDemux {
    fork_stacks: DashMap<String, Arc<ForkStack>>,
    attachment: OnceLock<Attachment>,
    view: ArcSwapOption<View>,
}

impl ForkDemux {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fork_stacks: DashMap::new(),
            attachment: OnceLock::new(),
            view: ArcSwapOption::const_empty(),
        }
    }

    /// Latest membership seen on the up path.
    #[must_use]
    pub fn view(&self) -> Option<Arc<View>> {
        self.view.load_full()
    }

    #[must_use]
    pub fn fork_count(&self) -> usize {
        self.fork_stacks.len()
    }

    #[must_use]
    pub fn fork_stack(&self, id: &str) -> Option<Arc<ForkStack>> {
        self.fork_stacks.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Graft a new fork stack on top of this demultiplexer. `layers` run
    /// top to bottom; the sentinel is appended internally.
    pub fn fork(
        &self,
        id: impl Into<String>,
        layers: Vec<Arc<dyn Protocol>>,
    ) -> Result<Arc<ForkStack>, StackError> {
        let id = id.into();
        let Some(attachment) = self.attachment.get() else {
            return Err(StackError::NotAttached("ForkDemux"));
        };
        let Some(shared) = attachment.shared.upgrade() else {
            return Err(StackError::NotAttached("ForkDemux"));
        };
        let mux = ForkMux::new(id.as_str(), &shared, attachment.index + 1);
        match self.fork_stacks.entry(id.clone()) {
            Entry::Occupied(_) => Err(StackError::ForkIdTaken(id)),
            Entry::Vacant(slot) => {
                let stack = ForkStack::new(id, layers, mux);
                slot.insert(Arc::clone(&stack));
                Ok(stack)
            }
        }
    }

    /// Detach a fork stack. In-flight traffic for the id is dropped from
    /// then on.
    pub fn remove(&self, id: &str) -> Option<Arc<ForkStack>> {
        self.fork_stacks.remove(id).map(|(_, stack)| stack)
    }

    fn route_up(&self, message: Message) -> Verdict {
        let fork_id = message
            .header(FORK_ID)
            .and_then(Header::as_fork)
            .map(|h| h.fork_stack_id().to_string());
        let Some(fork_id) = fork_id else {
            return Verdict::Pass(Event::Message(message));
        };
        let Some(stack) = self.fork_stack(&fork_id) else {
            log::warn!("[fork] no fork stack {:?}, dropping message", fork_id);
            return Verdict::Consumed;
        };
        if let Some(stranded) = stack.up(Event::Message(message)) {
            log::debug!(
                "[fork] fork stack {:?} has no sink, discarding {}",
                fork_id,
                stranded.kind_name()
            );
        }
        Verdict::Consumed
    }
}

impl Default for ForkDemux {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for ForkDemux {
    fn name(&self) -> &'static str {
        "ForkDemux"
    }

    fn id(&self) -> ProtocolId {
        FORK_ID
    }

    fn attach(&self, stack: &Arc<ProtocolStack>, index: usize) {
        let attachment = Attachment {
            shared: Arc::downgrade(stack),
            index,
        };
        if self.attachment.set(attachment).is_err() {
            log::warn!("[fork] ForkDemux attached twice, keeping the first chain");
        }
    }

    fn up(&self, event: Event) -> Verdict {
        match event {
            Event::Message(message) => self.route_up(message),
            Event::ViewChange(view) => {
                self.view.store(Some(Arc::new(view.clone())));
                // Snapshot first so routing never holds a shard lock while
                // running fork layers.
                let stacks: Vec<Arc<ForkStack>> = self
                    .fork_stacks
                    .iter()
                    .map(|entry| Arc::clone(entry.value()))
                    .collect();
                for stack in stacks {
                    if stack.up(Event::ViewChange(view.clone())).is_some() {
                        log::debug!(
                            "[fork] fork stack {:?} has no sink for view {}",
                            stack.id(),
                            view.view_id()
                        );
                    }
                }
                Verdict::Pass(Event::ViewChange(view))
            }
            other => Verdict::Pass(other),
        }
    }
}
