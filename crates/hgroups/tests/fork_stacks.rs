// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_precision_loss)] // Stats/metrics need this
#![allow(clippy::cast_sign_loss)] // Test data conversions
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::unreadable_literal)] // Large test constants
#![allow(clippy::doc_markdown)] // Test documentation
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::missing_errors_doc)] // Test documentation
#![allow(clippy::items_after_statements)] // Test helpers
#![allow(clippy::module_name_repetitions)] // Test modules
#![allow(clippy::too_many_lines)] // Example/test code
#![allow(clippy::match_same_arms)] // Test pattern matching
#![allow(clippy::no_effect_underscore_binding)] // Test variables
#![allow(clippy::wildcard_imports)] // Test utility imports
#![allow(clippy::redundant_closure_for_method_calls)] // Test code clarity
#![allow(clippy::similar_names)] // Test variable naming
#![allow(clippy::shadow_unrelated)] // Test scoping
#![allow(clippy::needless_pass_by_value)] // Test functions
#![allow(clippy::cast_possible_wrap)] // Test conversions
#![allow(clippy::single_match_else)] // Test clarity
#![allow(clippy::needless_continue)] // Test logic
#![allow(clippy::cast_lossless)] // Test simplicity
#![allow(clippy::match_wild_err_arm)] // Test error handling
#![allow(clippy::explicit_iter_loop)] // Test iteration
#![allow(clippy::must_use_candidate)] // Test functions
#![allow(clippy::if_not_else)] // Test conditionals
#![allow(clippy::map_unwrap_or)] // Test options
#![allow(clippy::match_wildcard_for_single_variants)] // Test patterns
#![allow(clippy::ignored_unit_patterns)] // Test closures

//! Fork stack lifecycle over a live shared chain
//!
//! Covers stamping and splicing on the down path, tag-based routing on the
//! up path, view fan-out, removal, and routing under concurrent senders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;
use hgroups::fork::{ForkDemux, ForkHeader, FORK_ID};
use hgroups::stack::{
    ChannelSink, Event, Header, Message, Protocol, ProtocolStack, StackError, Verdict, View,
    ViewId,
};
use hgroups::Address;

// ============================================================================
// Fixtures
// ============================================================================

/// Counts traffic without touching it.
struct Tap {
    label: &'static str,
    downs: AtomicUsize,
    ups: AtomicUsize,
}

impl Tap {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            downs: AtomicUsize::new(0),
            ups: AtomicUsize::new(0),
        })
    }
}

impl Protocol for Tap {
    fn name(&self) -> &'static str {
        self.label
    }

    fn down(&self, event: Event) -> Verdict {
        self.downs.fetch_add(1, Ordering::SeqCst);
        Verdict::Pass(event)
    }

    fn up(&self, event: Event) -> Verdict {
        self.ups.fetch_add(1, Ordering::SeqCst);
        Verdict::Pass(event)
    }
}

struct Rig {
    stack: Arc<ProtocolStack>,
    demux: Arc<ForkDemux>,
    above: Arc<Tap>,
    below: Arc<Tap>,
}

/// Shared chain `[above, demux, below]`, top to bottom, with no sinks.
fn rig() -> Rig {
    let above = Tap::new("ABOVE");
    let below = Tap::new("BELOW");
    let demux = Arc::new(ForkDemux::new());
    let stack = ProtocolStack::builder("shared")
        .arc_layer(above.clone())
        .arc_layer(demux.clone())
        .arc_layer(below.clone())
        .build()
        .unwrap();
    Rig {
        stack,
        demux,
        above,
        below,
    }
}

fn member(port: u16) -> Address {
    Address::new("10.0.0.1".parse().unwrap(), port)
}

fn sample_view(id: u64) -> View {
    View::new(ViewId::new(member(7800), id), vec![member(7800), member(7801)])
}

fn fork_tag(event: &Event) -> Option<String> {
    event
        .message()
        .and_then(|m| m.header(FORK_ID))
        .and_then(Header::as_fork)
        .map(|h| h.fork_stack_id().to_string())
}

fn recv(rx: &Receiver<Event>) -> Event {
    rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

// ============================================================================
// Down path
// ============================================================================

#[test]
fn fork_traffic_splices_below_the_demux() {
    let rig = rig();
    let (bottom, wire) = ChannelSink::unbounded();
    assert!(rig.stack.set_bottom_sink(bottom));

    let counters = rig.demux.fork("counters", Vec::new()).unwrap();
    assert_eq!(counters.layer_count(), 1);

    let out = counters.down(Event::Message(Message::new(None).with_payload(b"inc".as_slice())));
    assert!(out.is_none());

    let event = recv(&wire);
    assert_eq!(fork_tag(&event).as_deref(), Some("counters"));
    assert_eq!(event.message().unwrap().payload(), b"inc");

    // Splicing starts below the demux: only the bottom tap ran.
    assert_eq!(rig.above.downs.load(Ordering::SeqCst), 0);
    assert_eq!(rig.below.downs.load(Ordering::SeqCst), 1);
}

#[test]
fn stamping_is_idempotent_and_retags_in_place() {
    let rig = rig();
    let fork_a = rig.demux.fork("a", Vec::new()).unwrap();
    let fork_b = rig.demux.fork("b", Vec::new()).unwrap();

    // No bottom sink: the stamped message comes back out of the chain.
    let mut message = Message::new(None);
    message.put_header(
        FORK_ID,
        Header::Fork(ForkHeader::new("stale", Some("ch-7".to_string()))),
    );

    let mut event = Event::Message(message);
    for _ in 0..5 {
        event = fork_a.down(event).unwrap();
        assert_eq!(fork_tag(&event).as_deref(), Some("a"));
        assert_eq!(event.message().unwrap().header_count(), 1);
    }

    // A second fork retags the same header, keeping the channel id.
    let event = fork_b.down(event).unwrap();
    let header = event
        .message()
        .and_then(|m| m.header(FORK_ID))
        .and_then(Header::as_fork)
        .unwrap();
    assert_eq!(header.fork_stack_id(), "b");
    assert_eq!(header.fork_channel_id(), Some("ch-7"));
}

#[test]
fn fork_layers_run_above_the_sentinel() {
    let rig = rig();
    let inner = Tap::new("INNER");
    let fork = rig.demux.fork("a", vec![inner.clone() as Arc<dyn Protocol>]).unwrap();
    assert_eq!(fork.layer_count(), 2);

    fork.down(Event::Message(Message::new(None))).unwrap();
    assert_eq!(inner.downs.load(Ordering::SeqCst), 1);
    assert_eq!(rig.below.downs.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Up path
// ============================================================================

#[test]
fn up_path_routes_by_tag() {
    let rig = rig();
    let (top, app) = ChannelSink::unbounded();
    assert!(rig.stack.set_top_sink(top));

    let fork_a = rig.demux.fork("a", Vec::new()).unwrap();
    let (fork_sink, fork_rx) = ChannelSink::unbounded();
    assert!(fork_a.set_sink(fork_sink));

    // Tagged: diverted into the fork stack, never reaches the top tap.
    let mut tagged = Message::new(None).with_payload(b"for-a".as_slice());
    tagged.put_header(FORK_ID, Header::Fork(ForkHeader::new("a", None)));
    assert!(rig.stack.up(Event::Message(tagged)).is_none());
    let event = recv(&fork_rx);
    assert_eq!(event.message().unwrap().payload(), b"for-a");
    assert_eq!(rig.above.ups.load(Ordering::SeqCst), 0);
    assert!(app.is_empty());

    // Untagged: flows past the demux to the application sink.
    assert!(rig
        .stack
        .up(Event::Message(Message::new(None).with_payload(b"plain".as_slice())))
        .is_none());
    let event = recv(&app);
    assert_eq!(event.message().unwrap().payload(), b"plain");
    assert_eq!(rig.above.ups.load(Ordering::SeqCst), 1);

    // Unknown tag: dropped at the demux.
    let mut stray = Message::new(None);
    stray.put_header(FORK_ID, Header::Fork(ForkHeader::new("ghost", None)));
    assert!(rig.stack.up(Event::Message(stray)).is_none());
    assert!(app.is_empty());
    assert!(fork_rx.is_empty());
}

#[test]
fn view_changes_fan_out_to_every_fork_stack() {
    let rig = rig();
    let (top, app) = ChannelSink::unbounded();
    assert!(rig.stack.set_top_sink(top));

    let fork_a = rig.demux.fork("a", Vec::new()).unwrap();
    let fork_b = rig.demux.fork("b", Vec::new()).unwrap();
    let (sink_a, rx_a) = ChannelSink::unbounded();
    let (sink_b, rx_b) = ChannelSink::unbounded();
    assert!(fork_a.set_sink(sink_a));
    assert!(fork_b.set_sink(sink_b));

    let view = sample_view(3);
    assert!(rig.stack.up(Event::ViewChange(view.clone())).is_none());

    for rx in [&rx_a, &rx_b, &app] {
        match recv(rx) {
            Event::ViewChange(seen) => assert_eq!(seen.view_id(), view.view_id()),
            other => panic!("unexpected event {:?}", other.kind_name()),
        }
    }
    assert_eq!(rig.demux.view().map(|v| v.view_id()), Some(view.view_id()));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn removal_drops_subsequent_traffic() {
    let rig = rig();
    let fork_a = rig.demux.fork("a", Vec::new()).unwrap();
    let (sink_a, rx_a) = ChannelSink::unbounded();
    assert!(fork_a.set_sink(sink_a));
    assert_eq!(rig.demux.fork_count(), 1);

    let removed = rig.demux.remove("a").unwrap();
    assert_eq!(removed.id(), "a");
    assert_eq!(rig.demux.fork_count(), 0);
    assert!(rig.demux.remove("a").is_none());

    let mut tagged = Message::new(None);
    tagged.put_header(FORK_ID, Header::Fork(ForkHeader::new("a", None)));
    assert!(rig.stack.up(Event::Message(tagged)).is_none());
    assert!(rx_a.is_empty());

    // The id is free again.
    assert!(rig.demux.fork("a", Vec::new()).is_ok());
}

#[test]
fn duplicate_fork_ids_are_rejected() {
    let rig = rig();
    rig.demux.fork("a", Vec::new()).unwrap();
    match rig.demux.fork("a", Vec::new()) {
        Err(StackError::ForkIdTaken(id)) => assert_eq!(id, "a"),
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn unattached_demux_refuses_to_fork() {
    let demux = ForkDemux::new();
    assert!(matches!(
        demux.fork("a", Vec::new()),
        Err(StackError::NotAttached("ForkDemux"))
    ));
}

#[test]
fn dead_shared_chain_consumes_fork_traffic() {
    let rig = rig();
    let fork_a = rig.demux.fork("a", Vec::new()).unwrap();
    let demux = rig.demux.clone();
    drop(rig);

    // Only weak references to the shared chain remain.
    assert!(fork_a.down(Event::Message(Message::new(None))).is_none());
    assert!(matches!(
        demux.fork("b", Vec::new()),
        Err(StackError::NotAttached("ForkDemux"))
    ));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_senders_keep_their_tags() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 200;

    let rig = rig();
    let (bottom, wire) = ChannelSink::unbounded();
    assert!(rig.stack.set_bottom_sink(bottom));

    let fork_a = rig.demux.fork("a", Vec::new()).unwrap();
    let fork_b = rig.demux.fork("b", Vec::new()).unwrap();

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let fork = if t % 2 == 0 { &fork_a } else { &fork_b };
            scope.spawn(move || {
                for _ in 0..PER_THREAD {
                    let payload: Vec<u8> = (0..8).map(|_| fastrand::u8(..)).collect();
                    fork.down(Event::Message(Message::new(None).with_payload(payload)));
                }
            });
        }
    });

    let mut per_tag = std::collections::HashMap::new();
    for _ in 0..THREADS * PER_THREAD {
        let event = recv(&wire);
        let tag = fork_tag(&event).unwrap();
        *per_tag.entry(tag).or_insert(0usize) += 1;
    }
    assert!(wire.is_empty());
    assert_eq!(per_tag.get("a"), Some(&(2 * PER_THREAD)));
    assert_eq!(per_tag.get("b"), Some(&(2 * PER_THREAD)));
}
