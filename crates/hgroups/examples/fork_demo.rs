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

/// Fork Stack Example for hgroups
///
/// Demonstrates:
/// - Building a shared chain with a fork demultiplexer
/// - Grafting two fork stacks onto the same chain
/// - Sending traffic down a fork (stamping and splicing)
/// - Routing received traffic up into the right fork stack
/// - View changes fanned out to every fork stack
use std::sync::Arc;

use hgroups::fork::{ForkDemux, ForkHeader, FORK_ID};
use hgroups::stack::{ChannelSink, Event, Header, Message, ProtocolStack, View, ViewId};
use hgroups::Address;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== hgroups Fork Stack Example ===\n");

    // Build a shared chain with the demultiplexer as its only layer
    let demux = Arc::new(ForkDemux::new());
    let stack = ProtocolStack::builder("demo")
        .arc_layer(demux.clone())
        .build()?;
    println!("[OK] Built shared chain: {:?}", stack);

    // The bottom sink stands in for the transport, the top one for the app
    let (wire_sink, wire) = ChannelSink::unbounded();
    let (app_sink, app) = ChannelSink::unbounded();
    stack.set_bottom_sink(wire_sink);
    stack.set_top_sink(app_sink);
    println!("[OK] Installed wire and application sinks");

    // Graft two independent fork stacks onto the shared chain
    let counters = demux.fork("counters", Vec::new())?;
    let chat = demux.fork("chat", Vec::new())?;
    let (counters_sink, counters_rx) = ChannelSink::unbounded();
    let (chat_sink, chat_rx) = ChannelSink::unbounded();
    counters.set_sink(counters_sink);
    chat.set_sink(chat_sink);
    println!("[OK] Grafted fork stacks: counters, chat\n");

    println!("--- Sending Down ---");

    // Traffic sent down a fork is stamped and spliced below the demux
    counters.down(Event::Message(Message::new(None).with_payload(b"inc:7".as_slice())));
    chat.down(Event::Message(Message::new(None).with_payload(b"hello".as_slice())));
    for _ in 0..2 {
        let event = wire.recv()?;
        if let Some(message) = event.message() {
            let tag = message
                .header(FORK_ID)
                .and_then(Header::as_fork)
                .map_or("-", ForkHeader::fork_stack_id);
            println!(
                "Wire saw: tag={}, payload={:?}",
                tag,
                String::from_utf8_lossy(message.payload())
            );
        }
    }

    println!("\n--- Receiving Up ---");

    // A tagged message coming off the wire is routed into its fork stack
    let mut inbound = Message::new(None).with_payload(b"inc:3".as_slice());
    inbound.put_header(FORK_ID, Header::Fork(ForkHeader::new("counters", None)));
    stack.up(Event::Message(inbound));
    let event = counters_rx.recv()?;
    if let Some(message) = event.message() {
        println!(
            "counters received: {:?}",
            String::from_utf8_lossy(message.payload())
        );
    }

    // Untagged traffic flows past the demux to the application
    stack.up(Event::Message(Message::new(None).with_payload(b"plain".as_slice())));
    let event = app.recv()?;
    if let Some(message) = event.message() {
        println!(
            "application received: {:?}",
            String::from_utf8_lossy(message.payload())
        );
    }

    println!("\n--- View Change ---");

    // Membership updates reach the application and every fork stack
    let member: Address = "192.168.1.10:7800".parse()?;
    let view = View::new(ViewId::new(member, 1), vec![member]);
    stack.up(Event::ViewChange(view));
    for (name, rx) in [("counters", &counters_rx), ("chat", &chat_rx), ("app", &app)] {
        if let Event::ViewChange(seen) = rx.recv()? {
            println!("{} saw view {}", name, seen.view_id());
        }
    }

    println!("\n[OK] Fork count: {}", demux.fork_count());
    println!("[OK] Done");
    Ok(())
}
