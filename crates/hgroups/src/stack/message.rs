// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Messages and per-layer headers.

use std::collections::HashMap;

use crate::fork::ForkHeader;
use crate::net::Address;

/// Numeric identity a layer stamps its headers under. Zero is reserved for
/// layers that stamp none.
pub type ProtocolId = u16;

/// Closed union of header payloads, keyed by the owning layer's
/// [`ProtocolId`] inside a message. New layer kinds add variants here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Fork(ForkHeader),
}

impl Header {
    #[must_use]
    pub fn as_fork(&self) -> Option<&ForkHeader> {
        let Self::Fork(h) = self;
        Some(h)
    }

    #[must_use]
    pub fn as_fork_mut(&mut self) -> Option<&mut ForkHeader> {
        let Self::Fork(h) = self;
        Some(h)
    }
}

/// One unit of payload on its way through a chain.
///
/// `dest` of `None` addresses the whole group. Headers ride along with the
/// payload and are owned by the layer whose id keys them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    dest: Option<Address>,
    src: Option<Address>,
    payload: Vec<u8>,
    headers: HashMap<ProtocolId, Header>,
}

impl Message {
    #[must_use]
    pub fn new(dest: Option<Address>) -> Self {
        Self {
            dest,
            src: None,
            payload: Vec::new(),
            headers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    #[must_use]
    pub fn with_src(mut self, src: Address) -> Self {
        self.src = Some(src);
        self
    }

    #[inline]
    #[must_use]
    pub fn dest(&self) -> Option<Address> {
        self.dest
    }

    #[inline]
    #[must_use]
    pub fn src(&self) -> Option<Address> {
        self.src
    }

    pub fn set_src(&mut self, src: Address) {
        self.src = Some(src);
    }

    #[inline]
    #[must_use]
    pub fn is_multicast(&self) -> bool {
        self.dest.is_none()
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: impl Into<Vec<u8>>) {
        self.payload = payload.into();
    }

    /// Attach a header under a layer id, returning the one it replaced.
    pub fn put_header(&mut self, id: ProtocolId, header: Header) -> Option<Header> {
        self.headers.insert(id, header)
    }

    #[must_use]
    pub fn header(&self, id: ProtocolId) -> Option<&Header> {
        self.headers.get(&id)
    }

    #[must_use]
    pub fn header_mut(&mut self, id: ProtocolId) -> Option<&mut Header> {
        self.headers.get_mut(&id)
    }

    pub fn remove_header(&mut self, id: ProtocolId) -> Option<Header> {
        self.headers.remove(&id)
    }

    #[must_use]
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multicast_is_the_absent_destination() {
        assert!(Message::new(None).is_multicast());
        let dest: Address = "10.0.0.1:7800".parse().unwrap();
        let msg = Message::new(Some(dest));
        assert!(!msg.is_multicast());
        assert_eq!(msg.dest(), Some(dest));
    }

    #[test]
    fn headers_replace_per_id() {
        let mut msg = Message::new(None);
        assert!(msg
            .put_header(9, Header::Fork(ForkHeader::new("a", None)))
            .is_none());
        let old = msg.put_header(9, Header::Fork(ForkHeader::new("b", None)));
        assert_eq!(old, Some(Header::Fork(ForkHeader::new("a", None))));
        assert_eq!(msg.header_count(), 1);
        assert_eq!(
            msg.header(9).and_then(Header::as_fork).map(ForkHeader::fork_stack_id),
            Some("b")
        );
    }

    #[test]
    fn payload_and_src_builders() {
        let src: Address = "10.0.0.2:7800".parse().unwrap();
        let msg = Message::new(None).with_payload(b"ping".to_vec()).with_src(src);
        assert_eq!(msg.payload(), b"ping");
        assert_eq!(msg.src(), Some(src));
    }
}
