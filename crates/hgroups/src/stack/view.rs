// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Membership views.

use std::cmp::Ordering;
use std::fmt;

use crate::net::Address;

/// Identity of one installed view: the member that created it plus a
/// sequence number that grows monotonically per cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId {
    creator: Address,
    id: u64,
}

impl ViewId {
    #[must_use]
    pub fn new(creator: Address, id: u64) -> Self {
        Self { creator, id }
    }

    #[inline]
    #[must_use]
    pub fn creator(&self) -> Address {
        self.creator
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Ord for ViewId {
    fn cmp(&self, other: &Self) -> Ordering {
        // Sequence number first, creator only breaks ties.
        self.id
            .cmp(&other.id)
            .then_with(|| self.creator.cmp(&other.creator))
    }
}

impl PartialOrd for ViewId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}]", self.creator, self.id)
    }
}

/// One installed membership: view id plus the ordered member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    view_id: ViewId,
    members: Vec<Address>,
}

impl View {
    #[must_use]
    pub fn new(view_id: ViewId, members: Vec<Address>) -> Self {
        Self { view_id, members }
    }

    #[inline]
    #[must_use]
    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    #[inline]
    #[must_use]
    pub fn members(&self) -> &[Address] {
        &self.members
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn contains(&self, member: &Address) -> bool {
        self.members.contains(member)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.view_id, self.members.len())?;
        f.write_str(" [")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", member)?;
        }
        f.write_str("]")
    }
}
