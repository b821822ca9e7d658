// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber handles and host tokens.

use core::fmt;

/// Raw link value meaning "no fiber".
///
/// The store keeps `return`, `child`, `sibling` and `alternate` as raw slot
/// indices; a link holding `INVALID` is the null pointer of that field. A
/// host root's `return` is always `INVALID`, and so is the `alternate` of a
/// position that has only ever been rendered once.
pub const INVALID: u32 = u32::MAX;

/// A handle to one fiber in a [`FiberStore`](super::FiberStore).
///
/// The two versions of a tree position (current and work-in-progress) are
/// distinct fibers with distinct handles; use
/// [`FiberStore::alternate`](super::FiberStore::alternate) to go from one to
/// the other.
///
/// A handle pairs a slot index with the slot's generation. When a commit
/// reclaims the slot the generation moves on, so a handle kept from an
/// earlier pass is detected as stale instead of silently aliasing whatever
/// fiber reuses the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl FiberId {
    /// Returns the slot index. Only meaningful for diagnostics.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the slot generation this handle was issued for.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Converts an optional handle to a raw link.
    #[inline]
    pub(crate) const fn link(id: Option<Self>) -> u32 {
        match id {
            Some(id) => id.idx,
            None => INVALID,
        }
    }
}

impl fmt::Debug for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FiberId({}@gen{})", self.idx, self.generation)
    }
}

/// An opaque host object: a mount container, an element instance or a text
/// instance.
///
/// The committer mints tokens and writes them into a fiber's `state_node`.
/// The fiber tree never interprets them; a work-in-progress fiber inherits
/// its current's token so an updated position keeps its host node.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostToken(pub u64);

impl fmt::Debug for HostToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostToken({})", self.0)
    }
}
