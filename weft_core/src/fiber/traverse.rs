// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Walks over the fiber tree that follow raw index links.
//!
//! All three iterators read `child`, `sibling` and `return` links directly
//! and never touch `alternate`, so they stay inside one version of the tree.

use super::id::{FiberId, INVALID};
use super::store::FiberStore;

/// The direct children of a fiber, in sibling order.
///
/// Created by [`FiberStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a FiberStore,
    next: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a FiberStore, first_child: u32) -> Self {
        Self {
            store,
            next: first_child,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let idx = self.next;
        if idx == INVALID {
            return None;
        }
        self.next = self.store.next_sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// The `return` chain above a fiber, nearest first, ending at the host root.
///
/// Created by [`FiberStore::ancestors`]. The starting fiber is not included.
#[derive(Debug)]
pub struct Ancestors<'a> {
    store: &'a FiberStore,
    next: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(store: &'a FiberStore, parent: u32) -> Self {
        Self {
            store,
            next: parent,
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let idx = self.next;
        if idx == INVALID {
            return None;
        }
        self.next = self.store.parent[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// A subtree in depth-first pre-order, the order begin-work visits it.
///
/// Created by [`FiberStore::descendants`]. The subtree root comes first.
/// Never climbs above the subtree root, even when it has siblings.
#[derive(Debug)]
pub struct Descendants<'a> {
    store: &'a FiberStore,
    root: u32,
    next: u32,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(store: &'a FiberStore, root: u32) -> Self {
        Self {
            store,
            root,
            next: root,
        }
    }

    fn advance(&self, from: u32) -> u32 {
        let child = self.store.first_child[from as usize];
        if child != INVALID {
            return child;
        }
        let mut idx = from;
        while idx != self.root {
            let sibling = self.store.next_sibling[idx as usize];
            if sibling != INVALID {
                return sibling;
            }
            idx = self.store.parent[idx as usize];
            if idx == INVALID {
                break;
            }
        }
        INVALID
    }
}

impl Iterator for Descendants<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let idx = self.next;
        if idx == INVALID {
            return None;
        }
        self.next = self.advance(idx);
        Some(self.store.id_at(idx))
    }
}
