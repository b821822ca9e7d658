// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber tree data model.
//!
//! A *fiber* is the persistent unit of work for one position in the UI tree.
//! Each fiber has:
//!
//! - An identity ([`FiberId`]), a generational handle that becomes stale
//!   when the fiber's slot is reclaimed.
//! - A kind ([`WorkTag`]) plus the element `type` and `key` it was created
//!   from, and an opaque host handle (`state_node`, a [`HostToken`]).
//! - Topology: `return` (parent), first-child and sibling links forming an
//!   ordered multi-ary tree without child collections.
//! - Content: `pending_props` for the pass in flight, `memoized_props` and
//!   `memoized_state` from the last pass that rendered it, and an optional
//!   ring [`UpdateQueue`](crate::update_queue::UpdateQueue).
//! - Effects: `flags` and `subtree_flags` (see [`flags`](crate::flags)).
//!
//! Fibers are stored in struct-of-arrays layout with index-based handles.
//!
//! # Double buffering
//!
//! A tree position is represented by at most two fibers at once: the
//! committed *current* fiber and its *alternate*, the work-in-progress fiber
//! the next pass builds into. The two are linked through the `alternate`
//! field in both directions and never chain further.
//! [`FiberStore::create_work_in_progress`] allocates the alternate on first
//! use and recycles it on every later pass, so readers of the current tree
//! are never handed a half-built node while a new tree is assembled.

mod id;
mod store;
mod traverse;

pub use id::{FiberId, HostToken, INVALID};
pub use store::{FiberStore, MemoizedState, WorkTag};
pub use traverse::{Ancestors, Children, Descendants};
