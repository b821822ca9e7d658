// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered fiber tree and render-phase reconciliation.
//!
//! `weft_core` turns declarative element descriptions into a persistent tree
//! of *fibers*, one per UI position, and keeps it incrementally up to date as
//! updates arrive. It is `no_std` compatible (with `alloc`) and stores fibers
//! in struct-of-arrays layout with generational index handles.
//!
//! # Architecture
//!
//! ```text
//!   Node (descriptor) ──► FiberRoot::update_container()
//!                               │ enqueue on the host root's UpdateQueue
//!                               ▼
//!   WorkLoop: begin_work ──► reconcile_children ──► complete_work
//!                               │ flags bubble into subtree_flags
//!                               ▼
//!   finished_work ──► Committer::commit_root() ──► current ──► effects
//! ```
//!
//! **[`element`]**: Element descriptors (`Node`, `Element`, `Props`,
//! `Component`) produced fresh by every render.
//!
//! **[`fiber`]**: Struct-of-arrays fiber store with generational handles and
//! the work-in-progress double buffer.
//!
//! **[`update_queue`]**: Ring queues of pending state updates whose shared
//! part is common to a fiber and its alternate.
//!
//! **[`hooks`]**: State, reducer, memo, callback, ref and effect hooks for
//! function components, with hook order checking. Effects run after
//! commit.
//!
//! **[`reconcile`]**: The single-child reconciler.
//!
//! **[`work`]**: Begin and complete work plus the resumable depth-first
//! [`WorkLoop`](work::WorkLoop).
//!
//! **[`flags`]**: Effect flags and their bottom-up aggregation.
//!
//! **[`dirty`]**: Scheduled-work tracking via `understory_dirty`. Updates
//! mark their fiber and propagate to ancestors.
//!
//! **[`root`]**: [`FiberRoot`](root::FiberRoot), the per-container entry
//! point, pass driver and commit bookkeeping.
//!
//! **[`commit`]**: The [`Committer`](commit::Committer) trait that host
//! adapters implement.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pass instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Example
//!
//! ```rust
//! use weft_core::commit::NoopCommitter;
//! use weft_core::element::{Component, Element};
//! use weft_core::fiber::HostToken;
//! use weft_core::root::FiberRoot;
//!
//! let counter = Component::new("Counter", |_, hooks| {
//!     let (count, _set) = hooks.use_state(|| 0_i64);
//!     Element::host("span").with_children(count).into()
//! });
//!
//! let mut root = FiberRoot::create_container(HostToken(0));
//! root.update_container(Element::component(&counter).into()).unwrap();
//! root.commit(&mut NoopCommitter);
//! assert_eq!(root.store().live_count(), 5);
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-fiber
//!   begin and complete events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod commit;
pub mod dirty;
pub mod element;
pub mod error;
pub mod fiber;
pub mod flags;
pub mod hooks;
pub mod reconcile;
pub mod root;
pub mod trace;
pub mod update_queue;
pub mod work;
