// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ring update queue.
//!
//! Every stateful position in the tree (the host root, and each state hook
//! of a function component) owns an [`UpdateQueue`]: an append-only log of
//! pending state changes stored as a circular singly-linked list.
//!
//! ```text
//!   pending ──► U3 ──next──► U1 ──next──► U2 ──next──► U3
//!              newest       oldest
//! ```
//!
//! `pending` always points at the most recently inserted update and
//! `pending.next` at the oldest, so insertion is O(1) and a drain can start
//! at the oldest update without a tail pointer.
//!
//! The ring lives in the queue's *shared* part. Cloning an `UpdateQueue`
//! clones the handle, not the ring: a fiber and its alternate hold the same
//! shared part, so an update enqueued through either version is seen by
//! whichever version is processed next.
//!
//! # Draining
//!
//! [`UpdateQueue::process`] snapshots the ring and clears `pending` before
//! applying any action. Updates enqueued while the drain runs (for example by
//! a transform closure, or by application code running during the pass) go
//! into a fresh ring and wait for the next drain.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::fiber::INVALID;

/// What an update does to the state it is applied to.
pub enum UpdateAction<S> {
    /// Replace the state outright.
    Replace(S),
    /// Compute the next state from the previous one.
    Transform(Box<dyn FnOnce(S) -> S>),
}

impl<S> UpdateAction<S> {
    /// Wraps a transform closure.
    pub fn transform(f: impl FnOnce(S) -> S + 'static) -> Self {
        Self::Transform(Box::new(f))
    }

    fn apply(self, state: S) -> S {
        match self {
            Self::Replace(next) => next,
            Self::Transform(f) => f(state),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for UpdateAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(s) => f.debug_tuple("Replace").field(s).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// A single entry in an update ring.
#[derive(Debug)]
pub struct Update<S> {
    action: UpdateAction<S>,
    /// Ring index of the next (older-to-newer, wrapping) update.
    next: u32,
}

/// Creates an unlinked update carrying `action`.
#[must_use]
pub fn create_update<S>(action: UpdateAction<S>) -> Update<S> {
    Update {
        action,
        next: INVALID,
    }
}

/// The part of a queue shared between a fiber and its alternate.
struct SharedQueue<S> {
    ring: Vec<Update<S>>,
    pending: Option<u32>,
}

impl<S> Default for SharedQueue<S> {
    fn default() -> Self {
        Self {
            ring: Vec::new(),
            pending: None,
        }
    }
}

/// Handle to a ring of pending updates.
pub struct UpdateQueue<S> {
    shared: Rc<RefCell<SharedQueue<S>>>,
}

impl<S> Clone for UpdateQueue<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S> Default for UpdateQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for UpdateQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl<S> UpdateQueue<S> {
    /// Creates a queue with `pending` empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(SharedQueue::default())),
        }
    }

    /// Appends `update` to the ring in O(1).
    pub fn enqueue(&self, mut update: Update<S>) {
        let mut shared = self.shared.borrow_mut();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a ring never holds u32::MAX updates between drains"
        )]
        let idx = shared.ring.len() as u32;
        match shared.pending {
            None => {
                // Ring of one.
                update.next = idx;
            }
            Some(pending) => {
                update.next = shared.ring[pending as usize].next;
                shared.ring[pending as usize].next = idx;
            }
        }
        shared.ring.push(update);
        shared.pending = Some(idx);
    }

    /// Returns whether no update is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.borrow().pending.is_none()
    }

    /// Returns the number of pending updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.borrow().ring.len()
    }

    /// Returns whether both handles refer to the same shared ring.
    #[must_use]
    pub fn shares_ring_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Drains the ring, applying every pending action to `base` from oldest
    /// to newest, and returns the resulting state.
    ///
    /// Returns `base` unchanged when nothing is pending.
    pub fn process(&self, base: S) -> S {
        let snapshot = core::mem::take(&mut *self.shared.borrow_mut());
        let Some(pending) = snapshot.pending else {
            return base;
        };

        let first = snapshot.ring[pending as usize].next;
        let mut order = Vec::with_capacity(snapshot.ring.len());
        let mut idx = first;
        loop {
            order.push(idx);
            idx = snapshot.ring[idx as usize].next;
            if idx == first {
                break;
            }
        }

        let mut actions: Vec<Option<UpdateAction<S>>> = snapshot
            .ring
            .into_iter()
            .map(|update| Some(update.action))
            .collect();
        let mut state = base;
        for idx in order {
            if let Some(action) = actions[idx as usize].take() {
                state = action.apply(state);
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn empty_queue_returns_base() {
        let queue = UpdateQueue::<i32>::new();
        assert!(queue.is_empty());
        assert_eq!(queue.process(7), 7);
    }

    #[test]
    fn ring_of_one_points_to_itself() {
        let queue = UpdateQueue::new();
        queue.enqueue(create_update(UpdateAction::Replace(1)));
        let shared = queue.shared.borrow();
        assert_eq!(shared.pending, Some(0));
        assert_eq!(shared.ring[0].next, 0);
    }

    #[test]
    fn pending_next_is_oldest() {
        let queue = UpdateQueue::new();
        for n in 0..4 {
            queue.enqueue(create_update(UpdateAction::Replace(n)));
        }
        let shared = queue.shared.borrow();
        let pending = shared.pending.unwrap();
        assert_eq!(pending, 3, "pending is the newest update");
        assert_eq!(shared.ring[pending as usize].next, 0, "pending.next is the oldest");
    }

    #[test]
    fn applies_all_actions_once_in_insertion_order() {
        let queue = UpdateQueue::<Vec<u32>>::new();
        for n in 0..5 {
            queue.enqueue(create_update(UpdateAction::transform(move |mut log: Vec<u32>| {
                log.push(n);
                log
            })));
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.process(Vec::new()), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn replace_and_transform_interleave() {
        let queue = UpdateQueue::new();
        queue.enqueue(create_update(UpdateAction::transform(|s: i32| s + 1)));
        queue.enqueue(create_update(UpdateAction::Replace(10)));
        queue.enqueue(create_update(UpdateAction::transform(|s: i32| s * 2)));
        assert_eq!(queue.process(0), 20);
    }

    #[test]
    fn second_process_is_a_no_op() {
        let queue = UpdateQueue::new();
        queue.enqueue(create_update(UpdateAction::transform(|s: i32| s + 1)));
        let once = queue.process(0);
        assert!(queue.is_empty());
        assert_eq!(queue.process(once), once);
    }

    #[test]
    fn updates_enqueued_during_drain_wait_for_next_drain() {
        let queue = UpdateQueue::new();
        let handle = queue.clone();
        queue.enqueue(create_update(UpdateAction::transform(move |s: i32| {
            handle.enqueue(create_update(UpdateAction::transform(|s: i32| s + 100)));
            s + 1
        })));
        assert_eq!(queue.process(0), 1);
        assert!(!queue.is_empty());
        assert_eq!(queue.process(1), 101);
    }

    #[test]
    fn clones_share_the_ring() {
        let a = UpdateQueue::new();
        let b = a.clone();
        assert!(a.shares_ring_with(&b));
        b.enqueue(create_update(UpdateAction::Replace(5)));
        assert_eq!(a.process(0), 5);
        assert!(b.is_empty());
    }
}
