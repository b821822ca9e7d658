// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Commit contract for host integrations.
//!
//! Weft stops at the end of the render phase: a pass produces a finished
//! work-in-progress tree whose fibers carry [`FiberFlags`] and whose
//! `subtree_flags` summarize everything below them. Turning that into host
//! mutations is the job of a *committer* supplied by the host adapter.
//!
//! The committer reads the finished tree through the [`FiberStore`] getters
//! and may write host handles back with
//! [`FiberStore::set_state_node`]. After it returns, the
//! [`FiberRoot`](crate::root::FiberRoot) makes the finished tree current and
//! reclaims arena slots that are no longer reachable.
//!
//! A committer can skip any subtree whose `subtree_flags` does not intersect
//! [`FiberFlags::MUTATION_MASK`].

use crate::fiber::{FiberId, FiberStore};
#[cfg(doc)]
use crate::flags::FiberFlags;

/// Applies a finished render pass to a host tree.
///
/// Host adapters and test doubles implement this trait, enabling generic
/// flush loops.
///
/// ```rust,ignore
/// root.update_container(app)?;
/// root.commit(&mut dom_committer);
///
/// // Later, after hook dispatches:
/// root.flush_sync_work(&mut dom_committer)?;
/// ```
pub trait Committer {
    /// Applies the tree rooted at the finished host root `finished`.
    fn commit_root(&mut self, store: &mut FiberStore, finished: FiberId);
}

/// A [`Committer`] that applies nothing.
///
/// Useful when only the fiber tree itself is of interest.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCommitter;

impl Committer for NoopCommitter {
    fn commit_root(&mut self, store: &mut FiberStore, finished: FiberId) {
        _ = (store, finished);
    }
}
