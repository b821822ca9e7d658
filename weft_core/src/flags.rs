// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect flags.
//!
//! Every fiber carries two [`FiberFlags`] masks:
//!
//! - `flags`: host mutations and effects this fiber itself needs at commit.
//! - `subtree_flags`: the OR of `flags | subtree_flags` over all direct
//!   children, maintained by [`complete_work`](crate::work::complete_work).
//!
//! Because `subtree_flags` is aggregated bottom-up during the render pass, a
//! committer can ask any fiber "does anything below you need touching?" in
//! constant time and skip clean subtrees without walking them.
//!
//! Both masks are reset to [`FiberFlags::empty`] whenever a fiber is
//! (re)used as a work-in-progress node.

use bitflags::bitflags;

bitflags! {
    /// Host mutations and effect work accumulated during a render pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FiberFlags: u32 {
        /// The fiber's host node must be inserted into its parent.
        ///
        /// Set by the child reconciler whenever it produces a child for a
        /// parent that already existed in the committed tree.
        const PLACEMENT = 1 << 1;

        /// The fiber's host node exists and its props changed.
        const UPDATE = 1 << 2;

        /// A function component has effects to run after commit.
        ///
        /// Set when at least one `use_effect` hook of the fiber saw its deps
        /// change (or mounted). Acted on by the root, not the committer.
        const PASSIVE = 1 << 3;

        /// Every flag the committer acts on during mutation.
        const MUTATION_MASK = Self::PLACEMENT.bits() | Self::UPDATE.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert_eq!(FiberFlags::default(), FiberFlags::empty());
        assert!(!FiberFlags::default().intersects(FiberFlags::MUTATION_MASK));
    }

    #[test]
    fn mutation_mask_covers_placement_and_update() {
        assert!(FiberFlags::MUTATION_MASK.contains(FiberFlags::PLACEMENT));
        assert!(FiberFlags::MUTATION_MASK.contains(FiberFlags::UPDATE));
        assert!(!FiberFlags::MUTATION_MASK.contains(FiberFlags::PASSIVE));
    }
}
