// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays fiber storage with allocation, double buffering, and
//! update queue management.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{FiberId, HostToken, INVALID};
use super::traverse::{Ancestors, Children, Descendants};
use crate::dirty;
use crate::element::{Element, ElementType, Key, Node, Props, TextContent};
use crate::error::RenderError;
use crate::flags::FiberFlags;
use crate::hooks::HookState;
use crate::update_queue::{Update, UpdateQueue};

/// The kind of a fiber.
///
/// Begin-work and complete-work match on this exhaustively, so adding a kind
/// is a compile-time decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkTag {
    /// The sentinel at the top of every tree, owned by a root container.
    HostRoot,
    /// A host primitive such as `"span"`.
    HostComponent,
    /// A function component.
    FunctionComponent,
    /// A text leaf.
    HostText,
}

impl WorkTag {
    /// Returns the kind a fiber created from an element of type `ty` has.
    #[must_use]
    pub const fn for_element_type(ty: &ElementType) -> Self {
        match ty {
            ElementType::Host(_) => Self::HostComponent,
            ElementType::Component(_) => Self::FunctionComponent,
            ElementType::Text => Self::HostText,
        }
    }
}

/// State memoized on a fiber by the last pass that rendered it.
#[derive(Clone, Debug, Default)]
pub enum MemoizedState {
    /// Nothing memoized (host and text fibers, fresh fibers).
    #[default]
    Empty,
    /// The element rendered under a host root.
    Element(Node),
    /// The hook list of a function component.
    Hooks(Vec<HookState>),
}

impl MemoizedState {
    /// Returns the memoized element, if this is a host root state.
    #[must_use]
    pub fn element(&self) -> Option<&Node> {
        match self {
            Self::Element(node) => Some(node),
            _ => None,
        }
    }
}

/// Struct-of-arrays storage for all fibers of a root.
///
/// Fibers are addressed by [`FiberId`] handles. Internally, each fiber
/// occupies a slot in parallel arrays. Reclaimed fibers are recycled via a
/// free list, and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct FiberStore {
    // -- Identity --
    pub(crate) tag: Vec<WorkTag>,
    pub(crate) key: Vec<Option<Key>>,
    pub(crate) ty: Vec<Option<ElementType>>,
    pub(crate) state_node: Vec<Option<HostToken>>,

    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) index: Vec<u32>,

    // -- Content --
    pub(crate) pending_props: Vec<Option<Rc<Props>>>,
    pub(crate) memoized_props: Vec<Option<Rc<Props>>>,
    pub(crate) memoized_state: Vec<MemoizedState>,
    pub(crate) update_queue: Vec<Option<UpdateQueue<Node>>>,

    // -- Double buffering --
    pub(crate) alternate: Vec<u32>,

    // -- Effects --
    pub(crate) flags: Vec<FiberFlags>,
    pub(crate) subtree_flags: Vec<FiberFlags>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    /// Per-slot mirror of `free_list` membership.
    pub(crate) free: Vec<bool>,
    pub(crate) len: u32,

    // -- Scheduling --
    pub(crate) dirty: DirtyTracker<u32>,
}

impl Default for FiberStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FiberStore {
    /// Creates an empty fiber store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: Vec::new(),
            key: Vec::new(),
            ty: Vec::new(),
            state_node: Vec::new(),
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            index: Vec::new(),
            pending_props: Vec::new(),
            memoized_props: Vec::new(),
            memoized_state: Vec::new(),
            update_queue: Vec::new(),
            alternate: Vec::new(),
            flags: Vec::new(),
            subtree_flags: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            free: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation API --

    /// Creates a detached fiber of kind `tag`.
    ///
    /// Every other field starts empty: no type, no host handle, no links, no
    /// memoized props or state, no update queue, no alternate, no flags.
    pub fn create_fiber(
        &mut self,
        tag: WorkTag,
        pending_props: Option<Rc<Props>>,
        key: Option<Key>,
    ) -> FiberId {
        let idx = self.alloc_slot();
        let i = idx as usize;
        self.tag[i] = tag;
        self.key[i] = key;
        self.pending_props[i] = pending_props;
        self.id_at(idx)
    }

    /// Creates the sentinel host root fiber for a container.
    ///
    /// The root has no type; its `state_node` is the container token.
    pub fn create_host_root_fiber(&mut self, container: HostToken) -> FiberId {
        let id = self.create_fiber(WorkTag::HostRoot, None, None);
        self.state_node[id.idx as usize] = Some(container);
        id
    }

    /// Creates a detached fiber for `element`, copying its type and key.
    pub fn create_fiber_from_element(&mut self, element: &Element) -> FiberId {
        let tag = WorkTag::for_element_type(&element.ty);
        let id = self.create_fiber(
            tag,
            Some(Rc::clone(&element.props)),
            element.key.clone(),
        );
        self.ty[id.idx as usize] = Some(element.ty.clone());
        id
    }

    /// Returns the work-in-progress counterpart of `current`.
    ///
    /// On the first call for a position the alternate is allocated, copying
    /// the stable identity (`tag`, `key`, `type`, `state_node`) and linking
    /// both fibers mutually. Later calls reuse that same alternate and only
    /// overwrite its `pending_props`. In both cases the alternate's flags are
    /// reset and `child`, `memoized_props`, `memoized_state`, `update_queue`,
    /// `sibling` and `index` are copied from `current`: children are assumed
    /// unchanged until begin-work reconciles them.
    ///
    /// # Panics
    ///
    /// Panics if `current` is stale.
    pub fn create_work_in_progress(
        &mut self,
        current: FiberId,
        pending_props: Option<Rc<Props>>,
    ) -> FiberId {
        self.validate(current);
        let c = current.idx as usize;

        let wip = if self.alternate[c] == INVALID {
            let idx = self.alloc_slot();
            let w = idx as usize;
            self.tag[w] = self.tag[c];
            self.key[w] = self.key[c].clone();
            self.ty[w] = self.ty[c].clone();
            self.state_node[w] = self.state_node[c];
            self.pending_props[w] = pending_props;
            self.alternate[w] = current.idx;
            self.alternate[c] = idx;
            idx
        } else {
            let idx = self.alternate[c];
            self.pending_props[idx as usize] = pending_props;
            idx
        };

        let w = wip as usize;
        self.flags[w] = FiberFlags::empty();
        self.subtree_flags[w] = FiberFlags::empty();

        self.first_child[w] = self.first_child[c];
        self.memoized_props[w] = self.memoized_props[c].clone();
        self.memoized_state[w] = self.memoized_state[c].clone();
        self.update_queue[w] = self.update_queue[c].clone();
        self.next_sibling[w] = self.next_sibling[c];
        self.index[w] = self.index[c];

        self.id_at(wip)
    }

    /// Returns whether the given handle refers to a live fiber.
    #[must_use]
    pub fn is_alive(&self, id: FiberId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free[id.idx as usize]
    }

    /// Returns the number of live fibers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Update queue API --

    /// Attaches an empty update queue to `id`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn initialize_update_queue(&mut self, id: FiberId) {
        self.validate(id);
        self.update_queue[id.idx as usize] = Some(UpdateQueue::new());
    }

    /// Appends `update` to the queue of `id` and schedules the fiber.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the fiber has no update queue.
    pub fn enqueue_update(&mut self, id: FiberId, update: Update<Node>) {
        self.validate(id);
        let queue = self.update_queue[id.idx as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("{id:?} has no update queue"));
        queue.enqueue(update);
        self.schedule_update_on_fiber(id);
    }

    /// Drains the update queue of `id` into its memoized element.
    ///
    /// The running state is seeded from the fiber's memoized element (or
    /// [`Node::Empty`]). Does nothing when no update is pending.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingUpdateQueue`] if the fiber has no queue.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn process_update_queue(&mut self, id: FiberId) -> Result<(), RenderError> {
        self.validate(id);
        let i = id.idx as usize;
        let Some(queue) = self.update_queue[i].clone() else {
            return Err(RenderError::MissingUpdateQueue(id));
        };
        if queue.is_empty() {
            return Ok(());
        }
        let base = match core::mem::take(&mut self.memoized_state[i]) {
            MemoizedState::Element(node) => node,
            _ => Node::Empty,
        };
        self.memoized_state[i] = MemoizedState::Element(queue.process(base));
        Ok(())
    }

    /// Marks `id` and all of its ancestors as having scheduled work.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn schedule_update_on_fiber(&mut self, id: FiberId) {
        self.validate(id);
        self.dirty
            .mark_with(id.idx, dirty::SCHEDULED, &EagerPolicy);
    }

    /// Drains the scheduled set, returning raw slot indices in deterministic
    /// order.
    pub fn take_scheduled(&mut self) -> Vec<u32> {
        self.dirty
            .drain(dirty::SCHEDULED)
            .deterministic()
            .run()
            .collect()
    }

    // -- Getters --

    /// Returns the kind of a fiber.
    #[must_use]
    pub fn tag(&self, id: FiberId) -> WorkTag {
        self.validate(id);
        self.tag[id.idx as usize]
    }

    /// Returns the key of a fiber.
    #[must_use]
    pub fn key(&self, id: FiberId) -> Option<&Key> {
        self.validate(id);
        self.key[id.idx as usize].as_ref()
    }

    /// Returns the element type of a fiber (`None` for the host root).
    #[must_use]
    pub fn element_type(&self, id: FiberId) -> Option<&ElementType> {
        self.validate(id);
        self.ty[id.idx as usize].as_ref()
    }

    /// Returns the host handle of a fiber.
    #[must_use]
    pub fn state_node(&self, id: FiberId) -> Option<HostToken> {
        self.validate(id);
        self.state_node[id.idx as usize]
    }

    /// Sets the host handle of a fiber.
    ///
    /// Written by the committer when it instantiates the host node; the tree
    /// itself never interprets the token.
    pub fn set_state_node(&mut self, id: FiberId, token: Option<HostToken>) {
        self.validate(id);
        self.state_node[id.idx as usize] = token;
    }

    /// Returns the parent (`return`) of a fiber, if any.
    #[must_use]
    pub fn return_fiber(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.parent[id.idx as usize])
    }

    /// Returns the first child of a fiber, if any.
    #[must_use]
    pub fn child(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.first_child[id.idx as usize])
    }

    /// Returns the next sibling of a fiber, if any.
    #[must_use]
    pub fn sibling(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.next_sibling[id.idx as usize])
    }

    /// Returns the position of a fiber among its siblings.
    #[must_use]
    pub fn index(&self, id: FiberId) -> u32 {
        self.validate(id);
        self.index[id.idx as usize]
    }

    /// Returns an iterator over the direct children of a fiber.
    #[must_use]
    pub fn children(&self, id: FiberId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator over the `return` chain above a fiber.
    #[must_use]
    pub fn ancestors(&self, id: FiberId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, self.parent[id.idx as usize])
    }

    /// Returns an iterator over the subtree rooted at `id` in depth-first
    /// pre-order, starting with `id` itself.
    #[must_use]
    pub fn descendants(&self, id: FiberId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx)
    }

    /// Returns the nearest ancestor that owns a host node: a host component
    /// or the host root.
    ///
    /// This is where a committer inserts the host node of a placed fiber;
    /// function components in between have no host node of their own.
    #[must_use]
    pub fn host_parent(&self, id: FiberId) -> Option<FiberId> {
        self.ancestors(id).find(|&a| {
            matches!(
                self.tag[a.idx as usize],
                WorkTag::HostComponent | WorkTag::HostRoot
            )
        })
    }

    /// Returns the props of the pass in flight.
    #[must_use]
    pub fn pending_props(&self, id: FiberId) -> Option<&Rc<Props>> {
        self.validate(id);
        self.pending_props[id.idx as usize].as_ref()
    }

    /// Returns the props of the last pass that rendered this fiber.
    #[must_use]
    pub fn memoized_props(&self, id: FiberId) -> Option<&Rc<Props>> {
        self.validate(id);
        self.memoized_props[id.idx as usize].as_ref()
    }

    /// Returns the state memoized on a fiber.
    #[must_use]
    pub fn memoized_state(&self, id: FiberId) -> &MemoizedState {
        self.validate(id);
        &self.memoized_state[id.idx as usize]
    }

    /// Returns the update queue of a fiber, if it has one.
    #[must_use]
    pub fn update_queue(&self, id: FiberId) -> Option<&UpdateQueue<Node>> {
        self.validate(id);
        self.update_queue[id.idx as usize].as_ref()
    }

    /// Returns the other version of this tree position, if allocated.
    #[must_use]
    pub fn alternate(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.alternate[id.idx as usize])
    }

    /// Returns the fiber's own effect flags.
    #[must_use]
    pub fn flags(&self, id: FiberId) -> FiberFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the aggregated effect flags of the fiber's descendants.
    #[must_use]
    pub fn subtree_flags(&self, id: FiberId) -> FiberFlags {
        self.validate(id);
        self.subtree_flags[id.idx as usize]
    }

    /// Returns the content of a text fiber.
    ///
    /// Prefers memoized props, falling back to pending props for a fiber
    /// that has not finished begin-work yet. Returns `None` for other kinds.
    #[must_use]
    pub fn text(&self, id: FiberId) -> Option<&TextContent> {
        self.validate(id);
        let i = id.idx as usize;
        if self.tag[i] != WorkTag::HostText {
            return None;
        }
        self.memoized_props[i]
            .as_ref()
            .or(self.pending_props[i].as_ref())
            .and_then(|props| props.children().as_text())
    }

    /// Returns whether `id` was created from an element of the same type and
    /// key as `element`, so it can be reused for it.
    #[must_use]
    pub fn matches_element(&self, id: FiberId, element: &Element) -> bool {
        self.validate(id);
        let i = id.idx as usize;
        self.key[i] == element.key && self.ty[i].as_ref() == Some(&element.ty)
    }

    // -- Render-phase mutation (crate-internal) --

    pub(crate) fn set_child(&mut self, parent: FiberId, child: Option<FiberId>) {
        self.first_child[parent.idx as usize] = FiberId::link(child);
    }

    /// Attaches `child` under `parent` as its only child.
    ///
    /// Sets `return`, clears the sibling link and index, and records the
    /// scheduling dependency so updates below `child` mark `parent`.
    pub(crate) fn attach_only_child(&mut self, parent: FiberId, child: FiberId) {
        let c = child.idx as usize;
        self.parent[c] = parent.idx;
        self.next_sibling[c] = INVALID;
        self.index[c] = 0;
        let _ = self
            .dirty
            .add_dependency(parent.idx, child.idx, dirty::SCHEDULED);
    }

    pub(crate) fn insert_flags(&mut self, id: FiberId, flags: FiberFlags) {
        self.flags[id.idx as usize] |= flags;
    }

    pub(crate) fn set_subtree_flags(&mut self, id: FiberId, flags: FiberFlags) {
        self.subtree_flags[id.idx as usize] = flags;
    }

    /// Promotes `pending_props` to `memoized_props` after begin-work.
    pub(crate) fn memoize_pending_props(&mut self, id: FiberId) {
        let i = id.idx as usize;
        self.memoized_props[i] = self.pending_props[i].clone();
    }

    pub(crate) fn set_memoized_state(&mut self, id: FiberId, state: MemoizedState) {
        self.memoized_state[id.idx as usize] = state;
    }

    /// Moves the hook list out of `id`'s memoized state.
    pub(crate) fn take_hooks(&mut self, id: FiberId) -> Vec<HookState> {
        match core::mem::take(&mut self.memoized_state[id.idx as usize]) {
            MemoizedState::Hooks(list) => list,
            _ => Vec::new(),
        }
    }

    // -- Reclamation --

    /// Frees every slot not reachable from `root` or from the alternate of a
    /// reachable fiber, and returns how many were freed.
    ///
    /// Alternates kept outside the tree have links into freed slots cleared;
    /// they are re-linked by the next
    /// [`create_work_in_progress`](Self::create_work_in_progress) anyway.
    pub(crate) fn collect_garbage(&mut self, root: FiberId) -> usize {
        self.collect_garbage_into(root, &mut Vec::new())
    }

    /// Like [`collect_garbage`](Self::collect_garbage), also moving the hook
    /// lists of reclaimed function components into `released` so their
    /// effect cleanups can run.
    pub(crate) fn collect_garbage_into(
        &mut self,
        root: FiberId,
        released: &mut Vec<Vec<HookState>>,
    ) -> usize {
        self.validate(root);
        let mut keep = vec![false; self.len as usize];
        let mut stack = vec![root.idx];
        while let Some(idx) = stack.pop() {
            keep[idx as usize] = true;
            let alt = self.alternate[idx as usize];
            if alt != INVALID {
                keep[alt as usize] = true;
            }
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }

        let mut freed = 0;
        for idx in 0..self.len {
            if keep[idx as usize] || self.free[idx as usize] {
                continue;
            }
            if let MemoizedState::Hooks(list) = self.release_slot(idx) {
                released.push(list);
            }
            freed += 1;
        }

        for i in 0..self.len as usize {
            if !keep[i] {
                continue;
            }
            for link in [
                &mut self.parent[i],
                &mut self.first_child[i],
                &mut self.next_sibling[i],
                &mut self.alternate[i],
            ] {
                if *link != INVALID && !keep[*link as usize] {
                    *link = INVALID;
                }
            }
        }
        freed
    }

    // -- Internal helpers --

    pub(crate) fn id_at(&self, idx: u32) -> FiberId {
        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn link(&self, idx: u32) -> Option<FiberId> {
        if idx == INVALID {
            None
        } else {
            Some(self.id_at(idx))
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: FiberId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale FiberId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn alloc_slot(&mut self) -> u32 {
        if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.free[i] = false;
            self.generation[i] += 1;
            self.tag[i] = WorkTag::HostRoot;
            self.key[i] = None;
            self.ty[i] = None;
            self.state_node[i] = None;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.index[i] = 0;
            self.pending_props[i] = None;
            self.memoized_props[i] = None;
            self.memoized_state[i] = MemoizedState::Empty;
            self.update_queue[i] = None;
            self.alternate[i] = INVALID;
            self.flags[i] = FiberFlags::empty();
            self.subtree_flags[i] = FiberFlags::empty();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.tag.push(WorkTag::HostRoot);
            self.key.push(None);
            self.ty.push(None);
            self.state_node.push(None);
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.index.push(0);
            self.pending_props.push(None);
            self.memoized_props.push(None);
            self.memoized_state.push(MemoizedState::Empty);
            self.update_queue.push(None);
            self.alternate.push(INVALID);
            self.flags.push(FiberFlags::empty());
            self.subtree_flags.push(FiberFlags::empty());
            self.generation.push(0);
            self.free.push(false);
            idx
        }
    }

    /// Frees a slot and hands back its memoized state.
    fn release_slot(&mut self, idx: u32) -> MemoizedState {
        let i = idx as usize;
        self.dirty.remove_key(idx);
        // Drop content eagerly; the slot may sit on the free list for a while.
        self.pending_props[i] = None;
        self.memoized_props[i] = None;
        let state = core::mem::take(&mut self.memoized_state[i]);
        self.update_queue[i] = None;
        self.ty[i] = None;
        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;
        self.free[i] = true;
        self.free_list.push(idx);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::update_queue::{UpdateAction, create_update};

    fn host(tag: &'static str) -> Element {
        Element::host(tag)
    }

    #[test]
    fn fresh_fiber_fields_are_empty() {
        let mut store = FiberStore::new();
        let id = store.create_fiber(WorkTag::HostComponent, None, None);
        assert!(store.is_alive(id));
        assert_eq!(store.return_fiber(id), None);
        assert_eq!(store.child(id), None);
        assert_eq!(store.sibling(id), None);
        assert_eq!(store.alternate(id), None);
        assert_eq!(store.flags(id), FiberFlags::empty());
        assert_eq!(store.subtree_flags(id), FiberFlags::empty());
        assert!(store.update_queue(id).is_none());
        assert!(matches!(store.memoized_state(id), MemoizedState::Empty));
    }

    #[test]
    fn host_root_holds_container_token() {
        let mut store = FiberStore::new();
        let root = store.create_host_root_fiber(HostToken(7));
        assert_eq!(store.tag(root), WorkTag::HostRoot);
        assert_eq!(store.element_type(root), None);
        assert_eq!(store.state_node(root), Some(HostToken(7)));
    }

    #[test]
    fn fiber_from_element_copies_type_key_and_props() {
        let mut store = FiberStore::new();
        let el = host("div").with_key("a").with_prop("id", "x");
        let id = store.create_fiber_from_element(&el);
        assert_eq!(store.tag(id), WorkTag::HostComponent);
        assert_eq!(store.key(id).map(|k| k.as_ref()), Some("a"));
        assert!(store.matches_element(id, &el));
        assert!(!store.matches_element(id, &host("div")));
        assert!(Rc::ptr_eq(store.pending_props(id).unwrap(), &el.props));
    }

    #[test]
    fn work_in_progress_links_mutually() {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(HostToken(1));
        let wip = store.create_work_in_progress(current, None);
        assert_ne!(wip, current);
        assert_eq!(store.alternate(current), Some(wip));
        assert_eq!(store.alternate(wip), Some(current));
        assert_eq!(store.tag(wip), WorkTag::HostRoot);
        assert_eq!(store.state_node(wip), Some(HostToken(1)));
    }

    #[test]
    fn work_in_progress_is_reused_not_reallocated() {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(HostToken(1));
        let first = store.create_work_in_progress(current, None);
        let live = store.live_count();
        for _ in 0..3 {
            let again = store.create_work_in_progress(current, None);
            assert_eq!(again, first);
        }
        assert_eq!(store.live_count(), live);
        assert_eq!(store.alternate(first), Some(current));
    }

    #[test]
    fn work_in_progress_resets_flags_and_copies_content() {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(HostToken(1));
        store.initialize_update_queue(current);
        let child = store.create_fiber_from_element(&host("span"));
        store.set_child(current, Some(child));
        store.set_memoized_state(current, MemoizedState::Element(Node::from("hello")));

        let wip = store.create_work_in_progress(current, None);
        store.insert_flags(wip, FiberFlags::PLACEMENT);
        store.set_subtree_flags(wip, FiberFlags::UPDATE);

        let again = store.create_work_in_progress(current, None);
        assert_eq!(again, wip);
        assert_eq!(store.flags(wip), FiberFlags::empty());
        assert_eq!(store.subtree_flags(wip), FiberFlags::empty());
        assert_eq!(store.child(wip), Some(child));
        assert_eq!(
            store.memoized_state(wip).element(),
            Some(&Node::from("hello"))
        );
        assert!(
            store
                .update_queue(wip)
                .unwrap()
                .shares_ring_with(store.update_queue(current).unwrap())
        );
    }

    #[test]
    fn process_update_queue_is_idempotent() {
        let mut store = FiberStore::new();
        let root = store.create_host_root_fiber(HostToken(0));
        store.initialize_update_queue(root);
        store.enqueue_update(root, create_update(UpdateAction::Replace(Node::from(1))));
        store.process_update_queue(root).unwrap();
        assert_eq!(store.memoized_state(root).element(), Some(&Node::from(1)));
        store.process_update_queue(root).unwrap();
        assert_eq!(store.memoized_state(root).element(), Some(&Node::from(1)));
    }

    #[test]
    fn process_without_queue_is_an_error() {
        let mut store = FiberStore::new();
        let root = store.create_host_root_fiber(HostToken(0));
        assert_eq!(
            store.process_update_queue(root),
            Err(RenderError::MissingUpdateQueue(root))
        );
    }

    #[test]
    fn scheduling_a_child_marks_its_ancestors() {
        let mut store = FiberStore::new();
        let root = store.create_host_root_fiber(HostToken(0));
        let mid = store.create_fiber_from_element(&host("div"));
        let leaf = store.create_fiber_from_element(&host("span"));
        store.set_child(root, Some(mid));
        store.attach_only_child(root, mid);
        store.set_child(mid, Some(leaf));
        store.attach_only_child(mid, leaf);

        store.schedule_update_on_fiber(leaf);
        let scheduled = store.take_scheduled();
        assert!(scheduled.contains(&root.idx));
        assert!(scheduled.contains(&mid.idx));
        assert!(scheduled.contains(&leaf.idx));
        assert!(store.take_scheduled().is_empty(), "drain clears the set");
    }

    #[test]
    fn garbage_collection_keeps_tree_and_alternates() {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(HostToken(0));
        let wip = store.create_work_in_progress(current, None);
        let kept = store.create_fiber_from_element(&host("div"));
        store.set_child(wip, Some(kept));
        store.attach_only_child(wip, kept);
        let orphan = store.create_fiber_from_element(&host("p"));
        store.set_child(current, Some(orphan));

        let freed = store.collect_garbage(wip);
        assert_eq!(freed, 1);
        assert!(store.is_alive(current));
        assert!(store.is_alive(kept));
        assert!(!store.is_alive(orphan));
        assert_eq!(store.child(current), None, "dangling child link cleared");
    }

    #[test]
    fn freed_slot_is_recycled_with_new_generation() {
        let mut store = FiberStore::new();
        let root = store.create_host_root_fiber(HostToken(0));
        let orphan = store.create_fiber(WorkTag::HostText, None, None);
        assert_eq!(store.collect_garbage(root), 1);
        let reused = store.create_fiber(WorkTag::HostComponent, None, None);
        assert_eq!(reused.idx, orphan.idx);
        assert_ne!(reused.generation, orphan.generation);
        assert!(!store.is_alive(orphan));
    }

    #[test]
    fn free_slots_are_tracked_per_slot() {
        let mut store = FiberStore::new();
        let root = store.create_host_root_fiber(HostToken(0));
        let orphans: Vec<_> = (0..3)
            .map(|_| store.create_fiber(WorkTag::HostText, None, None))
            .collect();
        assert_eq!(store.collect_garbage(root), 3);
        assert!(orphans.iter().all(|&id| !store.is_alive(id)));
        assert_eq!(store.collect_garbage(root), 0, "free slots are not freed twice");

        let fresh: Vec<_> = (0..3)
            .map(|_| store.create_fiber(WorkTag::HostText, None, None))
            .collect();
        assert!(fresh.iter().all(|&id| store.is_alive(id)));
        assert_eq!(store.live_count(), 4);
    }

    #[test]
    fn walks_follow_links_within_one_tree() {
        let mut store = FiberStore::new();
        let root = store.create_host_root_fiber(HostToken(0));
        let app = store.create_fiber(WorkTag::FunctionComponent, None, None);
        let div = store.create_fiber_from_element(&host("div"));
        let text = store.create_fiber(WorkTag::HostText, None, None);
        for (parent, child) in [(root, app), (app, div), (div, text)] {
            store.set_child(parent, Some(child));
            store.attach_only_child(parent, child);
        }

        let up: Vec<_> = store.ancestors(text).collect();
        assert_eq!(up, [div, app, root]);
        assert_eq!(store.host_parent(text), Some(div));
        assert_eq!(store.host_parent(div), Some(root), "skips the component");
        assert_eq!(store.host_parent(root), None);

        let down: Vec<_> = store.descendants(root).collect();
        assert_eq!(down, [root, app, div, text]);
        let below_app: Vec<_> = store.descendants(app).collect();
        assert_eq!(below_app, [app, div, text]);
    }

    #[test]
    #[should_panic(expected = "stale FiberId")]
    fn reclaimed_handle_panics_on_access() {
        let mut store = FiberStore::new();
        let root = store.create_host_root_fiber(HostToken(0));
        let orphan = store.create_fiber(WorkTag::HostText, None, None);
        store.collect_garbage(root);
        let _ = store.tag(orphan);
    }

    #[test]
    #[should_panic(expected = "has no update queue")]
    fn enqueue_without_queue_panics() {
        let mut store = FiberStore::new();
        let id = store.create_fiber(WorkTag::HostComponent, None, None);
        store.enqueue_update(id, create_update(UpdateAction::Replace(Node::Empty)));
    }
}
