// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-phase traversal.
//!
//! A render pass walks the work-in-progress tree depth-first with an explicit
//! cursor ([`WorkLoop`]) instead of recursion:
//!
//! 1. **Begin** the unit under the cursor ([`begin_work`]). Its kind decides
//!    where its children come from; they are reconciled and the first child
//!    is returned.
//! 2. If there is a child, move the cursor to it.
//! 3. Otherwise **complete** the unit ([`complete_work`]) and move to its
//!    sibling. Without a sibling, walk up through `return`, completing each
//!    ancestor, until a sibling is found or the root completes.
//!
//! Completion runs strictly after all of a fiber's descendants completed, so
//! [`bubble_properties`] always sees final child flags.

use alloc::rc::Rc;

use crate::element::{ElementType, Node};
use crate::error::RenderError;
use crate::fiber::{FiberId, FiberStore, WorkTag};
use crate::flags::FiberFlags;
use crate::hooks::{ScheduleHandle, render_with_hooks};
use crate::reconcile::reconcile_children;
use crate::trace::Tracer;
#[cfg(feature = "trace-rich")]
use crate::trace::{UnitEvent, UnitPhase};

/// Borrowed state shared by every unit of work in one pass.
pub struct RenderPass<'a, 't> {
    store: &'a mut FiberStore,
    schedule: &'a ScheduleHandle,
    tracer: &'a mut Tracer<'t>,
    units_of_work: u32,
}

impl core::fmt::Debug for RenderPass<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderPass")
            .field("units_of_work", &self.units_of_work)
            .finish_non_exhaustive()
    }
}

impl<'a, 't> RenderPass<'a, 't> {
    /// Creates a pass over `store`.
    ///
    /// Hook dispatchers created during the pass report to `schedule`.
    pub fn new(
        store: &'a mut FiberStore,
        schedule: &'a ScheduleHandle,
        tracer: &'a mut Tracer<'t>,
    ) -> Self {
        Self {
            store,
            schedule,
            tracer,
            units_of_work: 0,
        }
    }

    /// Returns the store being rendered into.
    #[must_use]
    pub fn store(&self) -> &FiberStore {
        self.store
    }

    /// Returns the number of fibers begun so far.
    #[must_use]
    pub fn units_of_work(&self) -> u32 {
        self.units_of_work
    }
}

/// Performs the begin half of a unit of work and returns `wip`'s new first
/// child.
///
/// `current` is the committed version of `wip` (its alternate), or `None`
/// while mounting. On success `pending_props` become `memoized_props`.
///
/// # Errors
///
/// Propagates update queue and hook errors; see [`RenderError`].
pub fn begin_work(
    pass: &mut RenderPass<'_, '_>,
    current: Option<FiberId>,
    wip: FiberId,
) -> Result<Option<FiberId>, RenderError> {
    pass.units_of_work += 1;
    let store = &mut *pass.store;
    let tag = store.tag(wip);
    let child = match tag {
        WorkTag::HostRoot => {
            store.process_update_queue(wip)?;
            let node = store
                .memoized_state(wip)
                .element()
                .cloned()
                .unwrap_or_default();
            reconcile_children(store, current, wip, &node, pass.tracer)
        }
        WorkTag::HostComponent => {
            let node = store
                .pending_props(wip)
                .map(|props| props.children().clone())
                .unwrap_or_default();
            reconcile_children(store, current, wip, &node, pass.tracer)
        }
        WorkTag::FunctionComponent => {
            let props = store.pending_props(wip).cloned().unwrap_or_default();
            let node = match store.element_type(wip).cloned() {
                Some(ElementType::Component(component)) => {
                    render_with_hooks(store, wip, &component, &props, pass.schedule)?
                }
                // A bare fiber created without a component renders nothing.
                _ => Node::Empty,
            };
            reconcile_children(store, current, wip, &node, pass.tracer)
        }
        WorkTag::HostText => None,
    };
    store.memoize_pending_props(wip);

    #[cfg(feature = "trace-rich")]
    pass.tracer.unit(&UnitEvent {
        fiber: wip,
        tag,
        phase: UnitPhase::Begin,
        flags: store.flags(wip),
    });

    Ok(child)
}

/// Performs the complete half of a unit of work.
///
/// Aggregates child flags into `wip`'s `subtree_flags` for every kind. Host
/// and text fibers that already exist in the committed tree additionally get
/// [`FiberFlags::UPDATE`] when their own content changed: attributes for a
/// host fiber (its children are fibers of their own), the text for a text
/// fiber.
pub fn complete_work(store: &mut FiberStore, current: Option<FiberId>, wip: FiberId) {
    let tag = store.tag(wip);
    if let (Some(current), WorkTag::HostComponent | WorkTag::HostText) = (current, tag) {
        let changed = match (store.memoized_props(current), store.memoized_props(wip)) {
            (Some(old), Some(new)) if Rc::ptr_eq(old, new) => false,
            (Some(old), Some(new)) if tag == WorkTag::HostComponent => !old.same_attrs(new),
            (Some(old), Some(new)) => old != new,
            (old, new) => old.is_some() != new.is_some(),
        };
        if changed {
            store.insert_flags(wip, FiberFlags::UPDATE);
        }
    }
    bubble_properties(store, wip);
}

/// Sets `wip`'s `subtree_flags` to the OR of `flags | subtree_flags` over its
/// direct children.
pub fn bubble_properties(store: &mut FiberStore, wip: FiberId) {
    let subtree_flags = store
        .children(wip)
        .fold(FiberFlags::empty(), |acc, child| {
            acc | store.flags(child) | store.subtree_flags(child)
        });
    store.set_subtree_flags(wip, subtree_flags);
}

/// Resumable depth-first cursor over a work-in-progress tree.
#[derive(Clone, Copy, Debug)]
pub struct WorkLoop {
    root: FiberId,
    next_unit: Option<FiberId>,
}

impl WorkLoop {
    /// Starts a traversal at the work-in-progress host root.
    #[must_use]
    pub fn new(root: FiberId) -> Self {
        Self {
            root,
            next_unit: Some(root),
        }
    }

    /// Returns the fiber the next [`step`](Self::step) will begin.
    #[must_use]
    pub fn next_unit(&self) -> Option<FiberId> {
        self.next_unit
    }

    /// Returns whether the root has completed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.next_unit.is_none()
    }

    /// Performs one unit of work.
    ///
    /// Returns `Ok(true)` while work remains.
    ///
    /// # Errors
    ///
    /// Propagates [`begin_work`] errors. The cursor is left on the failing
    /// unit.
    pub fn step(&mut self, pass: &mut RenderPass<'_, '_>) -> Result<bool, RenderError> {
        let Some(unit) = self.next_unit else {
            return Ok(false);
        };
        let current = pass.store.alternate(unit);
        match begin_work(pass, current, unit)? {
            Some(child) => self.next_unit = Some(child),
            None => self.complete_unit_of_work(pass, unit),
        }
        Ok(self.next_unit.is_some())
    }

    /// Runs [`step`](Self::step) until the root completes.
    ///
    /// # Errors
    ///
    /// Stops at the first error.
    pub fn run(&mut self, pass: &mut RenderPass<'_, '_>) -> Result<(), RenderError> {
        while self.step(pass)? {}
        Ok(())
    }

    fn complete_unit_of_work(&mut self, pass: &mut RenderPass<'_, '_>, unit: FiberId) {
        let mut completed = unit;
        loop {
            let current = pass.store.alternate(completed);
            complete_work(pass.store, current, completed);

            #[cfg(feature = "trace-rich")]
            pass.tracer.unit(&UnitEvent {
                fiber: completed,
                tag: pass.store.tag(completed),
                phase: UnitPhase::Complete,
                flags: pass.store.flags(completed),
            });

            if completed == self.root {
                self.next_unit = None;
                return;
            }
            if let Some(sibling) = pass.store.sibling(completed) {
                self.next_unit = Some(sibling);
                return;
            }
            match pass.store.return_fiber(completed) {
                Some(parent) => completed = parent,
                None => {
                    self.next_unit = None;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::*;
    use crate::element::{Component, Element, Props, TextContent};
    use crate::fiber::HostToken;
    use crate::update_queue::{UpdateAction, create_update};

    /// Builds a committed-looking root and its work-in-progress with `node`
    /// queued as the root element.
    fn root_with(store: &mut FiberStore, node: Node) -> (FiberId, FiberId) {
        let current = store.create_host_root_fiber(HostToken(0));
        store.initialize_update_queue(current);
        store.enqueue_update(current, create_update(UpdateAction::Replace(node)));
        let wip = store.create_work_in_progress(current, None);
        (current, wip)
    }

    #[test]
    fn bubbling_is_the_or_over_direct_children() {
        let mut store = FiberStore::new();
        let parent = store.create_fiber(WorkTag::HostComponent, None, None);
        let child = store.create_fiber(WorkTag::HostText, None, None);
        store.set_child(parent, Some(child));
        store.attach_only_child(parent, child);
        store.insert_flags(child, FiberFlags::PLACEMENT);
        store.set_subtree_flags(child, FiberFlags::UPDATE);
        store.insert_flags(parent, FiberFlags::UPDATE);

        bubble_properties(&mut store, parent);
        assert_eq!(
            store.subtree_flags(parent),
            FiberFlags::PLACEMENT | FiberFlags::UPDATE
        );
        assert_eq!(store.flags(parent), FiberFlags::UPDATE, "own flags untouched");
    }

    #[test]
    fn bubbling_a_leaf_clears_subtree_flags() {
        let mut store = FiberStore::new();
        let leaf = store.create_fiber(WorkTag::HostText, None, None);
        store.set_subtree_flags(leaf, FiberFlags::UPDATE);
        bubble_properties(&mut store, leaf);
        assert_eq!(store.subtree_flags(leaf), FiberFlags::empty());
    }

    #[test]
    fn root_without_queue_aborts() {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(HostToken(0));
        let wip = store.create_work_in_progress(current, None);
        let schedule = ScheduleHandle::default();
        let mut tracer = Tracer::none();
        let mut pass = RenderPass::new(&mut store, &schedule, &mut tracer);
        let mut work = WorkLoop::new(wip);
        assert_eq!(
            work.run(&mut pass),
            Err(RenderError::MissingUpdateQueue(wip))
        );
        assert_eq!(work.next_unit(), Some(wip));
    }

    #[test]
    fn loop_visits_depth_first_and_completes_at_root() {
        let mut store = FiberStore::new();
        let tree = Element::host("div").with_children(Element::host("span").with_children("hi"));
        let (_, wip) = root_with(&mut store, tree.into());

        let schedule = ScheduleHandle::default();
        let mut tracer = Tracer::none();
        let mut pass = RenderPass::new(&mut store, &schedule, &mut tracer);
        let mut work = WorkLoop::new(wip);
        let mut begun = Vec::new();
        while let Some(unit) = work.next_unit() {
            begun.push(pass.store().tag(unit));
            work.step(&mut pass).unwrap();
        }
        assert!(work.is_done());
        assert_eq!(pass.units_of_work(), 4);
        assert_eq!(
            begun,
            [
                WorkTag::HostRoot,
                WorkTag::HostComponent,
                WorkTag::HostComponent,
                WorkTag::HostText
            ]
        );

        let div = store.child(wip).unwrap();
        let span = store.child(div).unwrap();
        let text = store.child(span).unwrap();
        assert_eq!(store.text(text), Some(&TextContent::Str("hi".into())));
        assert_eq!(store.flags(div), FiberFlags::PLACEMENT);
        assert_eq!(store.flags(span), FiberFlags::empty());
        assert_eq!(store.subtree_flags(wip), FiberFlags::PLACEMENT);
        assert_eq!(store.subtree_flags(div), FiberFlags::empty());
    }

    #[test]
    fn function_component_output_is_reconciled() {
        let greet = Component::new("Greet", |props, _| {
            Element::host("p")
                .with_children(String::from(props.str("name").unwrap_or("nobody")))
                .into()
        });
        let mut store = FiberStore::new();
        let (_, wip) = root_with(
            &mut store,
            Element::component(&greet).with_prop("name", "weft").into(),
        );
        let schedule = ScheduleHandle::default();
        let mut tracer = Tracer::none();
        WorkLoop::new(wip)
            .run(&mut RenderPass::new(&mut store, &schedule, &mut tracer))
            .unwrap();

        let component = store.child(wip).unwrap();
        assert_eq!(store.tag(component), WorkTag::FunctionComponent);
        let p = store.child(component).unwrap();
        let text = store.child(p).unwrap();
        assert_eq!(store.text(text), Some(&TextContent::Str("weft".into())));
    }

    #[test]
    fn changed_props_on_existing_host_fiber_flag_update() {
        let mut store = FiberStore::new();
        let current = store.create_fiber_from_element(&Element::host("span").with_prop("id", 1));
        store.memoize_pending_props(current);
        let wip = store.create_work_in_progress(
            current,
            Some(Rc::new(Props::new().with("id", 2))),
        );
        store.memoize_pending_props(wip);

        complete_work(&mut store, Some(current), wip);
        assert!(store.flags(wip).contains(FiberFlags::UPDATE));
    }

    #[test]
    fn unchanged_props_do_not_flag_update() {
        let mut store = FiberStore::new();
        let el = Element::host("span").with_prop("id", 1);
        let current = store.create_fiber_from_element(&el);
        store.memoize_pending_props(current);
        let wip = store.create_work_in_progress(current, Some(Rc::new((*el.props).clone())));
        store.memoize_pending_props(wip);

        complete_work(&mut store, Some(current), wip);
        assert_eq!(store.flags(wip), FiberFlags::empty());
    }

    #[test]
    fn new_children_alone_do_not_flag_host_update() {
        let mut store = FiberStore::new();
        let el = Element::host("p").with_prop("id", 1).with_children("a");
        let current = store.create_fiber_from_element(&el);
        store.memoize_pending_props(current);
        let wip = store.create_work_in_progress(
            current,
            Some(Rc::new(Props::new().with("id", 1).with_children("b"))),
        );
        store.memoize_pending_props(wip);

        complete_work(&mut store, Some(current), wip);
        assert_eq!(store.flags(wip), FiberFlags::empty());
    }
}
