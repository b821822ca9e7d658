// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child reconciliation.
//!
//! Turns the [`Node`] a fiber rendered into that fiber's child. The
//! reconciler materializes **at most one** child per parent:
//!
//! - [`Node::Empty`] produces no child.
//! - [`Node::Text`] is wrapped in a synthetic text [`Element`] and produces
//!   a [`WorkTag::HostText`] fiber.
//! - [`Node::Element`] produces a fiber of the kind its type implies.
//! - [`Node::Fragment`] is reduced to its first entry. The remaining entries
//!   are dropped and reported through
//!   [`TraceSink::on_children_dropped`](crate::trace::TraceSink::on_children_dropped).
//!
//! When the parent's current first child was created from an element of the
//! same type and key, that fiber is reused through
//! [`FiberStore::create_work_in_progress`], which carries its memoized state
//! (and hence its hooks) into the new pass. Otherwise a fresh fiber is
//! created and the old one is left for the next commit to reclaim.
//!
//! There is no keyed list diffing and no deletion bookkeeping.
//!
//! [`WorkTag::HostText`]: crate::fiber::WorkTag::HostText

use alloc::rc::Rc;

use crate::element::{Element, Node};
use crate::fiber::{FiberId, FiberStore};
use crate::flags::FiberFlags;
use crate::trace::{ChildrenDroppedEvent, Tracer};

/// Reconciles `node` into the single child of `wip`.
///
/// `current` is the committed version of `wip`, if there is one. Children
/// produced under a parent that already existed in the committed tree are
/// flagged [`FiberFlags::PLACEMENT`]; children produced during an initial
/// mount are not, since the whole subtree is inserted in one go.
///
/// Returns the new first child of `wip`.
pub fn reconcile_children(
    store: &mut FiberStore,
    current: Option<FiberId>,
    wip: FiberId,
    node: &Node,
    tracer: &mut Tracer<'_>,
) -> Option<FiberId> {
    let should_track_side_effects = current.is_some();
    let current_first_child = current.and_then(|c| store.child(c));

    let (element, dropped) = single_element(node);
    if dropped > 0 {
        tracer.children_dropped(&ChildrenDroppedEvent {
            parent: wip,
            dropped,
        });
    }

    let Some(element) = element else {
        store.set_child(wip, None);
        return None;
    };

    let child = match current_first_child {
        Some(existing) if store.matches_element(existing, &element) => {
            store.create_work_in_progress(existing, Some(Rc::clone(&element.props)))
        }
        _ => store.create_fiber_from_element(&element),
    };

    store.attach_only_child(wip, child);
    store.set_child(wip, Some(child));
    if should_track_side_effects {
        store.insert_flags(child, FiberFlags::PLACEMENT);
    }
    Some(child)
}

/// Resolves `node` to the element that will be materialized, plus the
/// number of list entries that were skipped to get there.
fn single_element(node: &Node) -> (Option<Element>, usize) {
    match node {
        Node::Empty => (None, 0),
        Node::Text(text) => (Some(Element::text(text.clone())), 0),
        Node::Element(element) => (Some(element.clone()), 0),
        Node::Fragment(list) => match list.split_first() {
            None => (None, 0),
            Some((first, rest)) => {
                let (element, dropped) = single_element(first);
                (element, dropped + rest.len())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::element::{ElementType, TextContent};
    use crate::fiber::{HostToken, WorkTag};

    fn mounted_parent(store: &mut FiberStore) -> FiberId {
        store.create_fiber_from_element(&Element::host("div"))
    }

    #[test]
    fn empty_node_produces_no_child() {
        let mut store = FiberStore::new();
        let wip = mounted_parent(&mut store);
        let child = reconcile_children(&mut store, None, wip, &Node::Empty, &mut Tracer::none());
        assert_eq!(child, None);
        assert_eq!(store.child(wip), None);
    }

    #[test]
    fn text_is_wrapped_in_a_text_fiber() {
        let mut store = FiberStore::new();
        let wip = mounted_parent(&mut store);
        let child =
            reconcile_children(&mut store, None, wip, &Node::from(0), &mut Tracer::none()).unwrap();
        assert_eq!(store.tag(child), WorkTag::HostText);
        assert_eq!(store.element_type(child), Some(&ElementType::Text));
        assert_eq!(store.text(child), Some(&TextContent::Int(0)));
        assert_eq!(store.return_fiber(child), Some(wip));
        assert_eq!(store.index(child), 0);
    }

    #[test]
    fn mount_never_places() {
        let mut store = FiberStore::new();
        let wip = mounted_parent(&mut store);
        let child = reconcile_children(
            &mut store,
            None,
            wip,
            &Element::host("span").into(),
            &mut Tracer::none(),
        )
        .unwrap();
        assert_eq!(store.flags(child), FiberFlags::empty());
    }

    #[test]
    fn update_always_places() {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(HostToken(0));
        let wip = store.create_work_in_progress(current, None);
        let child = reconcile_children(
            &mut store,
            Some(current),
            wip,
            &Element::host("span").into(),
            &mut Tracer::none(),
        )
        .unwrap();
        assert_eq!(store.flags(child), FiberFlags::PLACEMENT);
    }

    #[test]
    fn matching_current_child_is_reused_as_alternate() {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(HostToken(0));
        let old = store.create_fiber_from_element(&Element::host("span").with_key("a"));
        store.set_child(current, Some(old));
        store.attach_only_child(current, old);
        let wip = store.create_work_in_progress(current, None);

        let next = Element::host("span").with_key("a").with_prop("id", 1);
        let child =
            reconcile_children(&mut store, Some(current), wip, &next.clone().into(), &mut Tracer::none())
                .unwrap();
        assert_ne!(child, old);
        assert_eq!(store.alternate(child), Some(old));
        assert!(Rc::ptr_eq(store.pending_props(child).unwrap(), &next.props));
        assert_eq!(store.return_fiber(child), Some(wip));
    }

    #[test]
    fn different_key_creates_a_fresh_fiber() {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(HostToken(0));
        let old = store.create_fiber_from_element(&Element::host("span").with_key("a"));
        store.set_child(current, Some(old));
        let wip = store.create_work_in_progress(current, None);

        let child = reconcile_children(
            &mut store,
            Some(current),
            wip,
            &Element::host("span").with_key("b").into(),
            &mut Tracer::none(),
        )
        .unwrap();
        assert_eq!(store.alternate(child), None);
        assert_eq!(store.alternate(old), None);
    }

    #[test]
    fn fragment_keeps_only_its_first_entry() {
        let mut store = FiberStore::new();
        let wip = mounted_parent(&mut store);
        let list = Node::from(vec![
            Node::from(vec![Node::from(Element::host("b")), Node::from("x")]),
            Node::from(Element::host("i")),
            Node::from("tail"),
        ]);
        let child = reconcile_children(&mut store, None, wip, &list, &mut Tracer::none()).unwrap();
        assert_eq!(
            store.element_type(child),
            Some(&ElementType::Host("b".into()))
        );
        assert_eq!(store.sibling(child), None);
        assert_eq!(single_element(&list).1, 3);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn dropped_children_are_reported() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Drops(usize);
        impl TraceSink for Drops {
            fn on_children_dropped(&mut self, e: &ChildrenDroppedEvent) {
                self.0 += e.dropped;
            }
        }

        let mut store = FiberStore::new();
        let wip = mounted_parent(&mut store);
        let mut sink = Drops::default();
        let mut tracer = Tracer::new(&mut sink);
        let list = Node::from(vec![Node::from("a"), Node::from("b")]);
        reconcile_children(&mut store, None, wip, &list, &mut tracer);
        drop(tracer);
        assert_eq!(sink.0, 1);
    }
}
