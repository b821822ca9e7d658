// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Function component hooks.
//!
//! A component's hook state is an ordered list stored in its fiber's
//! `memoized_state` ([`MemoizedState::Hooks`]). Hooks are matched to their
//! previous state purely by call order, so a component must call the same
//! hooks in the same order on every render. Violations abort the pass with
//! [`RenderError::HookCountChanged`] or [`RenderError::HookTypeChanged`].
//!
//! Whether a render mounts or updates is decided by the fiber: a fiber with
//! no alternate has never been committed and starts from fresh state.
//!
//! State hooks keep a ring [`UpdateQueue`]. Because the queue handle is
//! copied to the work-in-progress fiber together with the rest of the list,
//! [`SetState`] and [`Dispatch`] handles created on any render keep feeding
//! the same ring. Dispatching also records the fiber in the root's
//! [`ScheduleHandle`] so the next flush knows a pass is needed.
//!
//! # Effects
//!
//! [`Hooks::use_effect`] never runs its body during render. A render whose
//! effect deps changed stores the body on the new hook entry and flags the
//! fiber [`FiberFlags::PASSIVE`]; the root runs it once the tree is
//! committed. Per commit, every cleanup due runs before any new body:
//! first the cleanups of components that left the tree, then those of
//! effects about to re-run, then the bodies in tree order. A pass that is
//! never committed runs nothing.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use core::marker::PhantomData;

use crate::element::{Component, Node, Props};
use crate::error::RenderError;
use crate::fiber::{FiberId, FiberStore, MemoizedState};
use crate::flags::FiberFlags;
use crate::update_queue::{UpdateAction, UpdateQueue, create_update};

type AnyState = Rc<dyn Any>;

/// Undoes what an effect body did; returned by the body.
pub type EffectCleanup = Box<dyn FnOnce()>;

type EffectBody = Box<dyn FnOnce() -> Option<EffectCleanup>>;
type EffectSlot<T> = Rc<RefCell<Option<T>>>;

/// One entry of a component's hook list.
#[derive(Clone)]
pub struct HookState {
    kind: HookKind,
}

#[derive(Clone)]
enum HookKind {
    State {
        value: AnyState,
        queue: UpdateQueue<AnyState>,
    },
    Memo {
        value: AnyState,
        deps: AnyState,
    },
    Ref(AnyState),
    Effect {
        deps: AnyState,
        /// Body to run at commit; only set by a render whose deps changed.
        pending: Option<EffectSlot<EffectBody>>,
        /// Cleanup of the last run, shared by both versions of the fiber.
        cleanup: EffectSlot<EffectCleanup>,
    },
}

impl HookState {
    pub(crate) fn has_pending_effect(&self) -> bool {
        matches!(
            &self.kind,
            HookKind::Effect {
                pending: Some(_),
                ..
            }
        )
    }
}

impl fmt::Debug for HookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HookKind::State { queue, .. } => f
                .debug_struct("State")
                .field("pending", &queue.len())
                .finish_non_exhaustive(),
            HookKind::Memo { .. } => f.write_str("Memo"),
            HookKind::Ref(_) => f.write_str("Ref"),
            HookKind::Effect { pending, .. } => f
                .debug_struct("Effect")
                .field("pending", &pending.is_some())
                .finish_non_exhaustive(),
        }
    }
}

/// Collects fibers that received updates outside a render pass.
///
/// Cloned into every dispatch handle; drained by the owning
/// [`FiberRoot`](crate::root::FiberRoot) at the start of each pass.
#[derive(Clone, Debug, Default)]
pub struct ScheduleHandle {
    inbox: Rc<RefCell<Vec<FiberId>>>,
}

impl ScheduleHandle {
    /// Records that `fiber` has pending updates.
    pub fn schedule(&self, fiber: FiberId) {
        self.inbox.borrow_mut().push(fiber);
    }

    /// Returns whether nothing has been scheduled since the last drain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inbox.borrow().is_empty()
    }

    pub(crate) fn take(&self) -> Vec<FiberId> {
        core::mem::take(&mut *self.inbox.borrow_mut())
    }
}

/// Setter returned by [`Hooks::use_state`].
pub struct SetState<S> {
    queue: UpdateQueue<AnyState>,
    fiber: FiberId,
    schedule: ScheduleHandle,
    _marker: PhantomData<fn(S)>,
}

impl<S> Clone for SetState<S> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            fiber: self.fiber,
            schedule: self.schedule.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S> fmt::Debug for SetState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("fiber", &self.fiber)
            .finish_non_exhaustive()
    }
}

impl<S: 'static> SetState<S> {
    /// Replaces the state on the next render.
    pub fn set(&self, value: S) {
        let value: AnyState = Rc::new(value);
        self.queue
            .enqueue(create_update(UpdateAction::Replace(value)));
        self.schedule.schedule(self.fiber);
    }

    /// Computes the next state from the previous one on the next render.
    pub fn update(&self, f: impl FnOnce(&S) -> S + 'static) {
        self.queue
            .enqueue(create_update(UpdateAction::transform(move |prev: AnyState| {
                match prev.downcast_ref::<S>() {
                    Some(state) => Rc::new(f(state)) as AnyState,
                    None => prev,
                }
            })));
        self.schedule.schedule(self.fiber);
    }
}

/// Dispatcher returned by [`Hooks::use_reducer`].
pub struct Dispatch<S, A> {
    queue: UpdateQueue<AnyState>,
    fiber: FiberId,
    schedule: ScheduleHandle,
    reducer: fn(&S, A) -> S,
}

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            fiber: self.fiber,
            schedule: self.schedule.clone(),
            reducer: self.reducer,
        }
    }
}

impl<S, A> fmt::Debug for Dispatch<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("fiber", &self.fiber)
            .finish_non_exhaustive()
    }
}

impl<S: 'static, A: 'static> Dispatch<S, A> {
    /// Queues `action` to be reduced into the state on the next render.
    pub fn dispatch(&self, action: A) {
        let reducer = self.reducer;
        self.queue
            .enqueue(create_update(UpdateAction::transform(move |prev: AnyState| {
                match prev.downcast_ref::<S>() {
                    Some(state) => Rc::new(reducer(state, action)) as AnyState,
                    None => prev,
                }
            })));
        self.schedule.schedule(self.fiber);
    }
}

/// Hook access for one render of one function component.
pub struct Hooks<'a> {
    component: &'static str,
    fiber: FiberId,
    mount: bool,
    previous: Vec<HookState>,
    next: Vec<HookState>,
    schedule: &'a ScheduleHandle,
    error: Option<RenderError>,
}

impl fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("component", &self.component)
            .field("fiber", &self.fiber)
            .field("mount", &self.mount)
            .field("called", &self.next.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(
        component: &'static str,
        fiber: FiberId,
        mount: bool,
        previous: Vec<HookState>,
        schedule: &'a ScheduleHandle,
    ) -> Self {
        Self {
            component,
            fiber,
            mount,
            previous,
            next: Vec::new(),
            schedule,
            error: None,
        }
    }

    /// Returns the fiber being rendered.
    #[must_use]
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Returns whether this render mounts the component.
    #[must_use]
    pub fn is_mount(&self) -> bool {
        self.mount
    }

    /// Local state with a setter.
    ///
    /// `init` runs only on mount. On update, pending [`SetState`] calls are
    /// applied in the order they were made before the value is returned.
    pub fn use_state<S: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> S,
    ) -> (S, SetState<S>) {
        let (value, queue) = self.state_slot(init);
        let setter = SetState {
            queue,
            fiber: self.fiber,
            schedule: self.schedule.clone(),
            _marker: PhantomData,
        };
        (value, setter)
    }

    /// Local state updated through a reducer.
    pub fn use_reducer<S: Clone + 'static, A: 'static>(
        &mut self,
        reducer: fn(&S, A) -> S,
        init: impl FnOnce() -> S,
    ) -> (S, Dispatch<S, A>) {
        let (value, queue) = self.state_slot(init);
        let dispatch = Dispatch {
            queue,
            fiber: self.fiber,
            schedule: self.schedule.clone(),
            reducer,
        };
        (value, dispatch)
    }

    /// A value recomputed only when `deps` changes.
    pub fn use_memo<T: Clone + 'static, D: PartialEq + 'static>(
        &mut self,
        deps: D,
        create: impl FnOnce() -> T,
    ) -> T {
        let index = self.next.len();
        match self.previous_at(index) {
            Some(HookKind::Memo {
                value,
                deps: prev_deps,
            }) => match (value.downcast_ref::<T>(), prev_deps.downcast_ref::<D>()) {
                (Some(cached), Some(prev)) => {
                    if *prev == deps {
                        let cached = cached.clone();
                        self.push(HookKind::Memo {
                            value,
                            deps: prev_deps,
                        });
                        return cached;
                    }
                }
                _ => self.fail_type(index),
            },
            Some(_) => self.fail_type(index),
            None => {}
        }
        let value = create();
        self.push(HookKind::Memo {
            value: Rc::new(value.clone()),
            deps: Rc::new(deps),
        });
        value
    }

    /// A callback that keeps its identity while `deps` stay equal.
    ///
    /// Returns `callback` on mount and whenever `deps` changed, otherwise
    /// the callback stored by an earlier render.
    pub fn use_callback<F: Clone + 'static, D: PartialEq + 'static>(
        &mut self,
        deps: D,
        callback: F,
    ) -> F {
        self.use_memo(deps, move || callback)
    }

    /// Schedules `create` to run after the tree is committed, on mount and
    /// whenever `deps` changed since the last render.
    ///
    /// The cleanup `create` returns runs before the effect's next body, or
    /// when the component leaves the tree. Pass `()` as `deps` to run once
    /// after mount.
    pub fn use_effect<D: PartialEq + 'static>(
        &mut self,
        deps: D,
        create: impl FnOnce() -> Option<EffectCleanup> + 'static,
    ) {
        let index = self.next.len();
        let cleanup = match self.previous_at(index) {
            Some(HookKind::Effect {
                deps: prev_deps,
                cleanup,
                ..
            }) => match prev_deps.downcast_ref::<D>().map(|prev| *prev == deps) {
                Some(true) => {
                    self.push(HookKind::Effect {
                        deps: prev_deps,
                        pending: None,
                        cleanup,
                    });
                    return;
                }
                Some(false) => cleanup,
                None => {
                    self.fail_type(index);
                    Rc::default()
                }
            },
            Some(_) => {
                self.fail_type(index);
                Rc::default()
            }
            None => Rc::default(),
        };
        let body: EffectBody = Box::new(create);
        self.push(HookKind::Effect {
            deps: Rc::new(deps),
            pending: Some(Rc::new(RefCell::new(Some(body)))),
            cleanup,
        });
    }

    /// A mutable cell that keeps its identity across renders.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let index = self.next.len();
        match self.previous_at(index) {
            Some(HookKind::Ref(cell)) => match cell.downcast::<RefCell<T>>() {
                Ok(cell) => {
                    let any: AnyState = cell.clone();
                    self.push(HookKind::Ref(any));
                    return cell;
                }
                Err(_) => self.fail_type(index),
            },
            Some(_) => self.fail_type(index),
            None => {}
        }
        let cell = Rc::new(RefCell::new(init()));
        let any: AnyState = cell.clone();
        self.push(HookKind::Ref(any));
        cell
    }

    /// Finishes the render, returning the new hook list.
    pub(crate) fn finish(self) -> Result<Vec<HookState>, RenderError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.mount && self.next.len() != self.previous.len() {
            return Err(RenderError::HookCountChanged {
                component: self.component,
                previous: self.previous.len(),
                rendered: self.next.len(),
            });
        }
        Ok(self.next)
    }

    fn state_slot<S: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> S,
    ) -> (S, UpdateQueue<AnyState>) {
        let index = self.next.len();
        match self.previous_at(index) {
            Some(HookKind::State { value, queue }) => {
                let value = queue.process(value);
                if let Some(state) = value.downcast_ref::<S>() {
                    let state = state.clone();
                    self.push(HookKind::State {
                        value,
                        queue: queue.clone(),
                    });
                    return (state, queue);
                }
                self.fail_type(index);
            }
            Some(_) => self.fail_type(index),
            None => {}
        }
        let state = init();
        let queue = UpdateQueue::new();
        self.push(HookKind::State {
            value: Rc::new(state.clone()),
            queue: queue.clone(),
        });
        (state, queue)
    }

    fn previous_at(&self, index: usize) -> Option<HookKind> {
        if self.mount {
            return None;
        }
        self.previous.get(index).map(|hook| hook.kind.clone())
    }

    fn push(&mut self, kind: HookKind) {
        self.next.push(HookState { kind });
    }

    fn fail_type(&mut self, index: usize) {
        if self.error.is_none() {
            self.error = Some(RenderError::HookTypeChanged {
                component: self.component,
                index,
            });
        }
    }
}

/// Runs `component` for the work-in-progress fiber `wip`, threading its hook
/// list through [`Hooks`].
pub(crate) fn render_with_hooks(
    store: &mut FiberStore,
    wip: FiberId,
    component: &Component,
    props: &Props,
    schedule: &ScheduleHandle,
) -> Result<Node, RenderError> {
    let mount = store.alternate(wip).is_none();
    let previous = if mount {
        Vec::new()
    } else {
        store.take_hooks(wip)
    };
    let mut hooks = Hooks::new(component.name(), wip, mount, previous, schedule);
    let node = component.render(props, &mut hooks);
    let list = hooks.finish()?;
    if list.iter().any(HookState::has_pending_effect) {
        store.insert_flags(wip, FiberFlags::PASSIVE);
    }
    store.set_memoized_state(wip, MemoizedState::Hooks(list));
    Ok(node)
}

/// Runs the cleanups of effects whose components were reclaimed.
///
/// Returns how many cleanups ran.
pub(crate) fn run_unmount_cleanups(released: Vec<Vec<HookState>>) -> usize {
    let mut ran = 0;
    for hook in released.into_iter().flatten() {
        if let HookKind::Effect { cleanup, .. } = hook.kind {
            // Both versions of a fiber share the cell, so it is taken once.
            let cleanup = cleanup.borrow_mut().take();
            if let Some(cleanup) = cleanup {
                cleanup();
                ran += 1;
            }
        }
    }
    ran
}

/// Runs the effects scheduled by the pass that built `finished`.
///
/// All due cleanups run first, then all bodies, each in tree order. Returns
/// how many bodies ran.
pub(crate) fn commit_passive_effects(store: &FiberStore, finished: FiberId) -> usize {
    if !store.subtree_flags(finished).contains(FiberFlags::PASSIVE) {
        return 0;
    }
    let mut due: Vec<(EffectBody, EffectSlot<EffectCleanup>)> = Vec::new();
    for fiber in store.descendants(finished) {
        if !store.flags(fiber).contains(FiberFlags::PASSIVE) {
            continue;
        }
        let MemoizedState::Hooks(list) = store.memoized_state(fiber) else {
            continue;
        };
        for hook in list {
            if let HookKind::Effect {
                pending: Some(pending),
                cleanup,
                ..
            } = &hook.kind
            {
                let body = pending.borrow_mut().take();
                if let Some(body) = body {
                    due.push((body, Rc::clone(cleanup)));
                }
            }
        }
    }

    for (_, cleanup) in &due {
        let previous = cleanup.borrow_mut().take();
        if let Some(previous) = previous {
            previous();
        }
    }
    let ran = due.len();
    for (body, cleanup) in due {
        let next = body();
        *cleanup.borrow_mut() = next;
    }
    ran
}
