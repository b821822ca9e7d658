// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root containers and the synchronous pass driver.
//!
//! A [`FiberRoot`] owns the fiber arena for one host container, the
//! committed host root fiber (`current`), and the most recent finished
//! work-in-progress root awaiting commit (`finished_work`).
//!
//! ```text
//!   update_container(node)
//!       │  enqueue Replace(node) on current
//!       ▼
//!   render pass ──► finished_work ──► commit(committer)
//!       ▲                                  │ current = finished_work
//!       │                                  │ reclaim unreachable slots
//!       │                                  │ run effect cleanups, then bodies
//!       └──── flush_sync_work ◄── hook dispatch (ScheduleHandle)
//! ```
//!
//! Every pass starts by clearing `finished_work` and reclaiming whatever an
//! earlier uncommitted pass left outside the current tree: the pass
//! rebuilds into the alternate of `current`, which is the same arena slot a
//! previous uncommitted pass finished into. A pass that fails leaves
//! `current` untouched and `finished_work` empty.
//!
//! Inside [`FiberRoot::batched_updates`], [`FiberRoot::update_container`]
//! only enqueues. The outermost batch ends with one
//! [`FiberRoot::flush_sync_work`], so all updates of the batch land in a
//! single pass.

use alloc::vec::Vec;

use crate::commit::Committer;
use crate::element::Node;
use crate::error::RenderError;
use crate::fiber::{FiberId, FiberStore, HostToken};
use crate::hooks::{self, ScheduleHandle};
use crate::trace::{CommitEvent, PassAbortedEvent, PassBeginEvent, PassEndEvent, Tracer};
use crate::update_queue::{UpdateAction, create_update};
use crate::work::{RenderPass, WorkLoop};

/// Runtime options for a [`FiberRoot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootOptions {
    /// Maximum number of passes [`FiberRoot::flush_sync_work`] runs before
    /// giving up with [`RenderError::NestedUpdateLimit`].
    pub nested_update_limit: u32,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            nested_update_limit: 50,
        }
    }
}

/// The fiber tree of one host container.
#[derive(Debug)]
pub struct FiberRoot {
    store: FiberStore,
    container: HostToken,
    current: FiberId,
    finished_work: Option<FiberId>,
    schedule: ScheduleHandle,
    options: RootOptions,
    pass_index: u64,
    batch_depth: u32,
}

impl FiberRoot {
    /// Creates a root for `container` with default options.
    ///
    /// The sentinel host root fiber is created with an empty update queue
    /// and becomes `current`.
    #[must_use]
    pub fn create_container(container: HostToken) -> Self {
        Self::with_options(container, RootOptions::default())
    }

    /// Creates a root for `container` with the given options.
    #[must_use]
    pub fn with_options(container: HostToken, options: RootOptions) -> Self {
        let mut store = FiberStore::new();
        let current = store.create_host_root_fiber(container);
        store.initialize_update_queue(current);
        Self {
            store,
            container,
            current,
            finished_work: None,
            schedule: ScheduleHandle::default(),
            options,
            pass_index: 0,
            batch_depth: 0,
        }
    }

    /// Renders `node` into the container.
    ///
    /// Enqueues `node` as a replacing update on the host root and runs one
    /// full render pass. The finished tree is left in
    /// [`finished_work`](Self::finished_work) for [`commit`](Self::commit).
    /// Inside [`batched_updates`](Self::batched_updates) the pass is left to
    /// the end of the batch. Returns `node` unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn update_container(&mut self, node: Node) -> Result<Node, RenderError> {
        self.update_container_traced(node, &mut Tracer::none())
    }

    /// Like [`update_container`](Self::update_container), with tracing.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn update_container_traced(
        &mut self,
        node: Node,
        tracer: &mut Tracer<'_>,
    ) -> Result<Node, RenderError> {
        self.store.enqueue_update(
            self.current,
            create_update(UpdateAction::Replace(node.clone())),
        );
        if self.is_batching() {
            return Ok(node);
        }
        let scheduled = self.drain_scheduled();
        self.render(scheduled, tracer)?;
        Ok(node)
    }

    /// Runs one render pass from `current` without enqueueing anything.
    ///
    /// Picks up updates already sitting in update queues, such as ones
    /// enqueued directly through [`store_mut`](Self::store_mut).
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn perform_sync_work(&mut self) -> Result<FiberId, RenderError> {
        self.perform_sync_work_traced(&mut Tracer::none())
    }

    /// Like [`perform_sync_work`](Self::perform_sync_work), with tracing.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn perform_sync_work_traced(
        &mut self,
        tracer: &mut Tracer<'_>,
    ) -> Result<FiberId, RenderError> {
        let scheduled = self.drain_scheduled();
        self.render(scheduled, tracer)
    }

    /// Hands `finished_work` to `committer` and makes it current.
    ///
    /// Arena slots no longer reachable from the new current tree (or as the
    /// alternate of one of its fibers) are reclaimed; their handles become
    /// stale. Then effects run: cleanups of reclaimed components, cleanups
    /// of effects whose deps changed, and finally the new effect bodies.
    /// Returns the new current host root, or `None` if there was nothing to
    /// commit.
    pub fn commit(&mut self, committer: &mut dyn Committer) -> Option<FiberId> {
        self.commit_traced(committer, &mut Tracer::none())
    }

    /// Like [`commit`](Self::commit), with tracing.
    pub fn commit_traced(
        &mut self,
        committer: &mut dyn Committer,
        tracer: &mut Tracer<'_>,
    ) -> Option<FiberId> {
        let finished = self.finished_work.take()?;
        committer.commit_root(&mut self.store, finished);
        self.current = finished;
        let mut released = Vec::new();
        let freed = self.store.collect_garbage_into(finished, &mut released);
        hooks::run_unmount_cleanups(released);
        let effects = hooks::commit_passive_effects(&self.store, finished);
        tracer.commit(&CommitEvent {
            pass_index: self.pass_index,
            finished,
            freed,
            effects,
        });
        Some(finished)
    }

    /// Runs `f` with passes deferred, then flushes.
    ///
    /// [`update_container`](Self::update_container) calls made by `f` only
    /// enqueue. When the outermost batch returns, one
    /// [`flush_sync_work`](Self::flush_sync_work) renders and commits them
    /// together. Nested batches flush nothing on their own.
    ///
    /// # Errors
    ///
    /// See [`flush_sync_work`](Self::flush_sync_work).
    pub fn batched_updates<T>(
        &mut self,
        committer: &mut dyn Committer,
        f: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, RenderError> {
        self.batched_updates_traced(committer, &mut Tracer::none(), f)
    }

    /// Like [`batched_updates`](Self::batched_updates), with tracing for the
    /// closing flush.
    ///
    /// # Errors
    ///
    /// See [`flush_sync_work`](Self::flush_sync_work).
    pub fn batched_updates_traced<T>(
        &mut self,
        committer: &mut dyn Committer,
        tracer: &mut Tracer<'_>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, RenderError> {
        self.batch_depth += 1;
        let value = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.flush_sync_work_traced(committer, tracer)?;
        }
        Ok(value)
    }

    /// Commits any finished work, then renders and commits until no fiber
    /// has scheduled work left.
    ///
    /// Returns the number of passes run.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NestedUpdateLimit`] if updates keep
    /// scheduling passes beyond
    /// [`RootOptions::nested_update_limit`], or the error that aborted a
    /// pass.
    pub fn flush_sync_work(&mut self, committer: &mut dyn Committer) -> Result<u32, RenderError> {
        self.flush_sync_work_traced(committer, &mut Tracer::none())
    }

    /// Like [`flush_sync_work`](Self::flush_sync_work), with tracing.
    ///
    /// # Errors
    ///
    /// See [`flush_sync_work`](Self::flush_sync_work).
    pub fn flush_sync_work_traced(
        &mut self,
        committer: &mut dyn Committer,
        tracer: &mut Tracer<'_>,
    ) -> Result<u32, RenderError> {
        self.commit_traced(committer, tracer);
        let limit = self.options.nested_update_limit;
        let mut passes = 0;
        loop {
            let scheduled = self.drain_scheduled();
            if scheduled == 0 {
                return Ok(passes);
            }
            if passes >= limit {
                let error = RenderError::NestedUpdateLimit { limit };
                tracer.pass_aborted(&PassAbortedEvent {
                    pass_index: self.pass_index,
                    error: &error,
                });
                return Err(error);
            }
            self.render(scheduled, tracer)?;
            self.commit_traced(committer, tracer);
            passes += 1;
        }
    }

    // -- Accessors --

    /// Returns the committed host root.
    #[must_use]
    pub fn current(&self) -> FiberId {
        self.current
    }

    /// Returns the finished host root awaiting commit, if any.
    #[must_use]
    pub fn finished_work(&self) -> Option<FiberId> {
        self.finished_work
    }

    /// Returns the host container this root renders into.
    #[must_use]
    pub fn container(&self) -> HostToken {
        self.container
    }

    /// Returns the options this root was created with.
    #[must_use]
    pub fn options(&self) -> RootOptions {
        self.options
    }

    /// Returns whether a [`batched_updates`](Self::batched_updates) call is
    /// running.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Returns the number of passes started so far.
    #[must_use]
    pub fn pass_index(&self) -> u64 {
        self.pass_index
    }

    /// Returns the fiber arena.
    #[must_use]
    pub fn store(&self) -> &FiberStore {
        &self.store
    }

    /// Returns the fiber arena mutably, for enqueueing updates directly.
    pub fn store_mut(&mut self) -> &mut FiberStore {
        &mut self.store
    }

    // -- Internals --

    /// Moves hook dispatches into the dirty tracker and drains it, returning
    /// how many fibers had work scheduled.
    fn drain_scheduled(&mut self) -> usize {
        for fiber in self.schedule.take() {
            // Dispatchers outlive their fibers; ignore reclaimed ones.
            if self.store.is_alive(fiber) {
                self.store.schedule_update_on_fiber(fiber);
            }
        }
        self.store.take_scheduled().len()
    }

    fn render(&mut self, scheduled: usize, tracer: &mut Tracer<'_>) -> Result<FiberId, RenderError> {
        self.finished_work = None;
        // Fibers an uncommitted pass created outside `current` are garbage.
        self.store.collect_garbage(self.current);
        self.pass_index += 1;
        let pass_index = self.pass_index;
        tracer.pass_begin(&PassBeginEvent {
            pass_index,
            root: self.current,
            scheduled,
        });

        let wip = self.store.create_work_in_progress(self.current, None);
        let mut pass = RenderPass::new(&mut self.store, &self.schedule, tracer);
        let result = WorkLoop::new(wip).run(&mut pass);
        let units_of_work = pass.units_of_work();

        if let Err(error) = result {
            tracer.pass_aborted(&PassAbortedEvent {
                pass_index,
                error: &error,
            });
            return Err(error);
        }

        let subtree_flags = self.store.subtree_flags(wip);
        tracer.pass_end(&PassEndEvent {
            pass_index,
            finished: wip,
            units_of_work,
            subtree_flags,
        });
        self.finished_work = Some(wip);
        Ok(wip)
    }
}
