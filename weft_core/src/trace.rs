// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for render passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the render pass and commit call at each stage. All method bodies default
//! to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates per-fiber [`UnitEvent`]s and the
//!   corresponding `TraceSink` method.

use crate::error::RenderError;
use crate::fiber::FiberId;
use crate::flags::FiberFlags;
#[cfg(feature = "trace-rich")]
use crate::fiber::WorkTag;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a render pass starts.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter of the root.
    pub pass_index: u64,
    /// The committed host root the pass builds from.
    pub root: FiberId,
    /// Number of fibers drained from the scheduled set.
    pub scheduled: usize,
}

/// Emitted when a render pass completes and its tree awaits commit.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The finished work-in-progress host root.
    pub finished: FiberId,
    /// Number of units of work performed.
    pub units_of_work: u32,
    /// Aggregated effect flags of the finished tree.
    pub subtree_flags: FiberFlags,
}

/// Emitted when a render pass fails.
#[derive(Clone, Copy, Debug)]
pub struct PassAbortedEvent<'a> {
    /// Pass counter.
    pub pass_index: u64,
    /// Why the pass stopped.
    pub error: &'a RenderError,
}

/// Warning: a list of children was reduced to its first entry.
#[derive(Clone, Copy, Debug)]
pub struct ChildrenDroppedEvent {
    /// The fiber whose children were reconciled.
    pub parent: FiberId,
    /// How many list entries were not materialized.
    pub dropped: usize,
}

/// Emitted after a finished tree has been committed.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Pass counter of the committed tree.
    pub pass_index: u64,
    /// The host root that is now current.
    pub finished: FiberId,
    /// Number of arena slots reclaimed.
    pub freed: usize,
    /// Number of effect bodies run.
    pub effects: usize,
}

/// Which half of a unit of work is reported.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitPhase {
    /// Begin-work ran.
    Begin,
    /// Complete-work ran.
    Complete,
}

/// A per-fiber unit of work record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct UnitEvent {
    /// The work-in-progress fiber.
    pub fiber: FiberId,
    /// Its kind.
    pub tag: WorkTag,
    /// Which half ran.
    pub phase: UnitPhase,
    /// The fiber's own flags after the phase.
    pub flags: FiberFlags,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from render passes and commits.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a render pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a render pass finishes.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called when a render pass is aborted by an error.
    fn on_pass_aborted(&mut self, e: &PassAbortedEvent<'_>) {
        _ = e;
    }

    /// Called when list children are dropped by the single-child reconciler.
    fn on_children_dropped(&mut self, e: &ChildrenDroppedEvent) {
        _ = e;
    }

    /// Called after a commit.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called per fiber for begin and complete work (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_unit(&mut self, e: &UnitEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassAbortedEvent`].
    #[inline]
    pub fn pass_aborted(&mut self, e: &PassAbortedEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_aborted(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ChildrenDroppedEvent`].
    #[inline]
    pub fn children_dropped(&mut self, e: &ChildrenDroppedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_children_dropped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`UnitEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn unit(&mut self, e: &UnitEvent) {
        if let Some(s) = &mut self.sink {
            s.on_unit(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> PassBeginEvent {
        PassBeginEvent {
            pass_index: 3,
            root: FiberId {
                idx: 0,
                generation: 0,
            },
            scheduled: 2,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_pass_begin(&sample_begin());
        sink.on_pass_aborted(&PassAbortedEvent {
            pass_index: 3,
            error: &RenderError::NestedUpdateLimit { limit: 1 },
        });
        sink.on_children_dropped(&ChildrenDroppedEvent {
            parent: sample_begin().root,
            dropped: 4,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.pass_begin(&sample_begin());
        tracer.pass_end(&PassEndEvent {
            pass_index: 3,
            finished: sample_begin().root,
            units_of_work: 0,
            subtree_flags: FiberFlags::empty(),
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            passes: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_pass_begin(&mut self, e: &PassBeginEvent) {
                self.passes.push(e.pass_index);
            }
        }

        let mut sink = RecordingSink { passes: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.pass_begin(&sample_begin());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.passes, &[3]);
    }
}
