// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Fibers are recorded as raw `(index, generation)` pairs ([`RecordedFiber`])
//! since a recording outlives the store its handles belong to. Aborted passes
//! record only the kind of [`RenderError`] and its numeric payload.

use weft_core::error::RenderError;
use weft_core::fiber::{FiberId, WorkTag};
use weft_core::flags::FiberFlags;
use weft_core::trace::{
    ChildrenDroppedEvent, CommitEvent, PassAbortedEvent, PassBeginEvent, PassEndEvent, TraceSink,
    UnitEvent, UnitPhase,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PASS_END: u8 = 2;
const TAG_PASS_ABORTED: u8 = 3;
const TAG_CHILDREN_DROPPED: u8 = 4;
const TAG_COMMIT: u8 = 5;
const TAG_UNIT: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u64(u64::try_from(v).unwrap_or(u64::MAX));
    }

    fn write_fiber(&mut self, id: FiberId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_flags(&mut self, flags: FiberFlags) {
        self.write_u32(flags.bits());
    }

    fn write_tag(&mut self, tag: WorkTag) {
        self.write_u8(match tag {
            WorkTag::HostRoot => 0,
            WorkTag::HostComponent => 1,
            WorkTag::FunctionComponent => 2,
            WorkTag::HostText => 3,
        });
    }

    fn write_error(&mut self, error: &RenderError) {
        let (kind, a, b) = match error {
            RenderError::MissingUpdateQueue(id) => {
                (ErrorKind::MissingUpdateQueue, u64::from(id.index()), 0)
            }
            RenderError::HookCountChanged {
                previous, rendered, ..
            } => (
                ErrorKind::HookCountChanged,
                u64::try_from(*previous).unwrap_or(u64::MAX),
                u64::try_from(*rendered).unwrap_or(u64::MAX),
            ),
            RenderError::HookTypeChanged { index, .. } => (
                ErrorKind::HookTypeChanged,
                u64::try_from(*index).unwrap_or(u64::MAX),
                0,
            ),
            RenderError::NestedUpdateLimit { limit } => {
                (ErrorKind::NestedUpdateLimit, u64::from(*limit), 0)
            }
        };
        self.write_u8(kind as u8);
        self.write_u64(a);
        self.write_u64(b);
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.pass_index);
        self.write_fiber(e.root);
        self.write_count(e.scheduled);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.write_u8(TAG_PASS_END);
        self.write_u64(e.pass_index);
        self.write_fiber(e.finished);
        self.write_u32(e.units_of_work);
        self.write_flags(e.subtree_flags);
    }

    fn on_pass_aborted(&mut self, e: &PassAbortedEvent<'_>) {
        self.write_u8(TAG_PASS_ABORTED);
        self.write_u64(e.pass_index);
        self.write_error(e.error);
    }

    fn on_children_dropped(&mut self, e: &ChildrenDroppedEvent) {
        self.write_u8(TAG_CHILDREN_DROPPED);
        self.write_fiber(e.parent);
        self.write_count(e.dropped);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u64(e.pass_index);
        self.write_fiber(e.finished);
        self.write_count(e.freed);
        self.write_count(e.effects);
    }

    fn on_unit(&mut self, e: &UnitEvent) {
        self.write_u8(TAG_UNIT);
        self.write_fiber(e.fiber);
        self.write_tag(e.tag);
        self.write_u8(match e.phase {
            UnitPhase::Begin => 0,
            UnitPhase::Complete => 1,
        });
        self.write_flags(e.flags);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A fiber handle as recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordedFiber {
    /// Slot index.
    pub index: u32,
    /// Generation counter at recording time.
    pub generation: u32,
}

impl From<FiberId> for RecordedFiber {
    fn from(id: FiberId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

/// The kind of [`RenderError`] that aborted a recorded pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    /// [`RenderError::MissingUpdateQueue`]; `a` is the root's slot index.
    MissingUpdateQueue = 0,
    /// [`RenderError::HookCountChanged`]; `a` is the previous count, `b` the
    /// rendered count.
    HookCountChanged = 1,
    /// [`RenderError::HookTypeChanged`]; `a` is the hook index.
    HookTypeChanged = 2,
    /// [`RenderError::NestedUpdateLimit`]; `a` is the limit.
    NestedUpdateLimit = 3,
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin {
        /// Pass counter.
        pass_index: u64,
        /// Committed host root.
        root: RecordedFiber,
        /// Fibers drained from the scheduled set.
        scheduled: u64,
    },
    /// A [`PassEndEvent`].
    PassEnd {
        /// Pass counter.
        pass_index: u64,
        /// Finished host root.
        finished: RecordedFiber,
        /// Units of work performed.
        units_of_work: u32,
        /// Aggregated effect flags.
        subtree_flags: FiberFlags,
    },
    /// A [`PassAbortedEvent`].
    PassAborted {
        /// Pass counter.
        pass_index: u64,
        /// Error kind.
        kind: ErrorKind,
        /// First numeric payload (see [`ErrorKind`]).
        a: u64,
        /// Second numeric payload (see [`ErrorKind`]).
        b: u64,
    },
    /// A [`ChildrenDroppedEvent`].
    ChildrenDropped {
        /// Reconciled parent.
        parent: RecordedFiber,
        /// Entries dropped.
        dropped: u64,
    },
    /// A [`CommitEvent`].
    Commit {
        /// Pass counter.
        pass_index: u64,
        /// New current host root.
        finished: RecordedFiber,
        /// Slots reclaimed.
        freed: u64,
        /// Effect bodies run.
        effects: u64,
    },
    /// A [`UnitEvent`].
    Unit {
        /// Work-in-progress fiber.
        fiber: RecordedFiber,
        /// Its kind.
        tag: WorkTag,
        /// Which half ran.
        phase: UnitPhase,
        /// Its own flags after the phase.
        flags: FiberFlags,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_fiber(&mut self) -> Option<RecordedFiber> {
        Some(RecordedFiber {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_flags(&mut self) -> Option<FiberFlags> {
        Some(FiberFlags::from_bits_truncate(self.read_u32()?))
    }

    fn read_tag(&mut self) -> Option<WorkTag> {
        Some(match self.read_u8()? {
            0 => WorkTag::HostRoot,
            1 => WorkTag::HostComponent,
            2 => WorkTag::FunctionComponent,
            _ => WorkTag::HostText,
        })
    }

    fn read_error_kind(&mut self) -> Option<ErrorKind> {
        Some(match self.read_u8()? {
            0 => ErrorKind::MissingUpdateQueue,
            1 => ErrorKind::HookCountChanged,
            2 => ErrorKind::HookTypeChanged,
            _ => ErrorKind::NestedUpdateLimit,
        })
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin {
            pass_index: self.read_u64()?,
            root: self.read_fiber()?,
            scheduled: self.read_u64()?,
        })
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd {
            pass_index: self.read_u64()?,
            finished: self.read_fiber()?,
            units_of_work: self.read_u32()?,
            subtree_flags: self.read_flags()?,
        })
    }

    fn decode_pass_aborted(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassAborted {
            pass_index: self.read_u64()?,
            kind: self.read_error_kind()?,
            a: self.read_u64()?,
            b: self.read_u64()?,
        })
    }

    fn decode_children_dropped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ChildrenDropped {
            parent: self.read_fiber()?,
            dropped: self.read_u64()?,
        })
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit {
            pass_index: self.read_u64()?,
            finished: self.read_fiber()?,
            freed: self.read_u64()?,
            effects: self.read_u64()?,
        })
    }

    fn decode_unit(&mut self) -> Option<RecordedEvent> {
        let fiber = self.read_fiber()?;
        let tag = self.read_tag()?;
        let phase = match self.read_u8()? {
            0 => UnitPhase::Begin,
            _ => UnitPhase::Complete,
        };
        let flags = self.read_flags()?;
        Some(RecordedEvent::Unit {
            fiber,
            tag,
            phase,
            flags,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_PASS_ABORTED => self.decode_pass_aborted(),
            TAG_CHILDREN_DROPPED => self.decode_children_dropped(),
            TAG_COMMIT => self.decode_commit(),
            TAG_UNIT => self.decode_unit(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::commit::NoopCommitter;
    use weft_core::element::{Component, Element, Node};
    use weft_core::fiber::HostToken;
    use weft_core::root::{FiberRoot, RootOptions};
    use weft_core::trace::Tracer;

    #[test]
    fn records_a_mount_and_commit() {
        let mut sink = RecorderSink::new();
        let mut tracer = Tracer::new(&mut sink);
        let mut root = FiberRoot::create_container(HostToken(0));
        root.update_container_traced(Element::host("div").with_children("x").into(), &mut tracer)
            .unwrap();
        let committed = root.commit_traced(&mut NoopCommitter, &mut tracer).unwrap();
        drop(tracer);

        let events: Vec<_> = decode(sink.as_bytes()).collect();
        let begin = events
            .iter()
            .position(|e| matches!(e, RecordedEvent::PassBegin { pass_index: 1, .. }));
        let end = events.iter().position(|e| {
            matches!(
                e,
                RecordedEvent::PassEnd {
                    pass_index: 1,
                    units_of_work: 3,
                    ..
                }
            )
        });
        assert!(begin.is_some(), "no pass begin recorded");
        assert!(begin < end, "begin {begin:?} before end {end:?}");
        assert_eq!(
            events.last(),
            Some(&RecordedEvent::Commit {
                pass_index: 1,
                finished: committed.into(),
                freed: 0,
                effects: 0,
            })
        );

        let units = events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Unit { .. }))
            .count();
        assert_eq!(units, 6, "three fibers, begin and complete each");
    }

    #[test]
    fn records_aborted_pass_error() {
        let runaway = Component::new("Runaway", |_, hooks| {
            let (n, set) = hooks.use_state(|| 0_i64);
            set.set(n + 1);
            Node::Empty
        });
        let mut sink = RecorderSink::new();
        let mut tracer = Tracer::new(&mut sink);
        let mut root = FiberRoot::with_options(
            HostToken(0),
            RootOptions {
                nested_update_limit: 2,
            },
        );
        root.update_container_traced(Element::component(&runaway).into(), &mut tracer)
            .unwrap();
        let result = root.flush_sync_work_traced(&mut NoopCommitter, &mut tracer);
        drop(tracer);
        assert!(result.is_err());

        let aborted: Vec<_> = decode(sink.as_bytes())
            .filter(|e| matches!(e, RecordedEvent::PassAborted { .. }))
            .collect();
        assert_eq!(aborted.len(), 1);
        assert!(matches!(
            aborted[0],
            RecordedEvent::PassAborted {
                kind: ErrorKind::NestedUpdateLimit,
                a: 2,
                ..
            }
        ));
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut sink = RecorderSink::new();
        sink.on_children_dropped(&ChildrenDroppedEvent {
            parent: FiberRoot::create_container(HostToken(0)).current(),
            dropped: 2,
        });
        let bytes = sink.into_bytes();
        assert_eq!(decode(&bytes).count(), 1);
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
    }
}
