// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Warnings are
//! prefixed with `[warn:...]` so they stand out in a busy log.

use std::io::Write;

use weft_core::fiber::WorkTag;
use weft_core::flags::FiberFlags;
use weft_core::trace::{
    ChildrenDroppedEvent, CommitEvent, PassAbortedEvent, PassBeginEvent, PassEndEvent, TraceSink,
    UnitEvent, UnitPhase,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    units: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("units", &self.units)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Per-fiber unit lines are off; see [`with_units`](Self::with_units).
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            units: false,
        }
    }

    /// Also prints one line per begin and complete of every fiber.
    #[must_use]
    pub fn with_units(mut self, units: bool) -> Self {
        self.units = units;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn tag_name(tag: WorkTag) -> &'static str {
    match tag {
        WorkTag::HostRoot => "root",
        WorkTag::HostComponent => "host",
        WorkTag::FunctionComponent => "fn",
        WorkTag::HostText => "text",
    }
}

fn flags_str(flags: FiberFlags) -> String {
    let s: String = [
        (FiberFlags::PLACEMENT, 'P'),
        (FiberFlags::UPDATE, 'U'),
        (FiberFlags::PASSIVE, 'E'),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, c)| c)
    .collect();
    if s.is_empty() { "-".into() } else { s }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] pass={} root={:?} scheduled={}",
            e.pass_index, e.root, e.scheduled,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] pass={} finished={:?} units={} subtree={}",
            e.pass_index,
            e.finished,
            e.units_of_work,
            flags_str(e.subtree_flags),
        );
    }

    fn on_pass_aborted(&mut self, e: &PassAbortedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[pass:aborted] pass={} error={}",
            e.pass_index, e.error,
        );
    }

    fn on_children_dropped(&mut self, e: &ChildrenDroppedEvent) {
        let _ = writeln!(
            self.writer,
            "[warn:children-dropped] parent={:?} dropped={} (only the first child is rendered)",
            e.parent, e.dropped,
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] pass={} current={:?} freed={} effects={}",
            e.pass_index, e.finished, e.freed, e.effects,
        );
    }

    fn on_unit(&mut self, e: &UnitEvent) {
        if !self.units {
            return;
        }
        let phase = match e.phase {
            UnitPhase::Begin => "begin",
            UnitPhase::Complete => "complete",
        };
        let _ = writeln!(
            self.writer,
            "[unit:{phase}] {:?} {} flags={}",
            e.fiber,
            tag_name(e.tag),
            flags_str(e.flags),
        );
    }
}
