// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and fiber tree snapshots for weft
//! diagnostics.
//!
//! This crate provides [`TraceSink`](weft_core::trace::TraceSink)
//! implementations and tree dumps for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`snapshot::fiber_tree_json`]: a JSON dump of a fiber tree with kinds,
//!   keys, flags and text content.

pub mod pretty;
pub mod recorder;
pub mod snapshot;
