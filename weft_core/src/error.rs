// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render pass errors.

use core::fmt;

use crate::fiber::FiberId;

/// Errors that abort a render pass.
///
/// An aborted pass never touches the committed tree. The root's `current`
/// pointer stays as it was and `finished_work` is left empty, so the
/// partially built work-in-progress nodes are never committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The host root reached begin-work without an update queue.
    MissingUpdateQueue(FiberId),
    /// A component called a different number of hooks than on its previous
    /// render.
    HookCountChanged {
        /// Display name of the component.
        component: &'static str,
        /// Hooks called on the previous render.
        previous: usize,
        /// Hooks called on this render.
        rendered: usize,
    },
    /// A component called a different kind of hook, or a hook with a
    /// different state type, at the same position as on its previous render.
    HookTypeChanged {
        /// Display name of the component.
        component: &'static str,
        /// Zero-based position of the hook in call order.
        index: usize,
    },
    /// Updates kept scheduling further passes within a single flush.
    NestedUpdateLimit {
        /// The configured limit that was exceeded.
        limit: u32,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUpdateQueue(id) => {
                write!(f, "host root {id:?} has no update queue")
            }
            Self::HookCountChanged {
                component,
                previous,
                rendered,
            } => write!(
                f,
                "{component} rendered {rendered} hooks but {previous} on the previous render"
            ),
            Self::HookTypeChanged { component, index } => {
                write!(f, "{component} changed the kind or type of hook #{index}")
            }
            Self::NestedUpdateLimit { limit } => {
                write!(f, "more than {limit} nested render passes in one flush")
            }
        }
    }
}

impl core::error::Error for RenderError {}
