// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of a fiber tree.
//!
//! [`fiber_tree_json`] walks a tree from any fiber and returns a nested
//! [`serde_json::Value`]; [`write_fiber_tree`] pretty-prints it. Useful for
//! diffing the current and work-in-progress trees around a commit.

use std::io::{self, Write};

use serde_json::{Map, Value, json};

use weft_core::element::PropValue;
use weft_core::fiber::{FiberId, FiberStore, WorkTag};
use weft_core::flags::FiberFlags;

/// Builds a JSON description of the subtree rooted at `root`.
///
/// Each fiber becomes an object with its `tag`, `type`, `key`, `flags`,
/// `subtree_flags`, host `attrs`, `text` and `children`.
///
/// # Panics
///
/// Panics if `root` is stale.
#[must_use]
pub fn fiber_tree_json(store: &FiberStore, root: FiberId) -> Value {
    let children: Vec<Value> = store
        .children(root)
        .map(|child| fiber_tree_json(store, child))
        .collect();

    json!({
        "id": format!("{root:?}"),
        "tag": tag_name(store.tag(root)),
        "type": store.element_type(root).map(ToString::to_string),
        "key": store.key(root).map(|k| k.to_string()),
        "flags": flag_names(store.flags(root)),
        "subtree_flags": flag_names(store.subtree_flags(root)),
        "attrs": attrs(store, root),
        "text": store.text(root).map(ToString::to_string),
        "children": children,
    })
}

/// Writes [`fiber_tree_json`] for `root` as pretty-printed JSON.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_fiber_tree(store: &FiberStore, root: FiberId, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &fiber_tree_json(store, root))?;
    writeln!(writer)
}

fn tag_name(tag: WorkTag) -> &'static str {
    match tag {
        WorkTag::HostRoot => "HostRoot",
        WorkTag::HostComponent => "HostComponent",
        WorkTag::FunctionComponent => "FunctionComponent",
        WorkTag::HostText => "HostText",
    }
}

fn flag_names(flags: FiberFlags) -> Vec<&'static str> {
    let mut names = Vec::new();
    if flags.contains(FiberFlags::PLACEMENT) {
        names.push("PLACEMENT");
    }
    if flags.contains(FiberFlags::UPDATE) {
        names.push("UPDATE");
    }
    if flags.contains(FiberFlags::PASSIVE) {
        names.push("PASSIVE");
    }
    names
}

fn attrs(store: &FiberStore, id: FiberId) -> Value {
    if store.tag(id) != WorkTag::HostComponent {
        return Value::Null;
    }
    let Some(props) = store.memoized_props(id).or_else(|| store.pending_props(id)) else {
        return Value::Null;
    };
    let map: Map<String, Value> = props
        .attrs()
        .map(|(name, value)| {
            let value = match value {
                PropValue::Str(s) => json!(s),
                PropValue::Int(n) => json!(n),
                PropValue::Float(n) => json!(n),
                PropValue::Bool(b) => json!(b),
            };
            (name.to_owned(), value)
        })
        .collect();
    Value::Object(map)
}
