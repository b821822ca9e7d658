// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Weft uses [`understory_dirty`] to remember which fibers received updates
//! since the last render pass. When the child reconciler links a child under
//! a parent it adds a dependency edge "parent depends on child" on the
//! [`SCHEDULED`] channel, so marking a fiber with
//! [`EagerPolicy`](understory_dirty::EagerPolicy) also marks every ancestor
//! up to the host root.
//!
//! # Consumption
//!
//! [`FiberRoot`](crate::root::FiberRoot) drains the channel at the start of
//! each pass (the drained set is reported in
//! [`PassBeginEvent`](crate::trace::PassBeginEvent)) and
//! [`flush_sync_work`](crate::root::FiberRoot::flush_sync_work) keeps
//! rendering while the drain is non-empty.

use understory_dirty::Channel;

/// A fiber, or something below it, has pending updates.
pub const SCHEDULED: Channel = Channel::new(0);
