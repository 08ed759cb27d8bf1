//! Tracing targets for the events emitted during a run.
//!
//! Events use camelCase field names so they line up with the driver's own
//! `mongodb::command` and `mongodb::connection` events when both are enabled.

use std::time::Duration;

pub(crate) const CONNECTION_TRACING_EVENT_TARGET: &str = "mongo_transaction::connection";
pub(crate) const TRANSACTION_TRACING_EVENT_TARGET: &str = "mongo_transaction::transaction";
pub(crate) const DRIVER_TRACING_EVENT_TARGET: &str = "mongo_transaction::driver";

/// Whole milliseconds in `duration` for `durationMS`-style fields, saturating at `u64::MAX`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn millis(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}
