//! Configuration types.
//!
//! One immutable config object, constructed at process start and passed into
//! the pipeline; no component reads the environment on its own.

use std::time::Duration;

use crate::store::StoreWritePolicy;

/// Behavior when a run finds no novel items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleNotice {
    /// End the run silently (cheapest).
    Silent,
    /// Send a fixed low-content "no new items" notice.
    Notify,
}

/// Briefing run configuration.
#[derive(Debug, Clone)]
pub struct BriefConfig {
    /// Chunk size for delivery; strictly below the transport hard maximum.
    pub chunk_limit: usize,
    /// Pause between chunk sends to preserve arrival order.
    pub send_pause: Duration,
    /// What to do on an empty novel set.
    pub idle_notice: IdleNotice,
    /// Severity of a failed seen-store write.
    pub store_write_policy: StoreWritePolicy,
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self {
            chunk_limit: crate::deliver::telegram::DEFAULT_CHUNK_LIMIT,
            send_pause: Duration::from_millis(500),
            idle_notice: IdleNotice::Notify,
            store_write_policy: StoreWritePolicy::Warn,
        }
    }
}
