//! Collector abstraction — uniform interface over independent news sources.

pub mod channels;
pub mod search;

pub use channels::ChannelFeedCollector;
pub use search::SearchCollector;

use std::sync::Arc;

use async_trait::async_trait;

use crate::item::Item;

/// One independent source category (search queries, channel feeds, ...).
///
/// `collect` must not raise past its own boundary: internal errors become an
/// empty or partial sequence, logged where they happen. Retry belongs to the
/// generation client, never here — a source item missed this run may well
/// reappear next run.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch items from every sub-query of this source, in sub-query
    /// issuance order.
    async fn collect(&self) -> Vec<Item>;
}

/// Run all collectors concurrently and join their output in declared
/// collector order, so fingerprinting and prompt construction stay
/// reproducible regardless of arrival order.
///
/// A failed collector contributes an empty sequence and never cancels its
/// siblings. Near-empty items are discarded here, before dedupe.
pub async fn collect_all(collectors: &[Arc<dyn Collector>]) -> Vec<Item> {
    let results =
        futures::future::join_all(collectors.iter().map(|collector| collector.collect())).await;

    let mut batch = Vec::new();
    for (collector, items) in collectors.iter().zip(results) {
        tracing::info!(collector = collector.name(), items = items.len(), "Collected");
        for item in items {
            if item.is_substantial() {
                batch.push(item);
            } else {
                tracing::debug!(
                    collector = collector.name(),
                    source_tag = %item.source_tag,
                    "Discarding near-empty item"
                );
            }
        }
    }
    batch
}
