//! Hooks invoked once per emitted edge record.
//!
//! Observers see what a partition emits but never influence it. Use them
//! for diagnostics such as per-edge logging or counting.

use crate::link::LinkRecord;

/// Receives every edge record a partition emits.
///
/// Partitions may be planned on several threads at once, so observers
/// must be `Send + Sync`.
pub trait LinkObserver: Send + Sync {
    fn on_link(&self, partition: usize, record: LinkRecord<'_>);
}

/// Ignores every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LinkObserver for NoopObserver {
    #[inline]
    fn on_link(&self, _partition: usize, _record: LinkRecord<'_>) {}
}

/// Logs every record at `trace` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LinkObserver for TracingObserver {
    fn on_link(&self, partition: usize, record: LinkRecord<'_>) {
        match record {
            LinkRecord::Internal(edge) => {
                tracing::trace!(partition, link = %edge.name(), "linking {} -> {}", edge.a, edge.b);
            }
            LinkRecord::Border(link) => {
                tracing::trace!(
                    partition,
                    direction = %link.direction,
                    lane = link.slot.lane,
                    index = link.slot.index,
                    "border {}",
                    link.local
                );
            }
        }
    }
}

impl<F> LinkObserver for F
where
    F: Fn(usize, LinkRecord<'_>) + Send + Sync,
{
    fn on_link(&self, partition: usize, record: LinkRecord<'_>) {
        self(partition, record)
    }
}
