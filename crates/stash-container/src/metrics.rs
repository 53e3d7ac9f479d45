//! Cumulative per-container counters.
//!
//! [`ContainerMetrics`] is a plain snapshot; the live counters are atomics
//! updated outside any lock, so a snapshot taken during concurrent
//! mutation may mix values from adjacent operations.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a container's cumulative counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerMetrics {
    /// Items added (single, unchecked batch, or remote insert).
    pub adds: u64,
    /// Position changes.
    pub moves: u64,
    /// Single-item removals.
    pub removes: u64,
    /// Adds refused by the eligibility filter or self-containment rule.
    pub eligibility_rejections: u64,
    /// Adds or moves refused for lack of free space.
    pub space_rejections: u64,
    /// Adds refused because another container holds the item.
    pub held_elsewhere_rejections: u64,
    /// Free-area queries and placement searches (one per call).
    pub area_queries: u64,
    /// Bulk detaches.
    pub dumps: u64,
    /// Bulk destroys.
    pub purges: u64,
}

#[derive(Default)]
pub(crate) struct MetricCounters {
    pub(crate) adds: AtomicU64,
    pub(crate) moves: AtomicU64,
    pub(crate) removes: AtomicU64,
    pub(crate) eligibility_rejections: AtomicU64,
    pub(crate) space_rejections: AtomicU64,
    pub(crate) held_elsewhere_rejections: AtomicU64,
    pub(crate) area_queries: AtomicU64,
    pub(crate) dumps: AtomicU64,
    pub(crate) purges: AtomicU64,
}

impl MetricCounters {
    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ContainerMetrics {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        ContainerMetrics {
            adds: get(&self.adds),
            moves: get(&self.moves),
            removes: get(&self.removes),
            eligibility_rejections: get(&self.eligibility_rejections),
            space_rejections: get(&self.space_rejections),
            held_elsewhere_rejections: get(&self.held_elsewhere_rejections),
            area_queries: get(&self.area_queries),
            dumps: get(&self.dumps),
            purges: get(&self.purges),
        }
    }
}
