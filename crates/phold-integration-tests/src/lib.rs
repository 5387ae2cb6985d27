//! Shared fixtures for cross-module topology tests.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use phold_topology::reference::{self, EndpointPair};
use phold_topology::{Graph, GridSpec, LinkObserver, LinkRecord, TopologyAssembler};

/// Grid configurations `(height, width, radius, partitions)` that every
/// property is checked against. Each keeps `radius <= height / partitions`
/// or has fewer rows than partitions.
pub const SWEEP: &[(i64, i64, i64, usize)] = &[
    (1, 1, 0, 1),
    (1, 1, 3, 1),
    (4, 4, 1, 1),
    (8, 8, 1, 2),
    (9, 7, 3, 3),
    (10, 10, 1, 4),
    (13, 5, 2, 6),
    (16, 4, 2, 4),
    (20, 3, 4, 5),
    (3, 4, 1, 5),
    (24, 1, 2, 8),
    (64, 64, 5, 4),
];

pub fn grid(height: i64, width: i64, radius: i64, self_links: bool) -> GridSpec {
    GridSpec::new(height, width, radius, self_links).expect("valid grid")
}

pub fn build(spec: GridSpec, partitions: usize) -> Graph {
    TopologyAssembler::new(spec, partitions)
        .expect("valid partitioning")
        .build()
        .expect("build succeeds")
}

/// Panics with the diff when `graph` differs from the centralized enumeration.
pub fn assert_matches_reference(graph: &Graph) {
    let diff = graph.verify().expect("reference enumeration");
    assert!(
        diff.is_clean(),
        "{} with {} partitions: {}\nmissing: {:?}\nunexpected: {:?}\nduplicated: {:?}",
        graph.spec(),
        graph.partitioning().count(),
        diff,
        diff.missing,
        diff.unexpected,
        diff.duplicated
    );
}

/// Reference edges whose endpoints sit on opposite sides of `boundary`.
pub fn crossing(spec: &GridSpec, boundary: i64) -> BTreeSet<EndpointPair> {
    reference::enumerate(spec)
        .expect("reference enumeration")
        .into_iter()
        .filter(|(a, b)| {
            let (lo, hi) = (a.node.row.min(b.node.row), a.node.row.max(b.node.row));
            lo < boundary && hi >= boundary
        })
        .collect()
}

/// Counts records by kind across every partition.
#[derive(Debug, Default)]
pub struct CountingObserver {
    pub internal: AtomicUsize,
    pub border: AtomicUsize,
}

impl CountingObserver {
    pub fn internal(&self) -> usize {
        self.internal.load(Ordering::Relaxed)
    }

    pub fn border(&self) -> usize {
        self.border.load(Ordering::Relaxed)
    }
}

impl LinkObserver for CountingObserver {
    fn on_link(&self, _partition: usize, record: LinkRecord<'_>) {
        let counter = match record {
            LinkRecord::Internal(_) => &self.internal,
            LinkRecord::Border(_) => &self.border,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
