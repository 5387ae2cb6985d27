//! Builds are pure functions of the grid and the partition count.

use std::collections::BTreeMap;
use std::sync::Mutex;

use phold_integration_tests::{build, grid, CountingObserver, SWEEP};
use phold_topology::{
    Coord, LinkDelay, LinkObserver, LinkRecord, Port, TopologyAssembler, TracingObserver,
};

#[test]
fn repeated_builds_are_identical() {
    for &(h, w, r, p) in SWEEP {
        let asm = TopologyAssembler::new(grid(h, w, r, true), p).unwrap();
        assert_eq!(asm.build().unwrap(), asm.build().unwrap());
    }
}

#[test]
fn single_rank_build_matches_whole_build() {
    let asm = TopologyAssembler::new(grid(13, 5, 2, true), 6).unwrap();
    let graph = asm.build().unwrap();
    for p in 0..6 {
        assert_eq!(&asm.build_partition(p).unwrap(), graph.fragment(p).unwrap());
    }
}

#[test]
fn port_sets_do_not_depend_on_partition_count() {
    let spec = grid(16, 6, 2, true);
    let ports = |parts: usize| -> BTreeMap<Coord, Vec<Port>> {
        build(spec, parts)
            .nodes()
            .map(|n| (n.coord, n.ports.clone()))
            .collect()
    };
    let single = ports(1);
    assert_eq!(single.len(), 96);
    for parts in [2, 3, 4, 8, 20] {
        assert_eq!(ports(parts), single, "{} partitions", parts);
    }
}

#[test]
fn edge_set_does_not_depend_on_partition_count() {
    let spec = grid(24, 7, 3, false);
    let single = build(spec, 1);
    for parts in [2, 4, 8] {
        assert_eq!(build(spec, parts).edges(), single.edges(), "{} partitions", parts);
    }
}

#[test]
fn parallel_and_sequential_builds_agree() {
    for &(h, w, r, p) in SWEEP {
        let spec = grid(h, w, r, false);
        let parallel = TopologyAssembler::new(spec, p).unwrap().build().unwrap();
        let sequential = TopologyAssembler::new(spec, p).unwrap().sequential().build().unwrap();
        assert_eq!(parallel, sequential, "{}x{} r{} p{}", h, w, r, p);
    }
}

#[test]
fn observers_see_every_record_without_changing_the_result() {
    let spec = grid(16, 4, 2, true);
    let plain = build(spec, 4);

    let counter = CountingObserver::default();
    let observed = TopologyAssembler::new(spec, 4)
        .unwrap()
        .with_observer(counter)
        .build()
        .unwrap();
    assert_eq!(observed, plain);

    let asm = TopologyAssembler::new(spec, 4).unwrap().with_observer(CountingObserver::default());
    asm.build().unwrap();
    let counts = asm.observer();
    assert_eq!(counts.internal(), plain.internal_edge_count());
    // Each crossing edge is reported once from each side.
    assert_eq!(counts.border(), 2 * plain.border_edge_count());
}

#[derive(Default)]
struct Recorder {
    partitions: Mutex<BTreeMap<usize, usize>>,
}

impl LinkObserver for Recorder {
    fn on_link(&self, partition: usize, _record: LinkRecord<'_>) {
        if let Ok(mut seen) = self.partitions.lock() {
            *seen.entry(partition).or_default() += 1;
        }
    }
}

#[test]
fn observer_records_are_attributed_to_their_partition() {
    let asm = TopologyAssembler::new(grid(12, 6, 1, false), 3)
        .unwrap()
        .with_observer(Recorder::default());
    let graph = asm.build().unwrap();
    let seen = asm.observer().partitions.lock().unwrap().clone();
    for fragment in graph.fragments() {
        assert_eq!(seen[&fragment.index()], fragment.links.edge_count());
    }
}

#[test]
fn tracing_observer_under_a_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    let graph = tracing::subscriber::with_default(subscriber, || {
        TopologyAssembler::new(grid(4, 4, 1, true), 2)
            .unwrap()
            .with_observer(TracingObserver)
            .with_delay(LinkDelay::from("5ns"))
            .sequential()
            .build()
            .unwrap()
    });
    let quiet = TopologyAssembler::new(grid(4, 4, 1, true), 2)
        .unwrap()
        .with_delay(LinkDelay::from("5ns"))
        .build()
        .unwrap();
    assert_eq!(graph.delay().as_str(), "5ns");
    assert_eq!(graph, quiet);
}
