//! A partitioned build reproduces the centralized edge set exactly.

use phold_integration_tests::{assert_matches_reference, build, grid, SWEEP};
use phold_topology::{reference, Edge, TopologyAssembler};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[test]
fn eight_by_eight_two_partitions() {
    let graph = build(grid(8, 8, 1, false), 2);
    assert_eq!(graph.edge_count(), 210);
    assert_eq!(graph.border_edge_count(), 22);
    assert_matches_reference(&graph);
}

#[test]
fn sweep_matches_reference() {
    for &(h, w, r, p) in SWEEP {
        for self_links in [false, true] {
            let graph = build(grid(h, w, r, self_links), p);
            assert_matches_reference(&graph);
        }
    }
}

#[test]
fn every_edge_appears_once() {
    for &(h, w, r, p) in SWEEP {
        let graph = build(grid(h, w, r, true), p);
        let unique: BTreeSet<_> = graph.edges().iter().map(Edge::endpoints).collect();
        assert_eq!(unique.len(), graph.edge_count(), "{}x{} r{} p{}", h, w, r, p);
    }
}

#[test]
fn edges_join_reciprocal_ports() {
    let spec = grid(12, 9, 3, true);
    let codec = spec.codec();
    let graph = build(spec, 3);
    for edge in graph.edges() {
        let offset = edge.b.node - edge.a.node;
        assert_eq!(edge.a.port, codec.encode(offset).unwrap(), "{}", edge);
        assert_eq!(edge.b.port, codec.encode(-offset).unwrap(), "{}", edge);
        assert_eq!(codec.reciprocal(edge.a.port).unwrap(), edge.b.port);
    }
}

#[test]
fn node_ports_cover_every_bound_endpoint() {
    let graph = build(grid(16, 6, 2, true), 4);
    let bound: BTreeSet<_> = graph
        .edges()
        .iter()
        .flat_map(|e| [e.a, e.b])
        .collect();
    let exposed: BTreeSet<_> = graph
        .nodes()
        .flat_map(|n| n.ports.iter().map(move |&p| phold_topology::Endpoint::new(n.coord, p)))
        .collect();
    assert_eq!(bound, exposed);
}

#[test]
fn reference_and_graph_agree_on_count() {
    for &(h, w, r, p) in SWEEP {
        let spec = grid(h, w, r, false);
        let expected = reference::enumerate(&spec).unwrap().len();
        assert_eq!(build(spec, p).edge_count(), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_grids_match_reference(
        h in 1i64..24,
        w in 1i64..9,
        r in 0i64..4,
        p in 1usize..7,
        self_links in any::<bool>(),
    ) {
        let base = h / p as i64;
        prop_assume!(p == 1 || base == 0 || r <= base);

        let spec = grid(h, w, r, self_links);
        let graph = TopologyAssembler::new(spec, p).unwrap().build().unwrap();
        let diff = graph.verify().unwrap();
        prop_assert!(diff.is_clean(), "{}", diff);
    }
}
