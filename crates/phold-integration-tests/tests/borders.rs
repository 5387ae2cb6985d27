//! Both sides of every partition boundary agree on border slots.

use std::collections::BTreeSet;

use phold_integration_tests::{build, crossing, grid, SWEEP};
use phold_topology::{BorderCodec, Direction, Edge, TopologyAssembler};

#[test]
fn sixteen_by_four_radius_two() {
    let spec = grid(16, 4, 2, false);
    let border = BorderCodec::new(&spec);
    let asm = TopologyAssembler::new(spec, 4).unwrap();

    let fragments: Vec<_> = (0..4).map(|p| asm.build_partition(p).unwrap()).collect();
    for pair in fragments.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        let south = upper.links.south();
        let north = lower.links.north();
        assert_eq!(south.boundary(), north.boundary());
        assert_eq!(south.direction(), Direction::South);
        assert_eq!(north.direction(), Direction::North);

        let south_slots: Vec<_> = south.iter().map(|(pos, _)| pos).collect();
        let north_slots: Vec<_> = north.iter().map(|(pos, _)| pos).collect();
        assert_eq!(south_slots, north_slots);

        for (pos, up) in south.iter() {
            let down = north.get(pos).unwrap();
            assert_eq!(up.slot, down.slot);
            let (a, b) = border.endpoints(south.boundary(), up.slot).unwrap();
            assert_eq!((a, b), (up.local, down.local));
        }

        assert_eq!(south.len(), crossing(&spec, south.boundary()).len());
    }
}

#[test]
fn stitched_border_edges_are_exactly_the_crossing_edges() {
    for &(h, w, r, p) in SWEEP {
        let spec = grid(h, w, r, true);
        let graph = build(spec, p);
        let parts = graph.partitioning();

        let mut expected = BTreeSet::new();
        for part in parts.partitions().skip(1) {
            if parts.base_rows() > 0 {
                expected.extend(crossing(&spec, part.row_start));
            }
        }

        let stitched: BTreeSet<_> = graph
            .edges()
            .iter()
            .filter(|e| {
                parts.partition_of(e.a.node.row).unwrap() != parts.partition_of(e.b.node.row).unwrap()
            })
            .map(Edge::endpoints)
            .collect();

        assert_eq!(stitched, expected, "{}x{} r{} p{}", h, w, r, p);
        assert_eq!(graph.border_edge_count(), expected.len());
    }
}

#[test]
fn lanes_separate_rows_at_different_depths() {
    // Radius 3 with 3-row bands: the same (column, offset) key is reached
    // from three originator rows.
    let spec = grid(9, 5, 3, false);
    let border = BorderCodec::new(&spec);
    let graph = build(spec, 3);
    let south = graph.fragment(0).unwrap().links.south();

    let lanes: BTreeSet<_> = south.links().map(|l| l.slot.lane).collect();
    assert_eq!(lanes, BTreeSet::from([0, 1, 2]));
    assert!(south.iter().all(|(pos, _)| pos < border.capacity()));

    let keys: BTreeSet<_> = south.links().map(|l| (l.slot.lane, l.slot.index)).collect();
    assert_eq!(keys.len(), south.len());
}

#[test]
fn border_halves_point_across_the_boundary() {
    let graph = build(grid(20, 3, 4, true), 5);
    for fragment in graph.fragments() {
        let rows = fragment.partition.rows();
        for link in fragment.links.north().links() {
            assert!(rows.contains(&link.local.node.row));
            assert_eq!(link.direction, Direction::North);
        }
        for link in fragment.links.south().links() {
            assert!(rows.contains(&link.local.node.row));
            assert_eq!(link.direction, Direction::South);
        }
    }
}
