//! Serialized topology values are revalidated when read back.

use phold_integration_tests::{build, grid};
use phold_topology::{Graph, GridSpec, OffsetCodec, Partitioning, ThreadMap};

#[test]
fn grid_spec_reads_back_through_its_constructor() {
    let spec = grid(4, 3, 2, true);
    let json = serde_json::to_string(&spec).unwrap();
    assert_eq!(serde_json::from_str::<GridSpec>(&json).unwrap(), spec);

    for bad in [
        r#"{"height":4,"width":3,"radius":-1,"self_links":false}"#,
        r#"{"height":4,"width":3,"radius":40000,"self_links":false}"#,
        r#"{"height":0,"width":3,"radius":1,"self_links":false}"#,
        r#"{"height":9223372036854775807,"width":2,"radius":1,"self_links":false}"#,
    ] {
        assert!(serde_json::from_str::<GridSpec>(bad).is_err(), "{}", bad);
    }
}

#[test]
fn partitioning_recomputes_its_band_size() {
    let tampered = r#"{"height":8,"count":2,"base":7}"#;
    let parts: Partitioning = serde_json::from_str(tampered).unwrap();
    assert_eq!(parts, Partitioning::new(8, 2).unwrap());
    assert_eq!(parts.base_rows(), 4);

    assert!(serde_json::from_str::<Partitioning>(r#"{"height":8,"count":0}"#).is_err());
}

#[test]
fn offset_codec_rejects_oversized_radius() {
    let codec: OffsetCodec = serde_json::from_str(r#"{"radius":3}"#).unwrap();
    assert_eq!(codec.port_count(), 49);
    assert!(serde_json::from_str::<OffsetCodec>(r#"{"radius":40000}"#).is_err());
    assert!(serde_json::from_str::<OffsetCodec>(r#"{"radius":-2}"#).is_err());
}

#[test]
fn thread_map_serializes_its_bounds() {
    let map = ThreadMap::new(4, 2, 0.0).unwrap();
    let value = serde_json::to_value(&map).unwrap();
    assert_eq!(value["width"], 4);
    assert_eq!(value["bounds"].as_array().map(Vec::len), Some(3));
}

#[test]
fn whole_graph_round_trips() {
    let graph = build(grid(8, 6, 2, true), 3);
    let json = serde_json::to_string(&graph).unwrap();
    let back: Graph = serde_json::from_str(&json).unwrap();
    assert_eq!(back, graph);
    assert!(back.verify().unwrap().is_clean());
}
