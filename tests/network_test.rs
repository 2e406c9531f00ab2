use rand::rngs::StdRng;
use rand::SeedableRng;

use pointnet::builder::NetworkBuilder;
use pointnet::edges::EdgeType;
use pointnet::nodes::{Ei, ModelType, NodeFilter, NodeType};
use pointnet::placement::Placement;
use pointnet::rule::{Probabilistic, UniformRange};

const SEED: u64 = 42;

fn column() -> Placement {
    Placement::Column {
        center: [0.0, 10.0, 0.0],
        max_radius: 50.0,
        height: 200.0,
    }
}

/// A scaled-down version of the internal population: two glif types and one
/// intfire type, with recurrent e->e and i->e connections.
fn build_internal(seed: u64) -> NetworkBuilder {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut net = NetworkBuilder::new("internal");
    net.add_nodes(
        20,
        NodeType::new("Scnn1a", Ei::Exc, ModelType::PointProcess)
            .model_template("nest:glif_lif_asc_psc")
            .dynamics_params("476056333_glif_lif_asc_config.json")
            .attr("orig_model", "glif"),
        column(),
        &mut rng,
    )
    .unwrap();
    net.add_nodes(
        8,
        NodeType::new("PV1", Ei::Inh, ModelType::PointProcess)
            .model_template("nest:glif_lif_asc_psc")
            .dynamics_params("478958894_glif_lif_asc_config.json")
            .attr("orig_model", "glif"),
        column(),
        &mut rng,
    )
    .unwrap();
    net.add_nodes(
        10,
        NodeType::new("LIF_exc", Ei::Exc, ModelType::PointProcess)
            .model_template("nest:iaf_psc_alpha")
            .attr("orig_model", "intfire"),
        column(),
        &mut rng,
    )
    .unwrap();

    net.add_edges(
        NodeFilter::new().ei(Ei::Exc),
        NodeFilter::new().ei(Ei::Exc).attr("orig_model", "glif"),
        Probabilistic::new(0.2, 1, 5).unwrap(),
        EdgeType::new(2.5, 2.0)
            .dynamics_params("e2e.json")
            .model_template("static_synapse"),
    );
    net.add_edges(
        NodeFilter::new().ei(Ei::Inh),
        NodeFilter::new().ei(Ei::Exc).attr("orig_model", "glif"),
        Probabilistic::new(0.1, 1, 5).unwrap(),
        EdgeType::new(-6.5, 2.0)
            .dynamics_params("i2e.json")
            .model_template("static_synapse"),
    );
    net.build(seed);
    net
}

#[test]
fn test_build_populations_end_to_end() {
    let internal = build_internal(SEED);
    assert_eq!(internal.num_nodes(), 38);
    assert_eq!(internal.node_types().len(), 3);
    assert_eq!(internal.edge_groups().len(), 2);

    // Placed nodes carry positions and rotations, ids are dense
    for (i, node) in internal.all_nodes().iter().enumerate() {
        assert_eq!(node.node_id, i);
        assert!(node.position.is_some());
        assert!(node.rotation_angle_yaxis.is_some());
        assert!(node.rotation_angle_zaxis.is_some());
    }

    // Edge targets are restricted to the 20 excitatory glif cells,
    // sources to the matching e/i selections
    let e2e = &internal.edge_groups()[0];
    assert!(e2e.edges.iter().all(|edge| edge.target_id < 20));
    assert!(e2e
        .edges
        .iter()
        .all(|edge| edge.source_id < 20 || edge.source_id >= 28));
    assert!(e2e.edges.iter().all(|edge| edge.source_id != edge.target_id));
    assert!(e2e.edges.iter().all(|edge| (1..5).contains(&edge.nsyns)));

    let i2e = &internal.edge_groups()[1];
    assert!(i2e
        .edges
        .iter()
        .all(|edge| (20..28).contains(&edge.source_id)));
    assert!(i2e.edges.iter().all(|edge| edge.target_id < 20));
}

#[test]
fn test_build_is_deterministic_per_seed() {
    let first = build_internal(SEED);
    let second = build_internal(SEED);
    assert_eq!(first.edge_groups(), second.edge_groups());
    assert_eq!(first.all_nodes(), second.all_nodes());

    let other = build_internal(SEED + 1);
    assert_ne!(first.edge_groups(), other.edge_groups());
}

#[test]
fn test_external_drive_and_roundtrip() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let internal = build_internal(SEED);

    let mut external = NetworkBuilder::new("external");
    external
        .add_nodes(
            15,
            NodeType::new("input", Ei::Exc, ModelType::Virtual),
            Placement::None,
            &mut rng,
        )
        .unwrap();
    external.add_edges_from(
        NodeFilter::new(),
        &internal.nodes(&NodeFilter::new().ei(Ei::Exc).attr("orig_model", "glif")),
        UniformRange::new(5).unwrap(),
        EdgeType::new(11.0, 2.0)
            .dynamics_params("LGN_to_GLIF.json")
            .model_template("static_synapse"),
    );
    external.build(SEED);

    let group = &external.edge_groups()[0];
    assert_eq!(group.source_population, "external");
    assert_eq!(group.target_population, "internal");
    assert!(!group.edges.is_empty());
    assert!(group.edges.iter().all(|edge| edge.source_id < 15));
    assert!(group.edges.iter().all(|edge| edge.target_id < 20));
    assert!(group.edges.iter().all(|edge| edge.nsyns < 5));

    // Virtual nodes are saved without positions and survive a round trip
    let dir = tempfile::tempdir().unwrap();
    internal.save_to(dir.path()).unwrap();
    external.save_to(dir.path()).unwrap();

    let loaded_internal = NetworkBuilder::load_from(dir.path(), "internal").unwrap();
    let loaded_external = NetworkBuilder::load_from(dir.path(), "external").unwrap();
    assert_eq!(loaded_internal.all_nodes(), internal.all_nodes());
    assert_eq!(loaded_internal.edge_groups(), internal.edge_groups());
    assert_eq!(loaded_external.all_nodes(), external.all_nodes());
    assert_eq!(loaded_external.edge_groups(), external.edge_groups());
    assert!(loaded_external
        .all_nodes()
        .iter()
        .all(|node| node.position.is_none()));
}
