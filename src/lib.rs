//! This crate provides tools for building point-neuron network descriptions
//! and analyzing simulator output in Rust.
//!
//! # Building Networks
//!
//! ```rust
//! use pointnet::builder::NetworkBuilder;
//! use pointnet::edges::EdgeType;
//! use pointnet::nodes::{Ei, ModelType, NodeFilter, NodeType};
//! use pointnet::placement::Placement;
//! use pointnet::rule::Probabilistic;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut net = NetworkBuilder::new("internal");
//!
//! // 80 excitatory glif cells placed in a column
//! net.add_nodes(
//!     80,
//!     NodeType::new("Scnn1a", Ei::Exc, ModelType::PointProcess)
//!         .model_template("nest:glif_lif_asc_psc")
//!         .dynamics_params("476056333_glif_lif_asc_config.json"),
//!     Placement::Column { center: [0.0, 10.0, 0.0], max_radius: 50.0, height: 200.0 },
//!     &mut rng,
//! ).unwrap();
//!
//! // Excitatory-to-excitatory connections, 20% probability, 1 to 4 synapses
//! net.add_edges(
//!     NodeFilter::new().ei(Ei::Exc),
//!     NodeFilter::new().ei(Ei::Exc),
//!     Probabilistic::new(0.2, 1, 5).unwrap(),
//!     EdgeType::new(2.5, 2.0)
//!         .dynamics_params("e2e.json")
//!         .model_template("static_synapse"),
//! );
//!
//! net.build(42);
//! assert_eq!(net.num_nodes(), 80);
//! assert!(net.num_edges() > 0);
//! ```
//!
//! # Saving and Loading
//!
//! ```rust
//! # use pointnet::builder::NetworkBuilder;
//! # use pointnet::nodes::{Ei, ModelType, NodeType};
//! # use pointnet::placement::Placement;
//! # use rand::rngs::StdRng;
//! # use rand::SeedableRng;
//! # let mut rng = StdRng::seed_from_u64(42);
//! # let mut net = NetworkBuilder::new("internal");
//! # net.add_nodes(10, NodeType::new("LIF_exc", Ei::Exc, ModelType::PointProcess), Placement::None, &mut rng).unwrap();
//! let dir = tempfile::tempdir().unwrap();
//! net.save_to(dir.path()).unwrap();
//!
//! let loaded = NetworkBuilder::load_from(dir.path(), "internal").unwrap();
//! assert_eq!(loaded.num_nodes(), net.num_nodes());
//! ```
//!
//! # Analyzing Simulation Output
//!
//! Analysis and plotting start from a [`config::SimConfig`] pointing at the
//! network directory and the simulator output; see [`plot::plot_raster`],
//! [`plot::plot_rates`], [`plot::plot_rates_boxplot`] and
//! [`plot::plot_traces`].

pub mod analysis;
pub mod builder;
pub mod config;
pub mod edges;
pub mod error;
pub mod nodes;
pub mod placement;
pub mod plot;
pub mod report;
pub mod rule;
