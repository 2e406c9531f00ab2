use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use rand::rngs::StdRng;
use rand::SeedableRng;

use pointnet::builder::NetworkBuilder;
use pointnet::config::SimConfig;
use pointnet::edges::EdgeType;
use pointnet::error::NetError;
use pointnet::nodes::{Ei, ModelType, NodeFilter, NodeType};
use pointnet::placement::Placement;
use pointnet::rule::{Probabilistic, UniformRange};

#[derive(Parser, Debug)]
struct Args {
    /// The seed used for node placement and edge building
    #[arg(long, default_value = "42")]
    seed: u64,
    /// The directory the network description is saved to
    #[arg(long, default_value = "network")]
    network_dir: PathBuf,
    /// The config file written next to the network description
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

fn init_logging() -> Result<(), NetError> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .map_err(|e| NetError::IOError(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| NetError::IOError(e.to_string()))?;
    Ok(())
}

fn main() -> Result<(), NetError> {
    init_logging()?;
    let args = Args::parse();
    log::info!("{:?}", args);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let column = Placement::Column {
        center: [0.0, 10.0, 0.0],
        max_radius: 50.0,
        height: 200.0,
    };

    // Generalized leaky integrate-and-fire cell models
    let glif_models = [
        ("Scnn1a", Ei::Exc, "476056333_glif_lif_asc_config.json"),
        ("Rorb", Ei::Exc, "480124551_glif_lif_asc_config.json"),
        ("Nr5a1", Ei::Exc, "318808427_glif_lif_asc_config.json"),
        ("PV1", Ei::Inh, "478958894_glif_lif_asc_config.json"),
        ("PV2", Ei::Inh, "487667205_glif_lif_asc_config.json"),
    ];
    let intfire_models = [
        ("LIF_exc", Ei::Exc, "IntFire1_exc_point.json"),
        ("LIF_inh", Ei::Inh, "IntFire1_inh_point.json"),
    ];

    let mut internal = NetworkBuilder::new("internal");
    for (model_name, ei, dynamics_params) in glif_models {
        // 80% excitatory, 20% inhibitory
        let n_cells = if ei == Ei::Exc { 80 } else { 30 };
        internal.add_nodes(
            n_cells,
            NodeType::new(model_name, ei, ModelType::PointProcess)
                .model_template("nest:glif_lif_asc_psc")
                .dynamics_params(dynamics_params)
                .attr("orig_model", "glif"),
            column.clone(),
            &mut rng,
        )?;
    }
    for (model_name, ei, dynamics_params) in intfire_models {
        internal.add_nodes(
            75,
            NodeType::new(model_name, ei, ModelType::PointProcess)
                .model_template("nest:iaf_psc_alpha")
                .dynamics_params(dynamics_params)
                .attr("orig_model", "intfire"),
            column.clone(),
            &mut rng,
        )?;
    }

    let glif = |ei: Ei| NodeFilter::new().ei(ei).attr("orig_model", "glif");
    let intfire = NodeFilter::new().attr("orig_model", "intfire");

    // Recurrent connections onto the glif cells
    internal.add_edges(
        NodeFilter::new().ei(Ei::Exc),
        glif(Ei::Exc),
        Probabilistic::new(0.2, 1, 5)?,
        EdgeType::new(2.5, 2.0)
            .dynamics_params("e2e.json")
            .model_template("static_synapse"),
    );
    internal.add_edges(
        NodeFilter::new().ei(Ei::Exc),
        glif(Ei::Inh),
        Probabilistic::new(0.1, 1, 5)?,
        EdgeType::new(5.0, 2.0)
            .dynamics_params("e2i.json")
            .model_template("static_synapse"),
    );
    internal.add_edges(
        NodeFilter::new().ei(Ei::Inh),
        glif(Ei::Exc),
        Probabilistic::new(0.1, 1, 5)?,
        EdgeType::new(-6.5, 2.0)
            .dynamics_params("i2e.json")
            .model_template("static_synapse"),
    );
    internal.add_edges(
        NodeFilter::new().ei(Ei::Inh),
        glif(Ei::Inh),
        Probabilistic::new(0.2, 1, 5)?,
        EdgeType::new(-3.0, 2.0)
            .dynamics_params("i2i.json")
            .model_template("static_synapse"),
    );

    // Connections onto the intfire cells
    internal.add_edges(
        NodeFilter::new().ei(Ei::Exc),
        intfire.clone(),
        Probabilistic::new(0.1, 1, 5)?,
        EdgeType::new(3.0, 2.0)
            .dynamics_params("instanteneousExc.json")
            .model_template("static_synapse"),
    );
    internal.add_edges(
        NodeFilter::new().ei(Ei::Inh),
        intfire.clone(),
        Probabilistic::new(0.1, 1, 5)?,
        EdgeType::new(-4.0, 2.0)
            .dynamics_params("instanteneousInh.json")
            .model_template("static_synapse"),
    );

    internal.build(args.seed);
    internal.save_to(&args.network_dir)?;

    // 100 virtual cells driving the internal network
    let mut external = NetworkBuilder::new("external");
    external.add_nodes(
        100,
        NodeType::new("input", Ei::Exc, ModelType::Virtual),
        Placement::None,
        &mut rng,
    )?;
    external.add_edges_from(
        NodeFilter::new(),
        &internal.nodes(&glif(Ei::Exc)),
        UniformRange::new(5)?,
        EdgeType::new(11.0, 2.0)
            .dynamics_params("LGN_to_GLIF.json")
            .model_template("static_synapse"),
    );
    external.add_edges_from(
        NodeFilter::new(),
        &internal.nodes(&glif(Ei::Inh)),
        UniformRange::new(5)?,
        EdgeType::new(14.0, 2.0)
            .dynamics_params("LGN_to_GLIF.json")
            .model_template("static_synapse"),
    );
    external.add_edges_from(
        NodeFilter::new(),
        &internal.nodes(&intfire),
        UniformRange::new(5)?,
        EdgeType::new(13.0, 2.0)
            .dynamics_params("instanteneousExc.json")
            .model_template("static_synapse"),
    );

    external.build(args.seed);
    external.save_to(&args.network_dir)?;

    let config = SimConfig {
        network_dir: args.network_dir.clone(),
        output_dir: PathBuf::from("output"),
        populations: vec!["internal".to_string(), "external".to_string()],
        spikes_file: "spikes.json".to_string(),
        traces_file: None,
    };
    config.save_to(&args.config)?;
    log::info!("Config written to {}", args.config.display());

    Ok(())
}
