use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use pointnet::config::SimConfig;
use pointnet::error::NetError;
use pointnet::plot::{plot_raster, plot_rates, plot_rates_boxplot, plot_traces};

#[derive(Parser, Debug)]
struct Args {
    /// The simulation config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
    /// The node property the figures are grouped by
    #[arg(long, default_value = "model_name")]
    group_by: String,
    /// The directory the figures are written to
    #[arg(long, default_value = "figures")]
    figures_dir: PathBuf,
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

    let config = SimConfig::from_file(&args.config)?;
    std::fs::create_dir_all(&args.figures_dir)?;

    plot_raster(&config, &args.group_by, args.figures_dir.join("raster.png"))?;
    plot_rates(
        &config,
        &args.group_by,
        true,
        args.figures_dir.join("rates.png"),
    )?;
    plot_rates_boxplot(
        &config,
        &args.group_by,
        args.figures_dir.join("rates_boxplot.png"),
    )?;

    if config.traces_file.is_some() {
        plot_traces(&config, None, args.figures_dir.join("traces.png"))?;
    }

    Ok(())
}
