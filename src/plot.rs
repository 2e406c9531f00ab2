//! Config-driven rendering of raster, rate, boxplot and trace figures.
use std::collections::HashMap;
use std::path::Path;

use plotters::prelude::*;

use crate::analysis::{
    binned_rates, firing_rates, group_nodes, rate_quartiles, smooth_series, NodeGroup, NodeKey,
};
use crate::builder::NetworkBuilder;
use crate::config::SimConfig;
use crate::error::NetError;
use crate::report::{SpikeReport, TraceReport};

/// Bin size of the population-rate time series, in milliseconds.
pub const RATE_BIN_SIZE: f64 = 10.0;
/// Boxcar window (in bins) applied when rate smoothing is requested.
pub const SMOOTH_WINDOW: usize = 5;

fn load_populations(config: &SimConfig) -> Result<Vec<NetworkBuilder>, NetError> {
    config
        .populations
        .iter()
        .map(|name| NetworkBuilder::load_from(&config.network_dir, name))
        .collect()
}

/// Row index and group index of every grouped node, row-packed group by group.
fn raster_rows(groups: &[NodeGroup]) -> HashMap<NodeKey, (usize, usize)> {
    let mut rows = HashMap::new();
    let mut row = 0;
    for (group_id, group) in groups.iter().enumerate() {
        for member in &group.members {
            rows.insert(member.clone(), (row, group_id));
            row += 1;
        }
    }
    rows
}

/// Spike raster of the recorded populations, one color per value of the
/// `group_by` node property, written to an image file.
pub fn plot_raster<P: AsRef<Path>>(
    config: &SimConfig,
    group_by: &str,
    path: P,
) -> Result<(), NetError> {
    let populations = load_populations(config)?;
    let report = SpikeReport::from_file(config.spikes_path())?;
    let groups = group_nodes(&populations, group_by)?;
    let rows = raster_rows(&groups);
    let num_rows = rows.len();

    let mut series: Vec<Vec<(f64, f64)>> = vec![Vec::new(); groups.len()];
    for spike in &report.spikes {
        if let Some(&(row, group_id)) = rows.get(&(spike.population.clone(), spike.node_id)) {
            series[group_id].push((spike.time, row as f64));
        }
    }

    let root = BitMapBackend::new(path.as_ref(), (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Spike raster", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(report.tstart..report.tstop, 0.0..num_rows as f64)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("time (ms)")
        .y_desc("node")
        .draw()
        .map_err(plot_err)?;

    for (group_id, group) in groups.iter().enumerate() {
        let color = Palette99::pick(group_id).to_rgba();
        chart
            .draw_series(
                series[group_id]
                    .iter()
                    .map(|&(t, row)| Circle::new((t, row), 2, color.filled())),
            )
            .map_err(plot_err)?
            .label(group.label.clone())
            .legend(move |(x, y)| Circle::new((x, y), 3, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;

    log::info!("Raster plot written to {}", path.as_ref().display());
    Ok(())
}

/// Per-group population-rate time series, optionally boxcar-smoothed,
/// written to an image file.
pub fn plot_rates<P: AsRef<Path>>(
    config: &SimConfig,
    group_by: &str,
    smoothing: bool,
    path: P,
) -> Result<(), NetError> {
    let populations = load_populations(config)?;
    let report = SpikeReport::from_file(config.spikes_path())?;
    let groups = group_nodes(&populations, group_by)?;

    let mut curves: Vec<(String, Vec<f64>, Vec<f64>)> = Vec::with_capacity(groups.len());
    for group in &groups {
        let (centers, mut rates) = binned_rates(&report, &group.members, RATE_BIN_SIZE)?;
        if smoothing {
            rates = smooth_series(&rates, SMOOTH_WINDOW);
        }
        curves.push((group.label.clone(), centers, rates));
    }

    let max_rate = curves
        .iter()
        .flat_map(|(_, _, rates)| rates.iter())
        .fold(0.0f64, |acc, &r| acc.max(r));
    // Degenerate range guard for fully silent recordings
    let y_max = if max_rate > 0.0 { max_rate * 1.05 } else { 1.0 };

    let root = BitMapBackend::new(path.as_ref(), (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Population rates", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(report.tstart..report.tstop, 0.0..y_max)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("time (ms)")
        .y_desc("rate (Hz)")
        .draw()
        .map_err(plot_err)?;

    for (group_id, (label, centers, rates)) in curves.iter().enumerate() {
        let color = Palette99::pick(group_id).to_rgba();
        chart
            .draw_series(LineSeries::new(
                centers.iter().copied().zip(rates.iter().copied()),
                &color,
            ))
            .map_err(plot_err)?
            .label(label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x - 10, y), (x + 10, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;

    log::info!("Rate plot written to {}", path.as_ref().display());
    Ok(())
}

/// One box-and-whisker of per-node firing rates per group, written to an
/// image file.
pub fn plot_rates_boxplot<P: AsRef<Path>>(
    config: &SimConfig,
    group_by: &str,
    path: P,
) -> Result<(), NetError> {
    let populations = load_populations(config)?;
    let report = SpikeReport::from_file(config.spikes_path())?;
    let groups = group_nodes(&populations, group_by)?;

    let mut labels: Vec<String> = Vec::with_capacity(groups.len());
    let mut quartiles: Vec<Quartiles> = Vec::with_capacity(groups.len());
    let mut y_max = 0.0f64;
    for group in &groups {
        let rates = firing_rates(&report, &group.members);
        y_max = y_max.max(rate_quartiles(&rates)?.max);
        labels.push(group.label.clone());
        quartiles.push(Quartiles::new(&rates));
    }
    let y_max = if y_max > 0.0 { (y_max * 1.05) as f32 } else { 1.0 };

    let root = BitMapBackend::new(path.as_ref(), (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Firing rates per group", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d((0..labels.len()).into_segmented(), 0f32..y_max)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(index) => labels.get(*index).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc("rate (Hz)")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(quartiles.iter().enumerate().map(|(index, quartiles)| {
            Boxplot::new_vertical(SegmentValue::CenterOf(index), quartiles)
                .width(20)
                .style(Palette99::pick(index).stroke_width(2))
        }))
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;

    log::info!("Rate boxplot written to {}", path.as_ref().display());
    Ok(())
}

/// Line series of the recorded trace variable over time, one per node;
/// restricted to `selection` when given.
pub fn plot_traces<P: AsRef<Path>>(
    config: &SimConfig,
    selection: Option<&[NodeKey]>,
    path: P,
) -> Result<(), NetError> {
    let traces_path = config.traces_path().ok_or_else(|| {
        NetError::InvalidReport("No trace report configured for this simulation".to_string())
    })?;
    let report = TraceReport::from_file(traces_path)?;

    let traces: Vec<_> = report
        .traces
        .iter()
        .filter(|trace| match selection {
            Some(keys) => keys
                .iter()
                .any(|(population, node_id)| {
                    *population == trace.population && *node_id == trace.node_id
                }),
            None => true,
        })
        .collect();
    if traces.is_empty() {
        return Err(NetError::InvalidReport(
            "The trace selection matches no recorded node".to_string(),
        ));
    }

    let times = report.times();
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for trace in &traces {
        for &value in &trace.values {
            y_min = y_min.min(value);
            y_max = y_max.max(value);
        }
    }
    if y_min >= y_max {
        // Degenerate range guard for constant traces
        y_min -= 1.0;
        y_max += 1.0;
    }
    let t_end = times.last().copied().unwrap_or(report.tstart);

    let root = BitMapBackend::new(path.as_ref(), (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(report.variable.clone(), ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(report.tstart..t_end, y_min..y_max)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("time (ms)")
        .y_desc(report.variable.clone())
        .draw()
        .map_err(plot_err)?;

    for (index, trace) in traces.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        chart
            .draw_series(LineSeries::new(
                times.iter().copied().zip(trace.values.iter().copied()),
                &color,
            ))
            .map_err(plot_err)?
            .label(format!("{}/{}", trace.population, trace.node_id))
            .legend(move |(x, y)| PathElement::new(vec![(x - 10, y), (x + 10, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;

    log::info!("Trace plot written to {}", path.as_ref().display());
    Ok(())
}

fn plot_err<E: std::fmt::Display>(e: E) -> NetError {
    NetError::PlotError(e.to_string())
}
