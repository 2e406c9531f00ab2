//! Grouping, firing-rate and summary-statistic computations over reports.
use std::collections::BTreeMap;

use itertools::Itertools;

use crate::builder::NetworkBuilder;
use crate::error::NetError;
use crate::report::SpikeReport;

/// Milliseconds per second; report times are in milliseconds, rates in Hz.
pub const MS_PER_SEC: f64 = 1000.0;

/// A node of a loaded network, keyed by population name and node ID.
pub type NodeKey = (String, usize);

/// A set of nodes sharing the value of a grouping property.
#[derive(Debug, PartialEq, Clone)]
pub struct NodeGroup {
    /// The shared property value, e.g. "Scnn1a".
    pub label: String,
    /// The member nodes.
    pub members: Vec<NodeKey>,
}

/// Partition the nodes of the given populations by a node-type property,
/// e.g. "model_name" or "ei". Groups are ordered by label. Nodes whose type
/// lacks the property are left out; if no node carries it at all, the
/// property is unknown.
pub fn group_nodes(
    populations: &[NetworkBuilder],
    group_by: &str,
) -> Result<Vec<NodeGroup>, NetError> {
    let mut groups: BTreeMap<String, Vec<NodeKey>> = BTreeMap::new();
    for population in populations {
        let node_types = population.node_types();
        for node in population.all_nodes() {
            if let Some(label) = node_types[node.node_type_id].property(group_by) {
                groups
                    .entry(label)
                    .or_default()
                    .push((population.name().to_string(), node.node_id));
            }
        }
    }

    if groups.is_empty() {
        return Err(NetError::UnknownProperty(format!(
            "No node carries the property '{}'",
            group_by
        )));
    }

    Ok(groups
        .into_iter()
        .map(|(label, members)| NodeGroup { label, members })
        .collect())
}

/// Per-node mean firing rates in Hz over the report's observation window,
/// in member order. Nodes without spikes get a rate of zero.
pub fn firing_rates(report: &SpikeReport, members: &[NodeKey]) -> Vec<f64> {
    let counts = report
        .spikes
        .iter()
        .map(|spike| (spike.population.as_str(), spike.node_id))
        .counts();

    let duration_s = report.duration() / MS_PER_SEC;
    members
        .iter()
        .map(|(population, node_id)| {
            let count = counts
                .get(&(population.as_str(), *node_id))
                .copied()
                .unwrap_or(0);
            count as f64 / duration_s
        })
        .collect()
}

/// Population rate time series for a set of nodes: spike counts per time bin
/// normalized to a per-node rate in Hz. Returns the bin centers (ms) and rates.
pub fn binned_rates(
    report: &SpikeReport,
    members: &[NodeKey],
    bin_size: f64,
) -> Result<(Vec<f64>, Vec<f64>), NetError> {
    if !(bin_size > 0.0) {
        return Err(NetError::InvalidParameter(format!(
            "The bin size must be positive, got {}",
            bin_size
        )));
    }
    if members.is_empty() {
        return Err(NetError::InvalidParameter(
            "Cannot bin rates over an empty node selection".to_string(),
        ));
    }

    let num_bins = (report.duration() / bin_size).ceil().max(1.0) as usize;
    let mut counts = vec![0usize; num_bins];
    for spike in &report.spikes {
        if members
            .iter()
            .any(|(population, node_id)| *population == spike.population && *node_id == spike.node_id)
        {
            let bin = (((spike.time - report.tstart) / bin_size) as usize).min(num_bins - 1);
            counts[bin] += 1;
        }
    }

    let centers = (0..num_bins)
        .map(|i| report.tstart + (i as f64 + 0.5) * bin_size)
        .collect();
    let norm = members.len() as f64 * bin_size / MS_PER_SEC;
    let rates = counts.iter().map(|&count| count as f64 / norm).collect();
    Ok((centers, rates))
}

/// Boxcar smoothing with a centered window, clamped at the edges.
/// The window is forced odd; a window of one returns the series unchanged.
pub fn smooth_series(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.is_empty() {
        return values.to_vec();
    }
    let half = if window % 2 == 0 { window / 2 } else { (window - 1) / 2 };

    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            values[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

/// Five-number summary of a set of rates, for box-and-whisker plots.
#[derive(Debug, PartialEq, Clone)]
pub struct RateQuartiles {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Quartiles with linear interpolation between closest ranks, the same
/// convention as `plotters::data::Quartiles`.
pub fn rate_quartiles(rates: &[f64]) -> Result<RateQuartiles, NetError> {
    if rates.is_empty() {
        return Err(NetError::InvalidParameter(
            "Cannot summarize an empty set of rates".to_string(),
        ));
    }

    let sorted: Vec<f64> = rates
        .iter()
        .copied()
        .sorted_by(|a, b| a.total_cmp(b))
        .collect();

    let percentile = |p: f64| -> f64 {
        let h = (sorted.len() - 1) as f64 * p;
        let lo = h.floor() as usize;
        let hi = h.ceil() as usize;
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    };

    Ok(RateQuartiles {
        min: sorted[0],
        q1: percentile(0.25),
        median: percentile(0.5),
        q3: percentile(0.75),
        max: sorted[sorted.len() - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Ei, ModelType, NodeType};
    use crate::placement::Placement;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SEED: u64 = 42;

    fn population() -> NetworkBuilder {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut net = NetworkBuilder::new("internal");
        net.add_nodes(
            3,
            NodeType::new("Scnn1a", Ei::Exc, ModelType::PointProcess).attr("orig_model", "glif"),
            Placement::None,
            &mut rng,
        )
        .unwrap();
        net.add_nodes(
            2,
            NodeType::new("PV1", Ei::Inh, ModelType::PointProcess).attr("orig_model", "glif"),
            Placement::None,
            &mut rng,
        )
        .unwrap();
        net
    }

    #[test]
    fn test_group_nodes() {
        let net = population();

        let groups = group_nodes(std::slice::from_ref(&net), "model_name").unwrap();
        assert_eq!(groups.len(), 2);
        // Ordered by label
        assert_eq!(groups[0].label, "PV1");
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[1].label, "Scnn1a");
        assert_eq!(groups[1].members.len(), 3);

        let groups = group_nodes(std::slice::from_ref(&net), "ei").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "e");
        assert_eq!(groups[1].label, "i");

        let err = group_nodes(std::slice::from_ref(&net), "no_such").unwrap_err();
        assert!(matches!(err, NetError::UnknownProperty(_)));
    }

    #[test]
    fn test_firing_rates() {
        let mut report = SpikeReport::new(0.0, 2000.0).unwrap();
        for t in [100.0, 600.0, 1100.0, 1600.0] {
            report.push("internal", 0, t);
        }
        report.push("internal", 1, 500.0);

        let members = vec![
            ("internal".to_string(), 0),
            ("internal".to_string(), 1),
            ("internal".to_string(), 2),
        ];
        let rates = firing_rates(&report, &members);
        // 4 spikes in 2 s -> 2 Hz, 1 spike -> 0.5 Hz, silent -> 0 Hz
        assert_eq!(rates, vec![2.0, 0.5, 0.0]);
    }

    #[test]
    fn test_binned_rates() {
        let mut report = SpikeReport::new(0.0, 100.0).unwrap();
        report.push("internal", 0, 5.0);
        report.push("internal", 0, 15.0);
        report.push("internal", 1, 15.0);
        report.push("external", 0, 15.0); // not a member

        let members = vec![("internal".to_string(), 0), ("internal".to_string(), 1)];
        let (centers, rates) = binned_rates(&report, &members, 10.0).unwrap();
        assert_eq!(centers.len(), 10);
        assert_eq!(centers[0], 5.0);
        // First bin: 1 spike over 2 nodes in 10 ms -> 50 Hz
        assert_eq!(rates[0], 50.0);
        // Second bin: 2 spikes -> 100 Hz
        assert_eq!(rates[1], 100.0);
        assert!(rates[2..].iter().all(|&r| r == 0.0));

        assert!(matches!(
            binned_rates(&report, &members, 0.0),
            Err(NetError::InvalidParameter(_))
        ));
        assert!(matches!(
            binned_rates(&report, &[], 10.0),
            Err(NetError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_smooth_series() {
        let values = vec![0.0, 0.0, 9.0, 0.0, 0.0];
        assert_eq!(smooth_series(&values, 1), values);
        assert_eq!(smooth_series(&values, 3), vec![0.0, 3.0, 3.0, 3.0, 0.0]);
        // Even windows are forced odd (4 -> 5 behaves as half-width 2)
        let smoothed = smooth_series(&values, 4);
        assert!((smoothed[2] - 9.0 / 5.0).abs() < 1e-12);
        assert_eq!(smooth_series(&[], 3), Vec::<f64>::new());
    }

    #[test]
    fn test_rate_quartiles() {
        let quartiles = rate_quartiles(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(quartiles.min, 1.0);
        assert_eq!(quartiles.q1, 2.0);
        assert_eq!(quartiles.median, 3.0);
        assert_eq!(quartiles.q3, 4.0);
        assert_eq!(quartiles.max, 5.0);

        let quartiles = rate_quartiles(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(quartiles.q1, 1.75);
        assert_eq!(quartiles.median, 2.5);
        assert_eq!(quartiles.q3, 3.25);

        assert!(matches!(
            rate_quartiles(&[]),
            Err(NetError::InvalidParameter(_))
        ));
    }
}
