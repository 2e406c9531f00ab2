//! Simulation output reports: spikes and sampled traces.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// A single spike emitted during a simulation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpikeRecord {
    /// The population the spiking node belongs to.
    pub population: String,
    /// The ID of the spiking node.
    pub node_id: usize,
    /// The spike time, in milliseconds.
    pub time: f64,
}

/// All spikes recorded over an observation window.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpikeReport {
    /// Start of the observation window, in milliseconds.
    pub tstart: f64,
    /// End of the observation window, in milliseconds.
    pub tstop: f64,
    /// The recorded spikes, sorted by time.
    pub spikes: Vec<SpikeRecord>,
}

impl SpikeReport {
    /// Create an empty report over an observation window.
    pub fn new(tstart: f64, tstop: f64) -> Result<Self, NetError> {
        if !(tstop > tstart) {
            return Err(NetError::InvalidReport(format!(
                "The observation window [{}, {}] is empty",
                tstart, tstop
            )));
        }
        Ok(SpikeReport {
            tstart,
            tstop,
            spikes: Vec::new(),
        })
    }

    /// The duration of the observation window, in milliseconds.
    pub fn duration(&self) -> f64 {
        self.tstop - self.tstart
    }

    /// Record a spike. Spikes may be pushed out of order; they are sorted on save and load.
    pub fn push(&mut self, population: impl Into<String>, node_id: usize, time: f64) {
        self.spikes.push(SpikeRecord {
            population: population.into(),
            node_id,
            time,
        });
    }

    /// The spike times of one node, in report order.
    pub fn times_of(&self, population: &str, node_id: usize) -> Vec<f64> {
        self.spikes
            .iter()
            .filter(|spike| spike.population == population && spike.node_id == node_id)
            .map(|spike| spike.time)
            .collect()
    }

    fn validate(&self) -> Result<(), NetError> {
        if !(self.tstop > self.tstart) {
            return Err(NetError::InvalidReport(format!(
                "The observation window [{}, {}] is empty",
                self.tstart, self.tstop
            )));
        }
        for spike in &self.spikes {
            if !spike.time.is_finite() || spike.time < self.tstart || spike.time > self.tstop {
                return Err(NetError::InvalidReport(format!(
                    "Spike of node {}/{} at t={} falls outside the observation window [{}, {}]",
                    spike.population, spike.node_id, spike.time, self.tstart, self.tstop
                )));
            }
        }
        Ok(())
    }

    /// Write the report to a JSON file, with spikes sorted by time.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NetError> {
        self.validate()?;
        let mut sorted = self.clone();
        sorted.spikes.sort_by(|a, b| a.time.total_cmp(&b.time));

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &sorted)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a report from a JSON file, sorting spikes by time and
    /// validating them against the observation window.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NetError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| NetError::IOError(format!("{}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);
        let mut report: SpikeReport = serde_json::from_reader(reader)?;
        report.validate()?;
        report.spikes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(report)
    }
}

/// The sampled values of one trace variable for one node.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Trace {
    /// The population the node belongs to.
    pub population: String,
    /// The recorded node.
    pub node_id: usize,
    /// The sampled values, one per time step.
    pub values: Vec<f64>,
}

/// A variable sampled at a fixed time step for a set of nodes,
/// e.g. membrane potentials.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TraceReport {
    /// The name of the recorded variable, e.g. "V_m".
    pub variable: String,
    /// The sampling step, in milliseconds.
    pub dt: f64,
    /// The time of the first sample, in milliseconds.
    pub tstart: f64,
    /// One trace per recorded node.
    pub traces: Vec<Trace>,
}

impl TraceReport {
    fn validate(&self) -> Result<(), NetError> {
        if !(self.dt > 0.0) {
            return Err(NetError::InvalidReport(format!(
                "The sampling step must be positive, got {}",
                self.dt
            )));
        }
        if let Some(first) = self.traces.first() {
            let len = first.values.len();
            if len == 0 {
                return Err(NetError::InvalidReport(
                    "Traces must contain at least one sample".to_string(),
                ));
            }
            for trace in &self.traces {
                if trace.values.len() != len {
                    return Err(NetError::InvalidReport(format!(
                        "Trace of node {}/{} has {} samples, expected {}",
                        trace.population,
                        trace.node_id,
                        trace.values.len(),
                        len
                    )));
                }
                if trace.values.iter().any(|value| !value.is_finite()) {
                    return Err(NetError::InvalidReport(format!(
                        "Trace of node {}/{} contains a non-finite sample",
                        trace.population, trace.node_id
                    )));
                }
            }
        }
        Ok(())
    }

    /// The number of samples per trace.
    pub fn num_samples(&self) -> usize {
        self.traces.first().map_or(0, |trace| trace.values.len())
    }

    /// The sample times shared by all traces, in milliseconds.
    pub fn times(&self) -> Vec<f64> {
        (0..self.num_samples())
            .map(|i| self.tstart + i as f64 * self.dt)
            .collect()
    }

    /// Write the report to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NetError> {
        self.validate()?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Load and validate a report from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NetError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| NetError::IOError(format!("{}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);
        let report: TraceReport = serde_json::from_reader(reader)?;
        report.validate()?;
        Ok(report)
    }
}
