//! Simulation/analysis configuration files.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::NetError;

fn default_spikes_file() -> String {
    "spikes.json".to_string()
}

/// A JSON configuration tying together a network directory and the output
/// of a simulation run. All analysis entry points start from one of these.
///
/// Relative paths are resolved against the directory containing the config
/// file when loaded with [`SimConfig::from_file`].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Directory holding the saved population files.
    pub network_dir: PathBuf,
    /// Directory holding the simulator output.
    pub output_dir: PathBuf,
    /// The populations to load from the network directory.
    pub populations: Vec<String>,
    /// Spike report filename inside the output directory.
    #[serde(default = "default_spikes_file")]
    pub spikes_file: String,
    /// Trace report filename inside the output directory, if traces were recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traces_file: Option<String>,
}

impl SimConfig {
    /// Load a configuration file, resolving relative paths against its directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NetError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| NetError::IOError(format!("{}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);
        let mut config: SimConfig = serde_json::from_reader(reader)?;

        if let Some(base) = path.parent() {
            if config.network_dir.is_relative() {
                config.network_dir = base.join(&config.network_dir);
            }
            if config.output_dir.is_relative() {
                config.output_dir = base.join(&config.output_dir);
            }
        }
        Ok(config)
    }

    /// Write the configuration to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NetError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// The full path of the spike report.
    pub fn spikes_path(&self) -> PathBuf {
        self.output_dir.join(&self.spikes_file)
    }

    /// The full path of the trace report, if one is configured.
    pub fn traces_path(&self) -> Option<PathBuf> {
        self.traces_file
            .as_ref()
            .map(|name| self.output_dir.join(name))
    }
}
