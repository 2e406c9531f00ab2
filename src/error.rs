//! Error module for the pointnet library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum NetError {
    /// Error for invalid parameters, e.g., a connection probability outside [0, 1].
    InvalidParameter(String),
    /// Error for an unknown node property used for filtering or grouping.
    UnknownProperty(String),
    /// Error for a population that cannot be found in the network directory.
    PopulationNotFound(String),
    /// Error for a malformed spike or trace report.
    InvalidReport(String),
    /// Error while rendering a figure.
    PlotError(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NetError::InvalidParameter(e) => write!(f, "Invalid parameter: {}", e),
            NetError::UnknownProperty(e) => write!(f, "Unknown node property: {}", e),
            NetError::PopulationNotFound(e) => write!(f, "Population not found: {}", e),
            NetError::InvalidReport(e) => write!(f, "Invalid report: {}", e),
            NetError::PlotError(e) => write!(f, "Plot error: {}", e),
            NetError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for NetError {}

impl From<std::io::Error> for NetError {
    fn from(e: std::io::Error) -> Self {
        NetError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for NetError {
    fn from(e: serde_json::Error) -> Self {
        NetError::IOError(e.to_string())
    }
}
