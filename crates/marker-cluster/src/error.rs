use marker_cluster_lib::{ClusterError, LatLngBounds};
use std::path::PathBuf;

/// Error types for the command line front end
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read items from {}: {source}", path.display())]
    ReadItems {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse items from {}: {source}", path.display())]
    ParseItems {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Item area must not be inverted or cross the antimeridian: {0:?}")]
    InvalidArea(LatLngBounds),

    #[error("Clustering error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out waiting for clusters")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, CliError>;
