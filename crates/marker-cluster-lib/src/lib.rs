//! Marker Cluster Library - Core Data Structures for Map Marker Clustering
//!
//! This library groups large sets of geo-located items into clusters for display at a
//! given map viewport and zoom level. The world is split into a zoom-dependent grid of
//! tiles anchored at the ±180°/±90° origin, every visible tile is queried against a
//! bucketed quadtree, and each non-empty tile becomes a cluster (or a set of singletons
//! when it holds fewer items than the configured minimum).
//!
//! # Architecture
//!
//! - **[`ClusterItem`]**: Accessor trait for anything with a latitude/longitude
//! - **[`QuadTree`]**: Spatial index over the whole world with bucketed nodes
//! - **[`TileGrid`]**: Zoom-dependent tile arithmetic
//! - **[`TileClusterAlgorithm`]**: Default [`ClusteringAlgorithm`] turning a viewport into [`Cluster`]s
//! - **[`ClusterManager`]**: Single background worker serializing rebuilds and clustering passes
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N log N) for well distributed items
//! - **Query Time**: O(T × (log N + K)) where T=visible tiles, K=items per tile
//! - **Memory**: O(N) items shared through `Arc`, plus O(N / capacity) nodes

mod algorithm;
mod bounds;
mod cluster;
mod item;
mod manager;
mod quadtree;
mod tiles;

// Public API exports
pub use algorithm::{ClusteringAlgorithm, Config, TileClusterAlgorithm};
pub use bounds::LatLngBounds;
pub use cluster::Cluster;
pub use item::{ClusterItem, MapItem};
pub use manager::{Camera, ClusterManager, ClusterSnapshot};
pub use quadtree::QuadTree;
pub use tiles::{TileGrid, TileRange};

/// Error types for the clustering library
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusterError {
    #[error("Minimum cluster size must be at least 1, got {0}")]
    InvalidMinClusterSize(usize),

    #[error("Quadtree bucket capacity must be at least 1, got {0}")]
    InvalidBucketCapacity(usize),

    #[error("Invalid viewport bounds: {reason}")]
    InvalidBounds { reason: String },

    #[error("Invalid zoom level {zoom}: {reason}")]
    InvalidZoom { zoom: f64, reason: String },

    #[error("Cluster manager requires a running tokio runtime")]
    NoRuntime,

    #[error("Cluster worker has stopped")]
    WorkerStopped,
}

pub type Result<T> = std::result::Result<T, ClusterError>;
