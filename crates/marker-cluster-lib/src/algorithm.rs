//! Clustering strategies
//!
//! [`ClusteringAlgorithm`] is the seam the [`ClusterManager`](crate::ClusterManager)
//! talks to, so a different strategy can be swapped in at runtime.
//! [`TileClusterAlgorithm`] is the default: it queries a [`QuadTree`] once per tile
//! of the zoom-dependent [`TileGrid`] and turns every non-empty tile into a cluster.

use crate::quadtree::DEFAULT_BUCKET_CAPACITY;
use crate::{
    Cluster, ClusterError, ClusterItem, LatLngBounds, QuadTree, Result, TileGrid, TileRange,
};
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// A strategy that groups items into clusters for a viewport
pub trait ClusteringAlgorithm<T>: Send {
    /// Set the smallest number of items shown as one cluster
    ///
    /// Tiles with fewer items are emitted as one singleton cluster per item.
    /// Fails without changing anything when `min_cluster_size` is 0.
    fn set_min_cluster_size(&mut self, min_cluster_size: usize) -> Result<()>;

    /// Replace all indexed items
    fn set_items(&mut self, items: &[Arc<T>]);

    /// Compute the clusters visible in `bounds` at `zoom`
    fn get_clusters(&self, bounds: &LatLngBounds, zoom: f64) -> Result<Vec<Cluster<T>>>;
}

/// Configuration for the tile clustering algorithm
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Tiles holding fewer items than this are shown as individual items.
    /// Default: 1 (every non-empty tile becomes a cluster)
    pub min_cluster_size: usize,
    /// Items per quadtree node before it subdivides.
    /// Default: 4
    pub bucket_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_cluster_size: 1,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }
}

impl Config {
    /// Check every field, reporting the first invalid one
    pub fn validate(&self) -> Result<()> {
        if self.min_cluster_size == 0 {
            return Err(ClusterError::InvalidMinClusterSize(self.min_cluster_size));
        }
        if self.bucket_capacity == 0 {
            return Err(ClusterError::InvalidBucketCapacity(self.bucket_capacity));
        }
        Ok(())
    }
}

/// Default clustering strategy: one cluster per non-empty grid tile
///
/// Each [`ClusteringAlgorithm::set_items`] builds a fresh quadtree and swaps it in as
/// an immutable snapshot; clustering passes only ever read a complete tree.
pub struct TileClusterAlgorithm<T> {
    /// Index over the current item set
    index: Arc<QuadTree<T>>,
    /// Configuration settings
    config: Config,
    /// Incremented on every rebuild
    items_version: u64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem> TileClusterAlgorithm<T> {
    /// Create an algorithm with an empty index
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let index = QuadTree::with_bucket_capacity(config.bucket_capacity)?;
        Ok(Self {
            index: Arc::new(index),
            config,
            items_version: 0,
        })
    }

    /// Create an algorithm and index `items` right away
    pub fn with_items<I>(config: Config, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut algorithm = Self::new(config)?;
        let items: Vec<Arc<T>> = items.into_iter().map(Arc::new).collect();
        algorithm.set_items(&items);
        Ok(algorithm)
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The index snapshot the next clustering pass will read
    #[inline]
    pub fn index(&self) -> &Arc<QuadTree<T>> {
        &self.index
    }

    /// Number of item sets indexed so far
    #[inline]
    pub fn items_version(&self) -> u64 {
        self.items_version
    }

    /// Cluster one tile, keeping only the items the tile owns
    ///
    /// An item on a shared edge or corner is returned by every visited tile whose
    /// rect contains it. It belongs to the one with the lowest column, then the
    /// lowest row, so a tile drops items that a visited neighbour before it also
    /// contains. Ownership uses the same rects that were queried.
    fn cluster_tile(
        &self,
        grid: &TileGrid,
        visited: &[TileRange],
        x: i64,
        y: i64,
    ) -> Vec<Cluster<T>> {
        let bounds = grid.tile_bounds(x, y);
        let mut items = self.index.query_range(&bounds);
        if items.is_empty() {
            return Vec::new();
        }

        let earlier: SmallVec<[LatLngBounds; 4]> =
            [(x - 1, y - 1), (x - 1, y), (x - 1, y + 1), (x, y - 1)]
                .into_iter()
                .filter(|&(nx, ny)| visited.iter().any(|range| range.contains(nx, ny)))
                .map(|(nx, ny)| grid.tile_bounds(nx, ny))
                .collect();
        items.retain(|item| {
            let (latitude, longitude) = (item.latitude(), item.longitude());
            !earlier
                .iter()
                .any(|neighbour| neighbour.contains(latitude, longitude))
        });

        if items.is_empty() {
            return Vec::new();
        }

        if items.len() >= self.config.min_cluster_size {
            Cluster::from_items(items, bounds).into_iter().collect()
        } else {
            items
                .into_iter()
                .map(|item| Cluster::singleton(item, bounds))
                .collect()
        }
    }
}

impl<T: ClusterItem> ClusteringAlgorithm<T> for TileClusterAlgorithm<T> {
    fn set_min_cluster_size(&mut self, min_cluster_size: usize) -> Result<()> {
        if min_cluster_size == 0 {
            return Err(ClusterError::InvalidMinClusterSize(min_cluster_size));
        }
        self.config.min_cluster_size = min_cluster_size;
        Ok(())
    }

    fn set_items(&mut self, items: &[Arc<T>]) {
        #[cfg(feature = "profiling")]
        profiling::scope!("tile_cluster::set_items");

        // Build off to the side; the current snapshot stays untouched until the swap
        let mut index = self.index.empty_like();
        index.build(items.iter().cloned());

        self.index = Arc::new(index);
        self.items_version += 1;
        tracing::debug!(
            version = self.items_version,
            items = self.index.len(),
            "Replaced cluster items"
        );
    }

    fn get_clusters(&self, bounds: &LatLngBounds, zoom: f64) -> Result<Vec<Cluster<T>>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("tile_cluster::get_clusters");

        bounds.validate()?;
        let grid = TileGrid::for_zoom(zoom)?;

        let ranges = grid.viewport_ranges(bounds);
        let visited = ranges.as_slice();
        let mut clusters = Vec::new();
        for range in visited {
            // Columns are handed out lazily; the tile list is never materialized
            let part: Vec<Cluster<T>> = (range.min_x..=range.max_x)
                .into_par_iter()
                .flat_map_iter(|x| {
                    (range.min_y..=range.max_y)
                        .flat_map(move |y| self.cluster_tile(&grid, visited, x, y))
                })
                .collect();
            clusters.extend(part);
        }

        tracing::debug!(
            zoom,
            tile_count = grid.tile_count(),
            tiles = visited.iter().map(TileRange::len).sum::<usize>(),
            clusters = clusters.len(),
            "Computed clusters"
        );

        Ok(clusters)
    }
}
