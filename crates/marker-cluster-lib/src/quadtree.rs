//! Quadtree spatial index for rectangular range queries
//!
//! The tree is rooted at the whole world (lat [-90, 90], lon [-180, 180]). Every node
//! keeps a small bucket of items; once a bucket overflows, the node splits into four
//! equal quadrants, hands its items down, and from then on only its children hold
//! items. Nodes are never merged back, the tree only grows until it is rebuilt.

use crate::{ClusterError, ClusterItem, LatLngBounds, Result};
use smallvec::SmallVec;
use std::sync::Arc;

/// Default number of items a node holds before it subdivides
pub const DEFAULT_BUCKET_CAPACITY: usize = 4;

/// Maximum depth of the quadtree to prevent infinite recursion on duplicate positions
const MAX_DEPTH: u32 = 32;

type Bucket<T> = SmallVec<[Arc<T>; DEFAULT_BUCKET_CAPACITY]>;

/// Root container for the quadtree spatial index
#[derive(Debug)]
pub struct QuadTree<T> {
    /// Root node covering the entire world
    root: QuadTreeNode<T>,
    /// Items per node before subdivision
    bucket_capacity: usize,
    /// Number of stored items
    len: usize,
}

/// A single node in the quadtree
#[derive(Debug)]
struct QuadTreeNode<T> {
    /// Region covered by this node
    bounds: LatLngBounds,
    /// Depth level in the tree (0 = root)
    level: u32,
    /// Items stored directly at this node (always empty once subdivided)
    bucket: Bucket<T>,
    /// Child nodes (NW, NE, SW, SE) if subdivided
    children: Option<Box<[QuadTreeNode<T>; 4]>>,
}

impl<T: ClusterItem> Default for QuadTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem> QuadTree<T> {
    /// Create an empty quadtree with the default bucket capacity
    pub fn new() -> Self {
        Self {
            root: QuadTreeNode::new(LatLngBounds::world(), 0),
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            len: 0,
        }
    }

    /// Create an empty quadtree whose nodes split after `bucket_capacity` items
    pub fn with_bucket_capacity(bucket_capacity: usize) -> Result<Self> {
        if bucket_capacity == 0 {
            return Err(ClusterError::InvalidBucketCapacity(bucket_capacity));
        }
        Ok(Self {
            bucket_capacity,
            ..Self::new()
        })
    }

    /// An empty tree with the same bucket capacity
    pub fn empty_like(&self) -> Self {
        Self {
            root: QuadTreeNode::new(LatLngBounds::world(), 0),
            bucket_capacity: self.bucket_capacity,
            len: 0,
        }
    }

    /// Discard the current tree and index `items` from scratch
    ///
    /// Returns the number of items that were rejected because their position
    /// lies outside the world rect.
    pub fn build<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        self.clear();

        let mut discarded = 0;
        for item in items {
            if !self.insert(item) {
                discarded += 1;
            }
        }

        if discarded > 0 {
            tracing::warn!(
                "Skipped {} items positioned outside the world bounds",
                discarded
            );
        }
        tracing::debug!(
            items = self.len,
            nodes = self.node_count(),
            depth = self.depth(),
            "Built quadtree"
        );

        discarded
    }

    /// Insert a single item
    ///
    /// Returns `false` (and stores nothing) when the item lies outside the
    /// world rect, including NaN coordinates.
    pub fn insert(&mut self, item: Arc<T>) -> bool {
        let (latitude, longitude) = (item.latitude(), item.longitude());
        if !self.root.bounds.contains(latitude, longitude) {
            tracing::trace!(latitude, longitude, "Item outside world bounds");
            return false;
        }

        let inserted = self
            .root
            .insert(item, latitude, longitude, self.bucket_capacity);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Collect every item whose position lies inside `range` (edges included)
    ///
    /// The result order is unspecified.
    pub fn query_range(&self, range: &LatLngBounds) -> Vec<Arc<T>> {
        let mut results = Vec::new();
        self.root.query(range, &mut results);
        results
    }

    /// Reset to an empty root
    pub fn clear(&mut self) {
        self.root = QuadTreeNode::new(LatLngBounds::world(), 0);
        self.len = 0;
    }

    /// Number of stored items
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no items are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Items per node before subdivision
    #[inline]
    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    /// Deepest level reached by any node (0 = only the root)
    pub fn depth(&self) -> u32 {
        self.root.depth()
    }

    /// Total number of nodes, the root included
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

impl<T: ClusterItem> QuadTreeNode<T> {
    fn new(bounds: LatLngBounds, level: u32) -> Self {
        Self {
            bounds,
            level,
            bucket: SmallVec::new(),
            children: None,
        }
    }

    /// Insert an item already known to lie inside this node
    fn insert(&mut self, item: Arc<T>, latitude: f64, longitude: f64, capacity: usize) -> bool {
        if let Some(children) = &mut self.children {
            // First matching quadrant wins for items on a shared edge
            return match children
                .iter_mut()
                .find(|child| child.bounds.contains(latitude, longitude))
            {
                Some(child) => child.insert(item, latitude, longitude, capacity),
                None => false,
            };
        }

        if self.bucket.len() < capacity || self.level >= MAX_DEPTH {
            self.bucket.push(item);
            return true;
        }

        self.subdivide(capacity);
        self.insert(item, latitude, longitude, capacity)
    }

    /// Split into 4 children and hand the bucket down
    fn subdivide(&mut self, capacity: usize) {
        if self.children.is_some() {
            return; // Already subdivided
        }

        let child_level = self.level + 1;
        let [nw, ne, sw, se] = self.bounds.quadrants();
        self.children = Some(Box::new([
            QuadTreeNode::new(nw, child_level),
            QuadTreeNode::new(ne, child_level),
            QuadTreeNode::new(sw, child_level),
            QuadTreeNode::new(se, child_level),
        ]));

        for item in std::mem::take(&mut self.bucket) {
            let (latitude, longitude) = (item.latitude(), item.longitude());
            self.insert(item, latitude, longitude, capacity);
        }
    }

    fn query(&self, range: &LatLngBounds, results: &mut Vec<Arc<T>>) {
        if !self.bounds.intersects(range) {
            return;
        }

        results.extend(
            self.bucket
                .iter()
                .filter(|item| range.contains(item.latitude(), item.longitude()))
                .cloned(),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(range, results);
            }
        }
    }

    fn depth(&self) -> u32 {
        match &self.children {
            Some(children) => children
                .iter()
                .map(QuadTreeNode::depth)
                .max()
                .unwrap_or(self.level),
            None => self.level,
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(QuadTreeNode::node_count).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapItem;

    fn item(latitude: f64, longitude: f64) -> Arc<MapItem> {
        Arc::new(MapItem::new(latitude, longitude))
    }

    fn tree_with(points: &[(f64, f64)]) -> QuadTree<MapItem> {
        let mut tree = QuadTree::new();
        tree.build(points.iter().map(|&(lat, lon)| item(lat, lon)));
        tree
    }

    #[test]
    fn test_quadtree_creation() {
        let tree: QuadTree<MapItem> = QuadTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.bucket_capacity(), DEFAULT_BUCKET_CAPACITY);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.depth(), 0);
        assert!(tree.root.children.is_none());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = QuadTree::<MapItem>::with_bucket_capacity(0);
        assert!(matches!(result, Err(ClusterError::InvalidBucketCapacity(0))));
    }

    #[test]
    fn test_bucket_fills_before_subdividing() {
        let tree = tree_with(&[(10.0, 10.0), (-10.0, 10.0), (10.0, -10.0), (-10.0, -10.0)]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root.bucket.len(), 4);
        assert!(tree.root.children.is_none());
    }

    #[test]
    fn test_fifth_item_subdivides_once() {
        // One item per world quadrant plus one more, so every child stays under capacity
        let tree = tree_with(&[
            (45.0, -90.0),
            (45.0, 90.0),
            (-45.0, -90.0),
            (-45.0, 90.0),
            (46.0, 91.0),
        ]);

        assert_eq!(tree.len(), 5);
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.depth(), 1);
        assert!(tree.root.bucket.is_empty());

        let children = tree.root.children.as_ref().unwrap();
        let sizes: Vec<usize> = children.iter().map(|c| c.bucket.len()).collect();
        assert_eq!(sizes, vec![1, 2, 1, 1]);
        for child in children.iter() {
            assert_eq!(child.level, 1);
        }
    }

    #[test]
    fn test_boundary_item_goes_to_first_quadrant() {
        let mut tree = tree_with(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        // The world center lies in all four quadrants, NW is checked first
        tree.insert(item(0.0, 0.0));

        let children = tree.root.children.as_ref().unwrap();
        assert!(
            children[0]
                .bucket
                .iter()
                .any(|i| i.latitude == 0.0 && i.longitude == 0.0)
        );
    }

    #[test]
    fn test_clustered_items_remain_retrievable() {
        let points = [(1.0, 1.0), (2.0, 3.0), (5.0, 5.0), (9.0, 9.5), (10.0, 10.0)];
        let tree = tree_with(&points);

        let inside = tree.query_range(&LatLngBounds::new(10.0, 0.0, 0.0, 10.0));
        assert_eq!(inside.len(), 5);

        let outside = tree.query_range(&LatLngBounds::new(30.0, 20.0, 20.0, 30.0));
        assert!(outside.is_empty());
    }

    #[test]
    fn test_world_query_returns_everything() {
        let points: Vec<(f64, f64)> = (0..200)
            .map(|i| {
                let t = i as f64;
                ((t * 0.83) % 180.0 - 90.0, (t * 1.79) % 360.0 - 180.0)
            })
            .collect();
        let tree = tree_with(&points);

        assert_eq!(tree.len(), 200);
        assert_eq!(tree.query_range(&LatLngBounds::world()).len(), 200);
    }

    #[test]
    fn test_degenerate_query_matches_exact_position() {
        let tree = tree_with(&[
            (12.5, 7.25),
            (12.5, 7.26),
            (12.6, 7.25),
            (-3.0, 100.0),
            (40.0, -70.0),
        ]);

        let hits = tree.query_range(&LatLngBounds::new(12.5, 7.25, 12.5, 7.25));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].latitude, 12.5);
        assert_eq!(hits[0].longitude, 7.25);
    }

    #[test]
    fn test_out_of_world_items_are_rejected() {
        let mut tree = QuadTree::new();
        let discarded = tree.build(vec![
            item(95.0, 0.0),
            item(0.0, 200.0),
            item(f64::NAN, 0.0),
            item(1.0, 1.0),
        ]);

        assert_eq!(discarded, 3);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.query_range(&LatLngBounds::new(180.0, -360.0, -180.0, 360.0)).len(), 1);
    }

    #[test]
    fn test_duplicate_positions_stop_at_max_depth() {
        let mut tree = QuadTree::new();
        tree.build((0..50).map(|_| item(52.0, 5.0)));

        assert_eq!(tree.len(), 50);
        assert!(tree.depth() <= MAX_DEPTH);
        assert_eq!(
            tree.query_range(&LatLngBounds::new(52.0, 5.0, 52.0, 5.0)).len(),
            50
        );
    }

    #[test]
    fn test_build_replaces_previous_items() {
        let mut tree = tree_with(&[(1.0, 1.0), (2.0, 2.0)]);
        tree.build(vec![item(-1.0, -1.0)]);

        assert_eq!(tree.len(), 1);
        let all = tree.query_range(&LatLngBounds::world());
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].latitude, -1.0);
    }

    #[test]
    fn test_clear() {
        let mut tree = tree_with(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0), (5.0, 5.0)]);
        assert!(tree.node_count() > 1);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert!(tree.query_range(&LatLngBounds::world()).is_empty());
    }

    #[test]
    fn test_custom_capacity() {
        let mut tree = QuadTree::with_bucket_capacity(1).unwrap();
        tree.build(vec![item(45.0, -90.0), item(-45.0, 90.0)]);
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.len(), 2);
    }
}
