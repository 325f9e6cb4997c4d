//! Cluster records produced by a clustering pass
//!
//! A cluster is identified by its position alone. Two clusters computed in
//! different passes compare equal when their centroids are bitwise equal, which
//! lets a renderer keep the marker of an unchanged cluster instead of recreating it.

use crate::{ClusterItem, LatLngBounds};
use geo::Point;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A group of items shown as a single marker
#[derive(Debug)]
pub struct Cluster<T> {
    /// Centroid (arithmetic mean of the members, or the item itself for singletons)
    position: Point<f64>,
    /// Member items in query order
    items: Vec<Arc<T>>,
    /// Tile this cluster was computed for
    bounds: LatLngBounds,
}

impl<T> Clone for Cluster<T> {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            items: self.items.clone(),
            bounds: self.bounds,
        }
    }
}

impl<T: ClusterItem> Cluster<T> {
    /// Aggregate `items` into one cluster whose position is their mean
    ///
    /// Returns `None` for an empty item list.
    pub fn from_items(items: Vec<Arc<T>>, bounds: LatLngBounds) -> Option<Self> {
        if items.is_empty() {
            return None;
        }

        let (total_latitude, total_longitude) = items
            .iter()
            .fold((0.0, 0.0), |(lat, lon), item| {
                (lat + item.latitude(), lon + item.longitude())
            });
        let count = items.len() as f64;

        Some(Self {
            position: Point::new(total_longitude / count, total_latitude / count),
            items,
            bounds,
        })
    }

    /// A one-item cluster positioned exactly on the item
    ///
    /// `bounds` is still the whole tile so tile containment tests behave the same
    /// as for multi-item clusters.
    pub fn singleton(item: Arc<T>, bounds: LatLngBounds) -> Self {
        Self {
            position: item.position(),
            items: vec![item],
            bounds,
        }
    }
}

impl<T> Cluster<T> {
    /// Centroid (`x` = longitude, `y` = latitude)
    #[inline]
    pub fn position(&self) -> Point<f64> {
        self.position
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    /// Member items
    #[inline]
    pub fn items(&self) -> &[Arc<T>] {
        &self.items
    }

    /// Number of member items
    #[inline]
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Tile rect the cluster was computed for
    #[inline]
    pub fn bounds(&self) -> LatLngBounds {
        self.bounds
    }

    /// Whether a coordinate lies in the cluster's tile (edges included)
    #[inline]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.bounds.contains(latitude, longitude)
    }
}

impl<T> PartialEq for Cluster<T> {
    fn eq(&self, other: &Self) -> bool {
        self.position.y().to_bits() == other.position.y().to_bits()
            && self.position.x().to_bits() == other.position.x().to_bits()
    }
}

impl<T> Eq for Cluster<T> {}

impl<T> Hash for Cluster<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.y().to_bits().hash(state);
        self.position.x().to_bits().hash(state);
    }
}
