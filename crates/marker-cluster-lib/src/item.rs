//! Clusterable item trait and a ready-made item type
//!
//! Anything that can report a WGS84 position can be clustered. The position is
//! a `geo::Point` with `x` = longitude and `y` = latitude, as elsewhere in `geo`.

use geo::Point;

/// An item that can be placed on the map and grouped into clusters
///
/// Implementations must return the same position for the lifetime of an index
/// build; items are never re-read after insertion.
pub trait ClusterItem: Send + Sync {
    /// Position of the item (`x` = longitude, `y` = latitude, in degrees)
    fn position(&self) -> Point<f64>;

    /// Optional title shown by the renderer
    fn title(&self) -> Option<&str> {
        None
    }

    /// Optional secondary text shown by the renderer
    fn snippet(&self) -> Option<&str> {
        None
    }

    /// Latitude in degrees
    #[inline]
    fn latitude(&self) -> f64 {
        self.position().y()
    }

    /// Longitude in degrees
    #[inline]
    fn longitude(&self) -> f64 {
        self.position().x()
    }
}

impl ClusterItem for Point<f64> {
    #[inline]
    fn position(&self) -> Point<f64> {
        *self
    }
}

/// A plain map marker with optional title and snippet
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapItem {
    pub latitude: f64,
    pub longitude: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub snippet: Option<String>,
}

impl MapItem {
    /// Create an untitled item at the given coordinates
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            title: None,
            snippet: None,
        }
    }

    /// Attach a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach a snippet
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl ClusterItem for MapItem {
    #[inline]
    fn position(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_item_position() {
        let item = MapItem::new(52.37, 4.89);
        assert_eq!(item.position(), Point::new(4.89, 52.37));
        assert_eq!(item.latitude(), 52.37);
        assert_eq!(item.longitude(), 4.89);
    }

    #[test]
    fn test_map_item_text() {
        let item = MapItem::new(0.0, 0.0)
            .with_title("Amsterdam")
            .with_snippet("Capital");
        assert_eq!(item.title(), Some("Amsterdam"));
        assert_eq!(item.snippet(), Some("Capital"));

        let untitled = MapItem::new(0.0, 0.0);
        assert!(untitled.title().is_none());
        assert!(untitled.snippet().is_none());
    }

    #[test]
    fn test_point_is_cluster_item() {
        let point = Point::new(10.0, 20.0);
        assert_eq!(point.latitude(), 20.0);
        assert_eq!(point.longitude(), 10.0);
        assert!(point.title().is_none());
    }
}
