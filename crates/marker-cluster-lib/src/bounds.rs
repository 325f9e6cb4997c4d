//! Latitude/longitude rectangles used for quadtree nodes, tiles and viewports

use crate::{ClusterError, Result};

/// Northern edge of the world in degrees
pub const WORLD_NORTH: f64 = 90.0;
/// Southern edge of the world in degrees
pub const WORLD_SOUTH: f64 = -90.0;
/// Western edge of the world in degrees
pub const WORLD_WEST: f64 = -180.0;
/// Eastern edge of the world in degrees
pub const WORLD_EAST: f64 = 180.0;

/// A rectangle in WGS84 degrees
///
/// Longitudes are plain numbers: a rect never wraps implicitly. A viewport whose
/// `west` is greater than its `east` crosses the antimeridian and must be split
/// with [`LatLngBounds::split_antimeridian`] before it is used as a query.
/// All containment and intersection tests are inclusive on every side.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLngBounds {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl LatLngBounds {
    /// Create bounds from the four edges
    #[inline]
    pub const fn new(north: f64, west: f64, south: f64, east: f64) -> Self {
        Self {
            north,
            west,
            south,
            east,
        }
    }

    /// The whole world: lat [-90, 90], lon [-180, 180]
    #[inline]
    pub const fn world() -> Self {
        Self::new(WORLD_NORTH, WORLD_WEST, WORLD_SOUTH, WORLD_EAST)
    }

    /// Check whether a coordinate lies inside (edges included)
    #[inline]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        longitude >= self.west
            && longitude <= self.east
            && latitude <= self.north
            && latitude >= self.south
    }

    /// Check whether two rects share any point (touching edges count)
    #[inline]
    pub fn intersects(&self, other: &LatLngBounds) -> bool {
        !(self.east < other.west
            || self.west > other.east
            || self.north < other.south
            || self.south > other.north)
    }

    /// Midpoint latitude
    #[inline]
    pub fn center_latitude(&self) -> f64 {
        (self.north + self.south) / 2.0
    }

    /// Midpoint longitude (plain arithmetic, no wraparound)
    #[inline]
    pub fn center_longitude(&self) -> f64 {
        (self.west + self.east) / 2.0
    }

    /// Split into the four equal quadrants in NW, NE, SW, SE order
    pub fn quadrants(&self) -> [LatLngBounds; 4] {
        let mid_lat = self.center_latitude();
        let mid_lon = self.center_longitude();
        [
            LatLngBounds::new(self.north, self.west, mid_lat, mid_lon),
            LatLngBounds::new(self.north, mid_lon, mid_lat, self.east),
            LatLngBounds::new(mid_lat, self.west, self.south, mid_lon),
            LatLngBounds::new(mid_lat, mid_lon, self.south, self.east),
        ]
    }

    /// Whether this viewport crosses the ±180° meridian
    #[inline]
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Split a viewport into plain rects
    ///
    /// Returns `[west, 180]` and `[-180, east]` when the viewport crosses the
    /// antimeridian, otherwise the viewport itself.
    pub fn split_antimeridian(&self) -> (LatLngBounds, Option<LatLngBounds>) {
        if self.crosses_antimeridian() {
            (
                LatLngBounds::new(self.north, self.west, self.south, WORLD_EAST),
                Some(LatLngBounds::new(
                    self.north,
                    WORLD_WEST,
                    self.south,
                    self.east,
                )),
            )
        } else {
            (*self, None)
        }
    }

    /// Reject bounds with NaN or infinite edges
    pub fn validate(&self) -> Result<()> {
        let edges = [
            ("north", self.north),
            ("west", self.west),
            ("south", self.south),
            ("east", self.east),
        ];
        for (name, value) in edges {
            if !value.is_finite() {
                return Err(ClusterError::InvalidBounds {
                    reason: format!("{name} edge is not finite ({value})"),
                });
            }
        }
        Ok(())
    }
}

impl Default for LatLngBounds {
    fn default() -> Self {
        Self::world()
    }
}
