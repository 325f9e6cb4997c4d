//! Zoom-dependent tile grid
//!
//! At zoom `z` the world is cut into `floor(2^z * 2)` columns and as many rows,
//! anchored at (90°N, 180°W). Column `x` spans longitudes
//! `[x * step_lon - 180, (x + 1) * step_lon - 180]`, row `y` spans latitudes
//! `[90 - (y + 1) * step_lat, 90 - y * step_lat]`. Because the grid never moves with
//! the viewport, a tile keeps its identity while the map is panned.
//!
//! Neighbouring rects are computed independently and may disagree on a shared
//! edge by one ulp, so edge ownership must be decided with [`TileGrid::tile_bounds`]
//! itself, never by re-deriving an index from a coordinate.

use crate::bounds::{WORLD_NORTH, WORLD_WEST};
use crate::{ClusterError, LatLngBounds, Result};

/// Largest tile count whose indices are still exact in an `f64`
const MAX_TILE_COUNT: f64 = (1u64 << 52) as f64;

/// Tile dimensions for one zoom level
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGrid {
    tile_count: u64,
    step_latitude: f64,
    step_longitude: f64,
}

/// Inclusive block of tile indices, iterated column by column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRange {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl TileGrid {
    /// Grid for a (possibly fractional) zoom level
    pub fn for_zoom(zoom: f64) -> Result<Self> {
        if !zoom.is_finite() {
            return Err(ClusterError::InvalidZoom {
                zoom,
                reason: "zoom is not finite".to_string(),
            });
        }

        let tile_count = (2f64.powf(zoom) * 2.0).floor();
        if tile_count < 1.0 {
            return Err(ClusterError::InvalidZoom {
                zoom,
                reason: "zoom yields no tiles".to_string(),
            });
        }
        if tile_count > MAX_TILE_COUNT {
            return Err(ClusterError::InvalidZoom {
                zoom,
                reason: "zoom yields too many tiles".to_string(),
            });
        }

        Ok(Self::with_tile_count(tile_count as u64))
    }

    fn with_tile_count(tile_count: u64) -> Self {
        let count = tile_count as f64;
        Self {
            tile_count,
            step_latitude: 180.0 / count,
            step_longitude: 360.0 / count,
        }
    }

    /// Number of tile columns (and rows) spanning the world
    #[inline]
    pub fn tile_count(&self) -> u64 {
        self.tile_count
    }

    /// Tile height in degrees
    #[inline]
    pub fn step_latitude(&self) -> f64 {
        self.step_latitude
    }

    /// Tile width in degrees
    #[inline]
    pub fn step_longitude(&self) -> f64 {
        self.step_longitude
    }

    /// Exact rect of tile `(x, y)`
    pub fn tile_bounds(&self, x: i64, y: i64) -> LatLngBounds {
        let north = WORLD_NORTH - y as f64 * self.step_latitude;
        let west = x as f64 * self.step_longitude + WORLD_WEST;
        LatLngBounds::new(
            north,
            west,
            north - self.step_latitude,
            west + self.step_longitude,
        )
    }

    /// Column index of a longitude, clamped to one tile beyond the world
    fn column(&self, longitude: f64) -> i64 {
        let column = ((longitude - WORLD_WEST) / self.step_longitude).floor();
        column.clamp(-1.0, self.tile_count as f64 + 1.0) as i64
    }

    /// Row index of a latitude, clamped to one tile beyond the world
    fn row(&self, latitude: f64) -> i64 {
        let row = ((WORLD_NORTH - latitude) / self.step_latitude).floor();
        row.clamp(-1.0, self.tile_count as f64 + 1.0) as i64
    }

    /// Tiles covering a rect that does not cross the antimeridian
    ///
    /// The far column and row are padded by one tile so partially visible edge
    /// tiles are always included. Edges far outside the world are clamped; the
    /// tiles they would add hold no items.
    pub fn tile_range(&self, bounds: &LatLngBounds) -> TileRange {
        TileRange {
            min_x: self.column(bounds.west),
            max_x: self.column(bounds.east) + 1,
            min_y: self.row(bounds.north),
            max_y: self.row(bounds.south) + 1,
        }
    }

    /// Tiles covering a viewport, split in two when it crosses the antimeridian
    ///
    /// The eastern part `[west, 180]` comes first. Columns it already covers are
    /// removed from the western part `[-180, east]` so no tile is visited twice.
    pub fn viewport_ranges(&self, viewport: &LatLngBounds) -> Vec<TileRange> {
        let (first, second) = viewport.split_antimeridian();
        let first = self.tile_range(&first);

        let mut ranges = vec![first];
        if let Some(second) = second {
            let mut second = self.tile_range(&second);
            second.max_x = second.max_x.min(first.min_x - 1);
            if !second.is_empty() {
                ranges.push(second);
            }
        }
        ranges
    }
}

impl TileRange {
    /// Whether the range holds no tiles
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Number of tiles in the range
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let columns = (self.max_x - self.min_x + 1) as usize;
        let rows = (self.max_y - self.min_y + 1) as usize;
        columns.saturating_mul(rows)
    }

    /// Whether tile `(x, y)` is part of the range
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Tile indices, all rows of a column before the next column
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        (self.min_x..=self.max_x)
            .flat_map(move |x| (self.min_y..=self.max_y).map(move |y| (x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_count_per_zoom() {
        assert_eq!(TileGrid::for_zoom(0.0).unwrap().tile_count(), 2);
        assert_eq!(TileGrid::for_zoom(1.0).unwrap().tile_count(), 4);
        assert_eq!(TileGrid::for_zoom(10.0).unwrap().tile_count(), 2048);
        // Fractional zoom levels truncate
        assert_eq!(TileGrid::for_zoom(1.5).unwrap().tile_count(), 5);
        // Negative zoom still works while there is at least one tile
        assert_eq!(TileGrid::for_zoom(-1.0).unwrap().tile_count(), 1);
    }

    #[test]
    fn test_invalid_zoom() {
        assert!(matches!(
            TileGrid::for_zoom(-2.0),
            Err(ClusterError::InvalidZoom { .. })
        ));
        assert!(TileGrid::for_zoom(f64::NAN).is_err());
        assert!(TileGrid::for_zoom(f64::INFINITY).is_err());
        assert!(TileGrid::for_zoom(60.0).is_err());
    }

    #[test]
    fn test_steps() {
        let grid = TileGrid::for_zoom(2.0).unwrap();
        assert_eq!(grid.step_latitude(), 22.5);
        assert_eq!(grid.step_longitude(), 45.0);
    }

    #[test]
    fn test_tile_bounds() {
        let grid = TileGrid::for_zoom(0.0).unwrap();
        assert_eq!(grid.tile_bounds(0, 0), LatLngBounds::new(90.0, -180.0, 0.0, 0.0));
        assert_eq!(grid.tile_bounds(1, 1), LatLngBounds::new(0.0, 0.0, -90.0, 180.0));
    }

    #[test]
    fn test_huge_edges_are_clamped() {
        let grid = TileGrid::for_zoom(0.0).unwrap();
        let range = grid.tile_range(&LatLngBounds::new(1e300, -1e300, -1e300, 1e300));
        assert_eq!(
            range,
            TileRange {
                min_x: -1,
                max_x: 4,
                min_y: -1,
                max_y: 4,
            }
        );

        let ranges = grid.viewport_ranges(&LatLngBounds::new(10.0, 1e300, 0.0, -1e300));
        assert!(!ranges.is_empty());
        for (x, _) in ranges.iter().flat_map(TileRange::iter) {
            assert!((-1..=4).contains(&x));
        }
    }

    #[test]
    fn test_tile_range_pads_far_edges() {
        let grid = TileGrid::for_zoom(2.0).unwrap();
        let range = grid.tile_range(&LatLngBounds::new(10.0, 10.0, 5.0, 20.0));
        assert_eq!(
            range,
            TileRange {
                min_x: 4,
                max_x: 5,
                min_y: 3,
                max_y: 4,
            }
        );
        assert_eq!(range.len(), 4);
        let tiles: Vec<_> = range.iter().collect();
        assert_eq!(tiles, vec![(4, 3), (4, 4), (5, 3), (5, 4)]);
    }

    #[test]
    fn test_viewport_ranges_split_on_antimeridian() {
        let grid = TileGrid::for_zoom(2.0).unwrap();
        let ranges = grid.viewport_ranges(&LatLngBounds::new(10.0, 170.0, -10.0, -170.0));

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].min_x, 7);
        assert_eq!(ranges[0].max_x, 9);
        assert_eq!(ranges[1].min_x, 0);
        assert_eq!(ranges[1].max_x, 1);
    }

    #[test]
    fn test_viewport_ranges_never_repeat_columns() {
        let grid = TileGrid::for_zoom(2.0).unwrap();
        // Nearly the whole world, crossing the antimeridian
        let ranges = grid.viewport_ranges(&LatLngBounds::new(10.0, -134.0, -10.0, -136.0));

        assert_eq!(ranges.len(), 2);
        assert!(ranges[1].max_x < ranges[0].min_x);
        for (x, y) in ranges[1].iter() {
            assert!(!ranges[0].contains(x, y));
        }
    }

    #[test]
    fn test_empty_range() {
        let range = TileRange {
            min_x: 3,
            max_x: 2,
            min_y: 0,
            max_y: 1,
        };
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.iter().count(), 0);
    }
}
