use clap::Parser;
use marker_cluster_lib::{Config, LatLngBounds};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Marker Cluster - Cluster geo-located map markers for a viewport
pub struct Settings {
    /// Number of random items to generate when no item file is given
    #[clap(short, long, default_value = "20000")]
    pub count: usize,

    /// Seed for random item generation
    #[clap(long, default_value = "42")]
    pub seed: u64,

    /// Area random items are generated in, as north,west,south,east
    #[clap(long, value_parser = parse_bounds, default_value = "53.35917,3.57361,50.77083,7.10833")]
    pub area: LatLngBounds,

    /// JSON file with an array of {latitude, longitude, title?, snippet?} items
    #[clap(short, long, value_name = "FILE")]
    pub items: Option<PathBuf>,

    /// Visible region as north,west,south,east (defaults to the item area)
    #[clap(long, value_parser = parse_bounds, allow_hyphen_values = true)]
    pub viewport: Option<LatLngBounds>,

    /// Map zoom level (fractional levels allowed)
    #[clap(short, long, default_value = "7.0", allow_hyphen_values = true)]
    pub zoom: f64,

    /// Tiles with fewer items are shown as individual markers
    #[clap(short, long, default_value = "1")]
    pub min_cluster_size: usize,

    /// Maximum items per quadtree node before subdivision
    #[clap(long, default_value = "4")]
    pub bucket_capacity: usize,

    /// Maximum number of clusters listed in the table output
    #[clap(long, default_value = "20")]
    pub limit: usize,

    /// Print the clusters as JSON instead of a table
    #[clap(long, default_value = "false")]
    pub json: bool,
}

impl Settings {
    /// Library configuration derived from the command line
    pub fn config(&self) -> Config {
        Config {
            min_cluster_size: self.min_cluster_size,
            bucket_capacity: self.bucket_capacity,
        }
    }

    /// Viewport to cluster, falling back to the generation area
    pub fn viewport(&self) -> LatLngBounds {
        self.viewport.unwrap_or(self.area)
    }
}

/// Parse `north,west,south,east` into bounds
fn parse_bounds(value: &str) -> Result<LatLngBounds, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {e}"))?;

    let [north, west, south, east] = parts[..] else {
        return Err(format!(
            "expected 4 comma separated values (north,west,south,east), got {}",
            parts.len()
        ));
    };

    let bounds = LatLngBounds::new(north, west, south, east);
    bounds.validate().map_err(|e| e.to_string())?;
    Ok(bounds)
}
