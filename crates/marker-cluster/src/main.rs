//! Marker Cluster command line front end
//!
//! Loads or generates items, runs them through a [`ClusterManager`] for one camera
//! position and prints the resulting clusters.

mod error;
mod logging;
mod output;
mod settings;

use clap::Parser;
use error::{CliError, Result};
use marker_cluster_lib::{Camera, ClusterError, ClusterManager, LatLngBounds, MapItem, TileGrid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use settings::Settings;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

/// How long to wait for the worker to publish clusters
const CLUSTER_TIMEOUT: Duration = Duration::from_secs(60);

fn main() -> ExitCode {
    let settings = Settings::parse();
    logging::setup_logging();

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::from)
        .and_then(|rt| rt.block_on(run(settings)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<()> {
    let camera = Camera {
        bounds: settings.viewport(),
        zoom: settings.zoom,
    };
    // Fail early instead of waiting for a pass the worker will reject
    camera.bounds.validate()?;
    TileGrid::for_zoom(camera.zoom)?;

    let items = match &settings.items {
        Some(path) => load_items(path)?,
        None => generate_items(settings.count, &settings.area, settings.seed)?,
    };
    let item_count = items.len();

    let manager = ClusterManager::with_config(settings.config())?;
    let mut snapshots = manager.subscribe();

    let start = instant::Instant::now();
    manager.set_items(items)?;
    manager.on_camera_idle(camera.bounds, camera.zoom)?;

    let snapshot = tokio::time::timeout(
        CLUSTER_TIMEOUT,
        snapshots.wait_for(|s| s.items_version == 1 && s.camera == Some(camera)),
    )
    .await
    .map_err(|_| CliError::Timeout)?
    .map_err(|_| ClusterError::WorkerStopped)?
    .clone();

    tracing::info!(
        items = item_count,
        clusters = snapshot.clusters.len(),
        "Clustered in {:.1} ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
    manager.shutdown().await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if settings.json {
        output::write_json(&mut out, &camera, item_count, &snapshot.clusters)
    } else {
        output::write_table(
            &mut out,
            &camera,
            item_count,
            &snapshot.clusters,
            settings.limit,
        )
    }
}

/// Read a JSON array of items
fn load_items(path: &Path) -> Result<Vec<MapItem>> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadItems {
        path: path.to_path_buf(),
        source,
    })?;
    let items: Vec<MapItem> =
        serde_json::from_str(&text).map_err(|source| CliError::ParseItems {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!("Loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

/// Spread `count` items uniformly over `area`
fn generate_items(count: usize, area: &LatLngBounds, seed: u64) -> Result<Vec<MapItem>> {
    if area.south > area.north || area.west > area.east {
        return Err(CliError::InvalidArea(*area));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let items: Vec<MapItem> = (0..count)
        .map(|i| {
            let latitude = rng.random_range(area.south..=area.north);
            let longitude = rng.random_range(area.west..=area.east);
            MapItem::new(latitude, longitude).with_title(format!("Item {i}"))
        })
        .collect();

    tracing::debug!(count, seed, "Generated random items");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: LatLngBounds = LatLngBounds::new(53.35917, 3.57361, 50.77083, 7.10833);

    #[test]
    fn test_generated_items_stay_in_area() {
        let items = generate_items(1_000, &AREA, 7).unwrap();
        assert_eq!(items.len(), 1_000);
        assert!(
            items
                .iter()
                .all(|item| AREA.contains(item.latitude, item.longitude))
        );
        assert_eq!(items[3].title.as_deref(), Some("Item 3"));
    }

    #[test]
    fn test_generation_is_seeded() {
        assert_eq!(
            generate_items(10, &AREA, 1).unwrap(),
            generate_items(10, &AREA, 1).unwrap()
        );
        assert_ne!(
            generate_items(10, &AREA, 1).unwrap(),
            generate_items(10, &AREA, 2).unwrap()
        );
    }

    #[test]
    fn test_inverted_area_rejected() {
        let area = LatLngBounds::new(10.0, 170.0, -10.0, -170.0);
        assert!(matches!(
            generate_items(1, &area, 0),
            Err(CliError::InvalidArea(_))
        ));
    }

    #[test]
    fn test_load_items_errors() {
        let missing = Path::new("/nonexistent/items.json");
        assert!(matches!(
            load_items(missing),
            Err(CliError::ReadItems { .. })
        ));
    }

    #[test]
    fn test_load_items_from_file() {
        let path = std::env::temp_dir().join(format!("marker-cluster-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"latitude": 52.0, "longitude": 5.0, "title": "Utrecht"}, {"latitude": 51.9, "longitude": 4.5}]"#,
        )
        .unwrap();

        let items = load_items(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("Utrecht"));
        assert_eq!(items[1].snippet, None);
    }
}
