//! Rendering of clustering results

use crate::error::Result;
use marker_cluster_lib::{Camera, Cluster, ClusterItem, LatLngBounds, MapItem};
use serde::Serialize;
use std::io::Write;

/// JSON document printed with `--json`
#[derive(Debug, Serialize)]
struct Report<'a> {
    zoom: f64,
    viewport: LatLngBounds,
    items: usize,
    clusters: Vec<ClusterRecord<'a>>,
}

#[derive(Debug, Serialize)]
struct ClusterRecord<'a> {
    latitude: f64,
    longitude: f64,
    size: usize,
    bounds: LatLngBounds,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    titles: Vec<&'a str>,
}

impl<'a> ClusterRecord<'a> {
    fn new(cluster: &'a Cluster<MapItem>) -> Self {
        Self {
            latitude: cluster.latitude(),
            longitude: cluster.longitude(),
            size: cluster.size(),
            bounds: cluster.bounds(),
            titles: cluster.items().iter().filter_map(|item| item.title()).collect(),
        }
    }
}

/// Largest clusters first, ties broken by position so output is stable
fn sorted(clusters: &[Cluster<MapItem>]) -> Vec<&Cluster<MapItem>> {
    let mut sorted: Vec<_> = clusters.iter().collect();
    sorted.sort_by(|a, b| {
        b.size()
            .cmp(&a.size())
            .then(a.latitude().total_cmp(&b.latitude()))
            .then(a.longitude().total_cmp(&b.longitude()))
    });
    sorted
}

pub fn write_json<W: Write>(
    out: &mut W,
    camera: &Camera,
    items: usize,
    clusters: &[Cluster<MapItem>],
) -> Result<()> {
    let report = Report {
        zoom: camera.zoom,
        viewport: camera.bounds,
        items,
        clusters: sorted(clusters).into_iter().map(ClusterRecord::new).collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_table<W: Write>(
    out: &mut W,
    camera: &Camera,
    items: usize,
    clusters: &[Cluster<MapItem>],
    limit: usize,
) -> Result<()> {
    let clustered: usize = clusters.iter().map(Cluster::size).sum();
    let singletons = clusters.iter().filter(|c| c.size() == 1).count();

    writeln!(
        out,
        "{} clusters ({} singletons) holding {} of {} items at zoom {}",
        clusters.len(),
        singletons,
        clustered,
        items,
        camera.zoom
    )?;
    writeln!(
        out,
        "{:>8}  {:>10}  {:>11}  {}",
        "size", "latitude", "longitude", "title"
    )?;

    let sorted = sorted(clusters);
    for cluster in sorted.iter().take(limit) {
        let title = match cluster.items() {
            [item] => item.title().unwrap_or("-"),
            _ => "",
        };
        writeln!(
            out,
            "{:>8}  {:>10.5}  {:>11.5}  {}",
            cluster.size(),
            cluster.latitude(),
            cluster.longitude(),
            title
        )?;
    }
    if sorted.len() > limit {
        writeln!(out, "... {} more", sorted.len() - limit)?;
    }
    Ok(())
}
