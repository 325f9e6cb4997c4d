//! Background clustering worker
//!
//! [`ClusterManager`] owns the active [`ClusteringAlgorithm`] on a single blocking
//! worker so the thread reporting camera changes never waits on index rebuilds or
//! clustering passes. Requests are queued in order; a rebuild or clustering request
//! that has been superseded by a newer one of the same kind is dropped before it
//! starts. Results are published through a `watch` channel.

use crate::{
    Cluster, ClusterError, ClusterItem, ClusteringAlgorithm, Config, LatLngBounds, Result,
    TileClusterAlgorithm,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Visible region and zoom level of the map
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Camera {
    pub bounds: LatLngBounds,
    pub zoom: f64,
}

/// Result of the latest clustering pass
#[derive(Debug)]
pub struct ClusterSnapshot<T> {
    /// Clusters for `camera`
    pub clusters: Arc<Vec<Cluster<T>>>,
    /// Camera the clusters were computed for (`None` before the first pass)
    pub camera: Option<Camera>,
    /// Generation of the item set the clusters were computed from (0 = none yet)
    pub items_version: u64,
}

impl<T> Clone for ClusterSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            clusters: Arc::clone(&self.clusters),
            camera: self.camera,
            items_version: self.items_version,
        }
    }
}

impl<T> Default for ClusterSnapshot<T> {
    fn default() -> Self {
        Self {
            clusters: Arc::new(Vec::new()),
            camera: None,
            items_version: 0,
        }
    }
}

enum Request<T> {
    Rebuild { items: Vec<Arc<T>>, generation: u64 },
    Cluster { camera: Camera, generation: u64 },
    MinClusterSize(usize),
    Algorithm(Box<dyn ClusteringAlgorithm<T>>),
}

/// Latest generation handed out per request kind
#[derive(Debug, Default)]
struct Generations {
    rebuild: AtomicU64,
    cluster: AtomicU64,
}

/// Serializes index rebuilds and clustering passes on one background worker
pub struct ClusterManager<T> {
    requests: mpsc::UnboundedSender<Request<T>>,
    generations: Arc<Generations>,
    snapshots: watch::Receiver<ClusterSnapshot<T>>,
    worker: JoinHandle<()>,
}

impl<T: ClusterItem + 'static> ClusterManager<T> {
    /// Start a worker driving `algorithm`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(algorithm: Box<dyn ClusteringAlgorithm<T>>) -> Result<Self> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ClusterError::NoRuntime)?;

        let (requests, receiver) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(ClusterSnapshot::default());
        let generations = Arc::new(Generations::default());

        let worker = Worker {
            algorithm,
            items: Vec::new(),
            min_cluster_size: None,
            camera: None,
            items_version: 0,
            seen_cluster_generation: 0,
            generations: Arc::clone(&generations),
            publisher,
        };
        let worker = runtime.spawn_blocking(move || worker.run(receiver));

        Ok(Self {
            requests,
            generations,
            snapshots,
            worker,
        })
    }

    /// Start a worker driving a [`TileClusterAlgorithm`]
    pub fn with_config(config: Config) -> Result<Self> {
        Self::new(Box::new(TileClusterAlgorithm::new(config)?))
    }

    /// Replace all items; clusters for the last camera are recomputed afterwards
    pub fn set_items(&self, items: Vec<T>) -> Result<()> {
        let items = items.into_iter().map(Arc::new).collect();
        let generation = self.generations.rebuild.fetch_add(1, Ordering::AcqRel) + 1;
        self.send(Request::Rebuild { items, generation })
    }

    /// Change the minimum cluster size used by later passes
    pub fn set_min_cluster_size(&self, min_cluster_size: usize) -> Result<()> {
        if min_cluster_size == 0 {
            return Err(ClusterError::InvalidMinClusterSize(min_cluster_size));
        }
        self.send(Request::MinClusterSize(min_cluster_size))
    }

    /// Swap the clustering strategy
    ///
    /// The new algorithm receives the current items and minimum cluster size,
    /// then clusters the last camera.
    pub fn set_algorithm(&self, algorithm: Box<dyn ClusteringAlgorithm<T>>) -> Result<()> {
        self.send(Request::Algorithm(algorithm))
    }

    /// Request clusters for a camera that stopped moving
    pub fn on_camera_idle(&self, bounds: LatLngBounds, zoom: f64) -> Result<()> {
        bounds.validate()?;
        if !zoom.is_finite() {
            return Err(ClusterError::InvalidZoom {
                zoom,
                reason: "zoom is not finite".to_string(),
            });
        }

        let generation = self.generations.cluster.fetch_add(1, Ordering::AcqRel) + 1;
        self.send(Request::Cluster {
            camera: Camera { bounds, zoom },
            generation,
        })
    }

    /// Receiver notified after every published clustering pass
    pub fn subscribe(&self) -> watch::Receiver<ClusterSnapshot<T>> {
        self.snapshots.clone()
    }

    /// Most recently published snapshot
    pub fn latest(&self) -> ClusterSnapshot<T> {
        self.snapshots.borrow().clone()
    }

    /// Stop accepting requests and wait for queued ones to finish
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            requests, worker, ..
        } = self;
        drop(requests);
        worker.await.map_err(|_| ClusterError::WorkerStopped)
    }

    fn send(&self, request: Request<T>) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| ClusterError::WorkerStopped)
    }
}

/// State owned by the background worker
struct Worker<T> {
    algorithm: Box<dyn ClusteringAlgorithm<T>>,
    /// Current item set, kept to re-feed a replacement algorithm
    items: Vec<Arc<T>>,
    min_cluster_size: Option<usize>,
    camera: Option<Camera>,
    items_version: u64,
    /// Newest clustering generation dequeued so far
    seen_cluster_generation: u64,
    generations: Arc<Generations>,
    publisher: watch::Sender<ClusterSnapshot<T>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<T: ClusterItem> Worker<T> {
    fn run(mut self, mut requests: mpsc::UnboundedReceiver<Request<T>>) {
        while let Some(request) = requests.blocking_recv() {
            match request {
                Request::Rebuild { items, generation } => {
                    if generation != self.generations.rebuild.load(Ordering::Acquire) {
                        tracing::trace!(generation, "Skipping superseded rebuild");
                        continue;
                    }
                    self.algorithm.set_items(&items);
                    self.items = items;
                    self.items_version = generation;
                    self.recluster_unless_pending();
                }
                Request::Cluster { camera, generation } => {
                    self.seen_cluster_generation = self.seen_cluster_generation.max(generation);
                    if generation != self.generations.cluster.load(Ordering::Acquire) {
                        tracing::trace!(generation, "Skipping superseded clustering pass");
                        continue;
                    }
                    self.camera = Some(camera);
                    self.cluster();
                }
                Request::MinClusterSize(min_cluster_size) => {
                    self.apply_min_cluster_size(min_cluster_size);
                }
                Request::Algorithm(algorithm) => {
                    self.algorithm = algorithm;
                    if let Some(min_cluster_size) = self.min_cluster_size {
                        self.apply_min_cluster_size(min_cluster_size);
                    }
                    self.algorithm.set_items(&self.items);
                    self.recluster_unless_pending();
                }
            }
        }
        tracing::debug!("Cluster worker stopped");
    }

    fn apply_min_cluster_size(&mut self, min_cluster_size: usize) {
        match self.algorithm.set_min_cluster_size(min_cluster_size) {
            Ok(()) => self.min_cluster_size = Some(min_cluster_size),
            Err(error) => tracing::warn!("Rejected minimum cluster size: {}", error),
        }
    }

    /// Cluster the last camera again, unless a newer camera is already queued
    fn recluster_unless_pending(&mut self) {
        if self.generations.cluster.load(Ordering::Acquire) > self.seen_cluster_generation {
            return;
        }
        self.cluster();
    }

    fn cluster(&mut self) {
        let Some(camera) = self.camera else {
            return;
        };

        match self.algorithm.get_clusters(&camera.bounds, camera.zoom) {
            Ok(clusters) => {
                self.publisher.send_replace(ClusterSnapshot {
                    clusters: Arc::new(clusters),
                    camera: Some(camera),
                    items_version: self.items_version,
                });
            }
            Err(error) => tracing::warn!("Clustering failed: {}", error),
        }
    }
}
