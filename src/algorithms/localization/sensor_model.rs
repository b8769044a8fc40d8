//! Sensor models for the particle filter observation step.
//!
//! A sensor model scores every particle by comparing the latest sensor
//! point clouds, transformed into the particle's pose, against a reference
//! map. Two map backends exist: a full point-cloud k-d tree
//! ([`EndpointSensorModel`]) and a compressed elevation grid
//! ([`ElevationSensorModel`]).
//!
//! Weights are residual distances: **lower means a better geometric fit**.
//! After every weighting pass the population maximum is subtracted, so the
//! worst particle sits at exactly 0 and all others are negative. Callers
//! must not treat larger weights as better.

use kiddo::{KdTree, SquaredEuclidean};

use crate::algorithms::mapping::{ElevationMap, ElevationMapConfig};
use crate::core::types::PointCloud3D;
use crate::sensors::preprocessing::VoxelFilter;

use super::particle_filter::Particle;

/// Interface of a sensor model.
///
/// Concrete variants are selected at configuration time.
pub trait SensorModel {
    /// Recompute the weight of every particle from the given scans.
    ///
    /// `scans` are point clouds in the robot frame. The call blocks until
    /// all weights are written, even when computed on worker threads.
    fn compute_particle_weights(&self, scans: &[PointCloud3D], particles: &mut [Particle]);
}

/// Number of weighting workers for the given threading flag.
fn worker_count(multithreaded: bool) -> usize {
    if multithreaded {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        1
    }
}

/// Run `weigh` over every particle, partitioned into contiguous
/// equal-sized ranges, one per worker. Joins before returning, so the
/// caller observes fully written weights.
fn for_each_particle<F>(particles: &mut [Particle], n_workers: usize, weigh: F)
where
    F: Fn(&mut Particle) + Sync,
{
    if n_workers <= 1 || particles.len() <= 1 {
        for particle in particles.iter_mut() {
            weigh(particle);
        }
        return;
    }

    let chunk_size = (particles.len() as f64 / n_workers as f64).ceil() as usize;
    std::thread::scope(|scope| {
        for chunk in particles.chunks_mut(chunk_size) {
            let weigh = &weigh;
            scope.spawn(move || {
                for particle in chunk.iter_mut() {
                    weigh(particle);
                }
            });
        }
    });
}

/// Shift all weights so the maximum becomes exactly 0.
fn normalize_weights(particles: &mut [Particle]) {
    let max_weight = particles
        .iter()
        .map(|p| p.weight)
        .fold(f64::NEG_INFINITY, f64::max);
    if max_weight.is_finite() {
        for particle in particles.iter_mut() {
            particle.weight -= max_weight;
        }
    }
}

/// Count of finite points across a set of clouds.
fn finite_point_count(clouds: &[PointCloud3D]) -> usize {
    clouds
        .iter()
        .map(|c| c.iter().filter(|p| p.is_finite()).count())
        .sum()
}

/// Configuration for the endpoint sensor model.
#[derive(Debug, Clone, Copy)]
pub struct EndpointModelConfig {
    /// Voxel leaf size used to sparsify incoming scans before matching.
    pub sparsify_resolution: f64,

    /// Lower bound on the sparsification resolution.
    pub min_sparsify_resolution: f64,

    /// Cap on a single point's nearest-neighbor distance in meters.
    pub max_distance: f64,

    /// Sentinel weight assigned when a particle has no matched points.
    pub min_weight: f64,

    /// Compute weights on worker threads sized to hardware concurrency.
    pub multithreaded: bool,
}

impl Default for EndpointModelConfig {
    fn default() -> Self {
        Self {
            sparsify_resolution: 0.1,
            min_sparsify_resolution: 1e-9,
            max_distance: 0.5,
            min_weight: f64::MIN_POSITIVE,
            multithreaded: true,
        }
    }
}

/// Scores particles by the mean capped nearest-neighbor distance between
/// transformed scan points and a point-cloud reference map.
///
/// The k-d tree is built once at construction and queried read-only from
/// all workers.
#[derive(Debug)]
pub struct EndpointSensorModel {
    config: EndpointModelConfig,
    tree: KdTree<f64, 3>,
    map_points: usize,
}

impl EndpointSensorModel {
    /// Build the model over the finite points of a reference map cloud.
    pub fn from_cloud(config: EndpointModelConfig, map: &PointCloud3D) -> Self {
        let mut config = config;
        if config.sparsify_resolution < config.min_sparsify_resolution {
            log::warn!(
                "Sparsification resolution must not be less than {}",
                config.min_sparsify_resolution
            );
            config.sparsify_resolution = config.min_sparsify_resolution;
        }

        let mut tree: KdTree<f64, 3> = KdTree::new();
        let mut n = 0u64;
        for point in map {
            if point.is_finite() {
                tree.add(&[point.x, point.y, point.z], n);
                n += 1;
            }
        }
        if n == 0 {
            log::warn!("Endpoint sensor model built over a map with no finite points");
        }

        Self {
            config,
            tree,
            map_points: n as usize,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &EndpointModelConfig {
        &self.config
    }

    /// Set the resolution used for sparsifying incoming scans.
    ///
    /// Values below the configured minimum are clamped with a warning.
    pub fn set_sparsification_resolution(&mut self, resolution: f64) {
        if resolution < self.config.min_sparsify_resolution {
            log::warn!(
                "Sparsification resolution must not be less than {}",
                self.config.min_sparsify_resolution
            );
        }
        self.config.sparsify_resolution = resolution.max(self.config.min_sparsify_resolution);
    }

    /// Number of map points indexed by the k-d tree.
    pub fn map_point_count(&self) -> usize {
        self.map_points
    }

    /// Weight of one particle: mean capped distance of all scan points,
    /// every cloud feeding the same accumulator.
    fn compute_particle_weight(&self, scans: &[PointCloud3D], particle: &mut Particle) {
        let mut d_total = 0.0;
        let mut n_total = 0usize;

        for scan in scans {
            let scan_map = scan.transformed(&particle.pose);
            for point in &scan_map {
                if !point.is_finite() {
                    continue;
                }
                let nearest = self
                    .tree
                    .nearest_one::<SquaredEuclidean>(&[point.x, point.y, point.z]);
                d_total += nearest.distance.sqrt().min(self.config.max_distance);
                n_total += 1;
            }
        }

        particle.weight = if n_total == 0 {
            self.config.min_weight
        } else {
            d_total / n_total as f64
        };
    }
}

impl SensorModel for EndpointSensorModel {
    fn compute_particle_weights(&self, scans: &[PointCloud3D], particles: &mut [Particle]) {
        if particles.is_empty() {
            return;
        }

        let filter = VoxelFilter::with_leaf_size(self.config.sparsify_resolution);
        let sparse: Vec<PointCloud3D> = scans.iter().map(|s| filter.apply(s)).collect();

        if self.map_points == 0 || finite_point_count(&sparse) == 0 {
            log::warn!("Cannot compute particle weights: no matchable points");
            for particle in particles.iter_mut() {
                particle.weight = self.config.min_weight;
            }
        } else {
            let workers = worker_count(self.config.multithreaded);
            for_each_particle(particles, workers, |p| {
                self.compute_particle_weight(&sparse, p)
            });
        }

        normalize_weights(particles);
    }
}

/// Configuration for the elevation sensor model.
#[derive(Debug, Clone, Copy)]
pub struct ElevationModelConfig {
    /// Resolution of the elevation grid built from the reference map.
    pub map_resolution: f64,

    /// Cap on a single point's height residual in meters.
    pub max_distance: f64,

    /// Sentinel weight assigned when a particle has no matched points.
    pub min_weight: f64,

    /// Compute weights on worker threads sized to hardware concurrency.
    pub multithreaded: bool,
}

impl Default for ElevationModelConfig {
    fn default() -> Self {
        Self {
            map_resolution: 0.1,
            max_distance: 0.5,
            min_weight: f64::MIN_POSITIVE,
            multithreaded: true,
        }
    }
}

/// Scores particles against an elevation grid instead of a full
/// point-cloud index.
///
/// Cheaper per query than the k-d tree; a scan point matches when its
/// (x, y) lands on an observed cell, and its residual is the capped
/// height difference.
#[derive(Debug)]
pub struct ElevationSensorModel {
    config: ElevationModelConfig,
    map: ElevationMap,
}

impl ElevationSensorModel {
    /// Build the model by compressing a reference map cloud into an
    /// elevation grid.
    pub fn from_cloud(config: ElevationModelConfig, map_cloud: &PointCloud3D) -> Self {
        let map = ElevationMap::from_cloud(
            ElevationMapConfig {
                resolution: config.map_resolution,
                ..Default::default()
            },
            map_cloud,
        );
        Self { config, map }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ElevationModelConfig {
        &self.config
    }

    /// The elevation grid backing this model.
    pub fn map(&self) -> &ElevationMap {
        &self.map
    }

    fn compute_particle_weight(&self, scans: &[PointCloud3D], particle: &mut Particle) {
        let mut d_total = 0.0;
        let mut n_total = 0usize;

        for scan in scans {
            let scan_map = scan.transformed(&particle.pose);
            for point in &scan_map {
                if !point.is_finite() {
                    continue;
                }
                let elevation = self.map.elevation_at(point.x, point.y);
                if elevation.is_finite() {
                    d_total += (point.z - elevation).abs().min(self.config.max_distance);
                    n_total += 1;
                }
            }
        }

        particle.weight = if n_total == 0 {
            self.config.min_weight
        } else {
            d_total / n_total as f64
        };
    }
}

impl SensorModel for ElevationSensorModel {
    fn compute_particle_weights(&self, scans: &[PointCloud3D], particles: &mut [Particle]) {
        if particles.is_empty() {
            return;
        }

        if finite_point_count(scans) == 0 {
            log::warn!("Cannot compute particle weights: no matchable points");
            for particle in particles.iter_mut() {
                particle.weight = self.config.min_weight;
            }
        } else {
            let workers = worker_count(self.config.multithreaded);
            for_each_particle(particles, workers, |p| {
                self.compute_particle_weight(scans, p)
            });
        }

        normalize_weights(particles);
    }
}
