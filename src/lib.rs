//! MeruLocalizer - 6-DoF Monte Carlo localization for mobile robots
//!
//! Estimates a robot's pose over time against a pre-built, static
//! reference map: a population of weighted pose hypotheses is propagated
//! by noisy odometry and re-weighted by matching live sensor scans to the
//! map.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Core algorithms
//! │            (localization, mapping)                  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Scan preprocessing
//! │                (voxel filtering)                    │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │              (poses, point clouds)                  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Localization cycle
//!
//! 1. An odometry delta arrives: [`ParticleFilter::update_motion`] pushes
//!    every particle through the motion model with motion-scaled noise.
//! 2. Fresh scans arrive: a [`SensorModel`] recomputes every particle's
//!    weight against the reference map, in parallel across hardware
//!    threads, and normalizes so the maximum weight is 0.
//! 3. [`ParticleFilter::get_mean`] reports the population centroid.
//!
//! The reference map is read-only for the lifetime of a run. Two map
//! backends exist: a point-cloud k-d tree ([`EndpointSensorModel`]) and a
//! compressed elevation grid ([`ElevationSensorModel`], backed by
//! [`ElevationMap`], which also serves as a coarse map-comparison metric).

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Sensor processing (depends on core)
// ============================================================================
pub mod sensors;

// ============================================================================
// Layer 3: Algorithms (depends on core, sensors)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use self::core::types::{pose_from_rpy, pose_origin, pose_rpy, Pose3D};
pub use self::core::types::{Point3D, PointCloud3D};

// Sensors - Preprocessing
pub use sensors::preprocessing::{VoxelFilter, VoxelFilterConfig};

// Algorithms - Mapping
pub use algorithms::mapping::{ElevationMap, ElevationMapConfig};

// Algorithms - Localization
pub use algorithms::localization::{
    ElevationModelConfig, ElevationSensorModel, EndpointModelConfig, EndpointSensorModel,
    GaussVector, MotionModel, Particle, ParticleFilter, SensorModel, SharedMotionModel,
    SixDofMotionModel, SixDofMotionModelConfig,
};
