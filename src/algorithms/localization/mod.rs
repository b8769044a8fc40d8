//! Monte Carlo localization.
//!
//! Estimates a robot's 6-DoF pose within a known map by maintaining a
//! population of weighted pose hypotheses.
//!
//! # Components
//!
//! - [`GaussVector`]: per-axis independent Gaussian vector sampler
//! - [`MotionModel`] / [`SixDofMotionModel`]: odometry prediction with
//!   motion-scaled noise
//! - [`SensorModel`] / [`EndpointSensorModel`] / [`ElevationSensorModel`]:
//!   particle weighting against a reference map
//! - [`ParticleFilter`]: population ownership and orchestration
//!
//! # Example
//!
//! ```ignore
//! use meru_localizer::algorithms::localization::{
//!     EndpointModelConfig, EndpointSensorModel, ParticleFilter, SensorModel,
//!     SixDofMotionModel, SixDofMotionModelConfig,
//! };
//!
//! let model = SixDofMotionModel::new(SixDofMotionModelConfig::default());
//! let mut filter = ParticleFilter::with_model(model);
//! filter.init(500, &start_pose);
//!
//! let sensor = EndpointSensorModel::from_cloud(EndpointModelConfig::default(), &map_cloud);
//!
//! // Per cycle: odometry delta, then the latest scans.
//! filter.update_motion(&odom_delta);
//! sensor.compute_particle_weights(&scans, filter.particles_mut());
//! let position = filter.get_mean();
//! ```

mod motion_model;
mod noise;
mod particle_filter;
mod sensor_model;

pub use motion_model::{MotionModel, SixDofMotionModel, SixDofMotionModelConfig};
pub use noise::GaussVector;
pub use particle_filter::{Particle, ParticleFilter, SharedMotionModel};
pub use sensor_model::{
    ElevationModelConfig, ElevationSensorModel, EndpointModelConfig, EndpointSensorModel,
    SensorModel,
};
