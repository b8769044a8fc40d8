//! Odometry-driven motion model for the particle filter prediction step.
//!
//! Noise variance scales linearly with the motion increment: a stationary
//! robot accumulates no uncertainty, a fast turn accumulates proportionally
//! more. This is the standard odometry-noise heuristic, here in six degrees
//! of freedom.

use std::time::{SystemTime, UNIX_EPOCH};

use nalgebra::{Matrix6, Vector3, Vector6};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::types::{pose_from_rpy, pose_origin, pose_rpy, Pose3D};

use super::noise::GaussVector;
use super::particle_filter::Particle;

/// Interface of a motion model.
///
/// `init` scatters particles around a start pose; `move_particles` applies
/// a measured movement plus sampled noise to every particle. Concrete
/// variants are selected at configuration time.
pub trait MotionModel {
    /// Scatter all particles around the start pose.
    fn init(&mut self, start_pose: &Pose3D, particles: &mut [Particle]);

    /// Apply noisy motion to all particles.
    ///
    /// `movement` is the measured movement in the robot frame.
    fn move_particles(&mut self, movement: &Pose3D, particles: &mut [Particle]);
}

/// Configuration for the 6-DoF motion model.
#[derive(Debug, Clone)]
pub struct SixDofMotionModelConfig {
    /// Maps a motion increment `[tx, ty, tz, roll, pitch, yaw]` to per-axis
    /// noise variances via `variance = covariance * increment`.
    pub covariance: Matrix6<f64>,

    /// Per-axis variances used when scattering particles at initialization.
    pub start_variance: Vector6<f64>,

    /// Random seed for deterministic behavior (0 for clock-derived).
    pub seed: u64,
}

impl Default for SixDofMotionModelConfig {
    fn default() -> Self {
        Self {
            covariance: Matrix6::identity() * 0.1,
            start_variance: Vector6::repeat(0.1),
            seed: 0,
        }
    }
}

impl SixDofMotionModelConfig {
    /// Noiseless configuration: particles follow odometry exactly.
    pub fn noiseless() -> Self {
        Self {
            covariance: Matrix6::zeros(),
            start_variance: Vector6::zeros(),
            ..Default::default()
        }
    }

    /// Low-noise configuration (high quality odometry).
    pub fn low_noise() -> Self {
        Self {
            covariance: Matrix6::identity() * 0.01,
            start_variance: Vector6::repeat(0.01),
            ..Default::default()
        }
    }

    /// High-noise configuration (slippery ground, poor odometry).
    pub fn high_noise() -> Self {
        Self {
            covariance: Matrix6::identity() * 0.5,
            start_variance: Vector6::repeat(0.5),
            ..Default::default()
        }
    }
}

/// Motion model sampling independent per-axis Gaussian noise for the
/// three translation and three Euler-angle components.
#[derive(Debug)]
pub struct SixDofMotionModel {
    config: SixDofMotionModelConfig,
    rng: StdRng,
}

impl SixDofMotionModel {
    /// Create a motion model with the given configuration.
    pub fn new(config: SixDofMotionModelConfig) -> Self {
        let seed = if config.seed == 0 {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(12345)
        } else {
            config.seed
        };

        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SixDofMotionModelConfig {
        &self.config
    }

    /// Replace the motion covariance. Intended for reconfiguration between
    /// localization runs, not mid-run.
    pub fn set_motion_covariance(&mut self, covariance: Matrix6<f64>) {
        self.config.covariance = covariance;
    }

    /// Replace the start-pose variances.
    pub fn set_start_pose_variance(&mut self, variance: Vector6<f64>) {
        self.config.start_variance = variance;
    }
}

impl MotionModel for SixDofMotionModel {
    fn init(&mut self, start_pose: &Pose3D, particles: &mut [Particle]) {
        let (roll, pitch, yaw) = pose_rpy(start_pose);
        let sv = self.config.start_variance;

        let origin_sampler = GaussVector::new(
            pose_origin(start_pose),
            Vector3::new(sv[0], sv[1], sv[2]),
        );
        let rotation_sampler = GaussVector::new(
            Vector3::new(roll, pitch, yaw),
            Vector3::new(sv[3], sv[4], sv[5]),
        );

        for particle in particles.iter_mut() {
            let origin = origin_sampler.sample(&mut self.rng);
            let rpy = rotation_sampler.sample(&mut self.rng);
            particle.pose = pose_from_rpy(origin, rpy.x, rpy.y, rpy.z);
        }
    }

    fn move_particles(&mut self, movement: &Pose3D, particles: &mut [Particle]) {
        let (roll, pitch, yaw) = pose_rpy(movement);
        let translation = movement.translation.vector;

        // Element-wise variance vector, not a quadratic form.
        let increment = Vector6::new(
            translation.x,
            translation.y,
            translation.z,
            roll,
            pitch,
            yaw,
        );
        let variance = self.config.covariance * increment;

        let translation_sampler = GaussVector::new(
            translation,
            Vector3::new(variance[0], variance[1], variance[2]),
        );
        let rotation_sampler = GaussVector::new(
            Vector3::new(roll, pitch, yaw),
            Vector3::new(variance[3], variance[4], variance[5]),
        );

        for particle in particles.iter_mut() {
            let noisy_translation = translation_sampler.sample(&mut self.rng);
            let noisy_rpy = rotation_sampler.sample(&mut self.rng);

            // Compose in the particle's local frame; order matters.
            particle.pose = particle.pose
                * pose_from_rpy(
                    noisy_translation,
                    noisy_rpy.x,
                    noisy_rpy.y,
                    noisy_rpy.z,
                );
        }
    }
}
