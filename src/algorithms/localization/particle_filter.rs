//! Particle filter for 6-DoF Monte Carlo localization.
//!
//! The filter owns the particle population and orchestrates the cycle:
//! initialize around a start pose, advance every particle through the
//! motion model, let a sensor model recompute the weights, and report a
//! summary position. The mean is the unweighted centroid of the particle
//! origins and no resampling takes place between cycles; this mirrors the
//! reference behavior deliberately.

use std::sync::{Arc, Mutex};

use nalgebra::Vector3;

use crate::core::types::{pose_origin, Pose3D};

use super::motion_model::MotionModel;

/// A single pose hypothesis with an importance weight.
///
/// Weights are residual distances written by the sensor models: lower
/// means a better fit, and after normalization the worst particle sits at
/// exactly 0.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    /// Hypothesized robot pose.
    pub pose: Pose3D,
    /// Mean capped residual distance, shifted so the population maximum is 0.
    pub weight: f64,
}

impl Particle {
    /// Create a particle with zero weight.
    pub fn new(pose: Pose3D) -> Self {
        Self { pose, weight: 0.0 }
    }

    /// Create a particle with a specific weight.
    pub fn with_weight(pose: Pose3D, weight: f64) -> Self {
        Self { pose, weight }
    }
}

/// Shared handle to a motion model.
///
/// The filter and other holders (e.g. a diagnostic publisher reconfiguring
/// noise between runs) keep the model alive for as long as any of them
/// needs it.
pub type SharedMotionModel = Arc<Mutex<dyn MotionModel + Send>>;

/// Monte Carlo localization filter.
///
/// Motion updates and weight computation must not run concurrently
/// against the same population; the filter is not reentrant across those
/// two phases.
pub struct ParticleFilter {
    motion_model: SharedMotionModel,
    particles: Vec<Particle>,
}

impl ParticleFilter {
    /// Create a filter around a shared motion model.
    pub fn new(motion_model: SharedMotionModel) -> Self {
        Self {
            motion_model,
            particles: Vec::new(),
        }
    }

    /// Create a filter that takes sole initial ownership of a motion model.
    pub fn with_model<M: MotionModel + Send + 'static>(model: M) -> Self {
        Self::new(Arc::new(Mutex::new(model)))
    }

    /// Allocate `n` particles at the start pose and scatter them through
    /// the motion model.
    ///
    /// Reinitializing discards the previous population.
    pub fn init(&mut self, n_particles: usize, start_pose: &Pose3D) {
        self.particles = vec![Particle::new(*start_pose); n_particles];
        self.motion_model
            .lock()
            .expect("motion model lock poisoned")
            .init(start_pose, &mut self.particles);
    }

    /// Advance every particle by the measured movement plus sampled noise.
    pub fn update_motion(&mut self, movement: &Pose3D) {
        self.motion_model
            .lock()
            .expect("motion model lock poisoned")
            .move_particles(movement, &mut self.particles);
    }

    /// Unweighted centroid of the particle origins.
    ///
    /// Returns the zero vector for an empty population.
    pub fn get_mean(&self) -> Vector3<f64> {
        if self.particles.is_empty() {
            return Vector3::zeros();
        }

        let mut mean = Vector3::zeros();
        for particle in &self.particles {
            mean += pose_origin(&particle.pose);
        }
        mean / self.particles.len() as f64
    }

    /// Current particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to the particles, for running a sensor model's
    /// weighting pass between motion updates.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Clone the shared motion model handle.
    pub fn motion_model(&self) -> SharedMotionModel {
        Arc::clone(&self.motion_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::localization::motion_model::{
        SixDofMotionModel, SixDofMotionModelConfig,
    };
    use crate::core::types::pose_from_rpy;
    use approx::assert_relative_eq;

    fn noiseless_filter() -> ParticleFilter {
        ParticleFilter::with_model(SixDofMotionModel::new(SixDofMotionModelConfig {
            seed: 42,
            ..SixDofMotionModelConfig::noiseless()
        }))
    }

    #[test]
    fn test_init_allocates_population() {
        let mut filter = noiseless_filter();
        filter.init(250, &Pose3D::identity());
        assert_eq!(filter.num_particles(), 250);
    }

    #[test]
    fn test_reinit_replaces_population() {
        let mut filter = noiseless_filter();
        filter.init(100, &Pose3D::identity());
        filter.init(10, &Pose3D::identity());
        assert_eq!(filter.num_particles(), 10);
    }

    #[test]
    fn test_identity_motion_keeps_mean_at_start() {
        let start = pose_from_rpy(Vector3::new(1.0, -2.0, 0.5), 0.0, 0.1, 0.3);

        let mut filter = noiseless_filter();
        filter.init(100, &start);
        filter.update_motion(&Pose3D::identity());

        let mean = filter.get_mean();
        assert_relative_eq!(mean.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(mean.y, -2.0, epsilon = 1e-9);
        assert_relative_eq!(mean.z, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_motion_moves_mean_in_local_frame() {
        use std::f64::consts::FRAC_PI_2;

        // Start facing +y; a forward movement must move the mean along +y.
        let start = pose_from_rpy(Vector3::zeros(), 0.0, 0.0, FRAC_PI_2);

        let mut filter = noiseless_filter();
        filter.init(50, &start);
        filter.update_motion(&pose_from_rpy(Vector3::new(1.0, 0.0, 0.0), 0.0, 0.0, 0.0));

        let mean = filter.get_mean();
        assert_relative_eq!(mean.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(mean.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mean_ignores_weights() {
        let mut filter = noiseless_filter();
        filter.init(2, &Pose3D::identity());
        {
            let particles = filter.particles_mut();
            particles[0].pose = pose_from_rpy(Vector3::new(2.0, 0.0, 0.0), 0.0, 0.0, 0.0);
            particles[0].weight = -100.0;
            particles[1].pose = pose_from_rpy(Vector3::new(0.0, 0.0, 0.0), 0.0, 0.0, 0.0);
            particles[1].weight = 0.0;
        }

        // Centroid, not weighted mean.
        assert_relative_eq!(filter.get_mean().x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_of_empty_population_is_zero() {
        let filter = noiseless_filter();
        assert_eq!(filter.get_mean(), Vector3::zeros());
    }

    #[test]
    fn test_motion_model_is_shared() {
        let model: SharedMotionModel = Arc::new(Mutex::new(SixDofMotionModel::new(
            SixDofMotionModelConfig {
                seed: 42,
                ..SixDofMotionModelConfig::noiseless()
            },
        )));

        let mut filter = ParticleFilter::new(Arc::clone(&model));
        filter.init(10, &Pose3D::identity());

        // Both handles refer to the same model.
        assert_eq!(Arc::strong_count(&filter.motion_model()), 3);
    }
}
