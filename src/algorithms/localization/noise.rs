//! Per-axis independent Gaussian vector sampling.
//!
//! The motion model draws translation and rotation noise from axis-wise
//! independent normal distributions parameterized by a mean vector and a
//! variance vector. Variances come from a covariance-times-increment
//! product and can carry the increment's sign, so the magnitude is used;
//! noise scales with how far the robot moved, not with the direction.

use nalgebra::Vector3;
use rand::Rng;
use rand_distr::StandardNormal;

/// Sampler for 3-vectors with independent per-axis Gaussian components.
#[derive(Debug, Clone)]
pub struct GaussVector {
    mean: Vector3<f64>,
    std_dev: Vector3<f64>,
}

impl GaussVector {
    /// Create a sampler from a mean vector and a variance vector.
    ///
    /// A zero variance axis always returns the exact mean on that axis.
    pub fn new(mean: Vector3<f64>, variance: Vector3<f64>) -> Self {
        Self {
            mean,
            std_dev: variance.map(|v| v.abs().sqrt()),
        }
    }

    /// Draw one sample.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vector3<f64> {
        Vector3::new(
            self.mean.x + self.std_dev.x * rng.sample::<f64, _>(StandardNormal),
            self.mean.y + self.std_dev.y * rng.sample::<f64, _>(StandardNormal),
            self.mean.z + self.std_dev.z * rng.sample::<f64, _>(StandardNormal),
        )
    }
}
