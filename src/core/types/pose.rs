//! Rigid-transform helpers for 6-DoF poses.
//!
//! Poses are `nalgebra::Isometry3<f64>`: composition via `*`, inversion via
//! `inverse()`, and the translation/rotation parts accessible directly.
//! The helpers here cover the roll/pitch/yaw round trip the localization
//! models need.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// Rigid transform in SE(3).
pub type Pose3D = Isometry3<f64>;

/// Build a pose from a translation and intrinsic roll/pitch/yaw angles.
#[inline]
pub fn pose_from_rpy(translation: Vector3<f64>, roll: f64, pitch: f64, yaw: f64) -> Pose3D {
    Isometry3::from_parts(
        Translation3::from(translation),
        UnitQuaternion::from_euler_angles(roll, pitch, yaw),
    )
}

/// Decompose a pose's rotation into (roll, pitch, yaw).
#[inline]
pub fn pose_rpy(pose: &Pose3D) -> (f64, f64, f64) {
    pose.rotation.euler_angles()
}

/// Origin of a pose as a vector.
#[inline]
pub fn pose_origin(pose: &Pose3D) -> Vector3<f64> {
    pose.translation.vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rpy_roundtrip() {
        let pose = pose_from_rpy(Vector3::new(1.0, 2.0, 3.0), 0.1, -0.2, 0.3);
        let (roll, pitch, yaw) = pose_rpy(&pose);
        assert_relative_eq!(roll, 0.1, epsilon = 1e-12);
        assert_relative_eq!(pitch, -0.2, epsilon = 1e-12);
        assert_relative_eq!(yaw, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_identity_rpy_is_zero() {
        let (roll, pitch, yaw) = pose_rpy(&Pose3D::identity());
        assert_eq!((roll, pitch, yaw), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_compose_then_invert() {
        let a = pose_from_rpy(Vector3::new(1.0, 0.0, 0.0), 0.0, 0.0, FRAC_PI_2);
        let b = pose_from_rpy(Vector3::new(0.0, 1.0, 0.5), 0.2, 0.0, 0.0);
        let roundtrip = (a * b) * b.inverse();
        let origin = pose_origin(&roundtrip);
        assert_relative_eq!(origin.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(origin.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(origin.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_composition_order_matters() {
        let forward = pose_from_rpy(Vector3::new(1.0, 0.0, 0.0), 0.0, 0.0, 0.0);
        let turn = pose_from_rpy(Vector3::zeros(), 0.0, 0.0, FRAC_PI_2);

        // Moving then turning stays at (1, 0, 0).
        let a = forward * turn;
        assert_relative_eq!(pose_origin(&a).x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(pose_origin(&a).y, 0.0, epsilon = 1e-12);

        // Turning then moving ends up at (0, 1, 0).
        let b = turn * forward;
        assert_relative_eq!(pose_origin(&b).x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pose_origin(&b).y, 1.0, epsilon = 1e-12);
    }
}
