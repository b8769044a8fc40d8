//! 3D point cloud types.
//!
//! Clouds arrive from range sensors and may contain non-finite points
//! (dropouts, max-range returns). Those points are carried as-is and
//! excluded at the point of use, never eagerly removed.

use serde::{Deserialize, Serialize};

use super::pose::Pose3D;

/// A single 3D point with an auxiliary intensity value.
///
/// Intensity is carried through transforms and downsampling but is not
/// used by the localization algorithms themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    /// X coordinate in meters
    pub x: f64,
    /// Y coordinate in meters
    pub y: f64,
    /// Z coordinate in meters
    pub z: f64,
    /// Sensor return intensity
    pub intensity: f32,
}

impl Point3D {
    /// Create a point with zero intensity.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            intensity: 0.0,
        }
    }

    /// Create a point with an intensity value.
    #[inline]
    pub fn with_intensity(x: f64, y: f64, z: f64, intensity: f32) -> Self {
        Self { x, y, z, intensity }
    }

    /// True when all three coordinates are finite.
    ///
    /// Intensity is ignored; a point with garbage intensity is still
    /// usable geometry.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Point3D {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// An ordered sequence of 3D points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud3D {
    /// Points in sensor order.
    pub points: Vec<Point3D>,
}

impl PointCloud3D {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a cloud from a vector of points.
    pub fn from_points(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    /// Number of points, including non-finite ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the cloud holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a point.
    #[inline]
    pub fn push(&mut self, point: Point3D) {
        self.points.push(point);
    }

    /// Iterate over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, Point3D> {
        self.points.iter()
    }

    /// Map every point through a rigid transform.
    ///
    /// Non-finite points stay non-finite; intensity is preserved.
    pub fn transformed(&self, pose: &Pose3D) -> PointCloud3D {
        let points = self
            .points
            .iter()
            .map(|p| {
                let q = pose * nalgebra::Point3::new(p.x, p.y, p.z);
                Point3D::with_intensity(q.x, q.y, q.z, p.intensity)
            })
            .collect();
        PointCloud3D { points }
    }
}

impl<'a> IntoIterator for &'a PointCloud3D {
    type Item = &'a Point3D;
    type IntoIter = std::slice::Iter<'a, Point3D>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::pose::pose_from_rpy;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_point_finiteness() {
        assert!(Point3D::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Point3D::new(f64::NAN, 2.0, 3.0).is_finite());
        assert!(!Point3D::new(1.0, f64::INFINITY, 3.0).is_finite());
        // Intensity does not affect finiteness.
        assert!(Point3D::with_intensity(1.0, 2.0, 3.0, f32::NAN).is_finite());
    }

    #[test]
    fn test_transform_translates_and_rotates() {
        let mut cloud = PointCloud3D::new();
        cloud.push(Point3D::new(1.0, 0.0, 0.0));

        let pose = pose_from_rpy(Vector3::new(0.0, 0.0, 1.0), 0.0, 0.0, FRAC_PI_2);
        let out = cloud.transformed(&pose);

        assert_relative_eq!(out.points[0].x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.points[0].y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(out.points[0].z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_preserves_intensity_and_order() {
        let cloud = PointCloud3D::from_points(vec![
            Point3D::with_intensity(0.0, 0.0, 0.0, 7.0),
            Point3D::with_intensity(1.0, 1.0, 1.0, 9.0),
        ]);
        let out = cloud.transformed(&Pose3D::identity());
        assert_eq!(out.points[0].intensity, 7.0);
        assert_eq!(out.points[1].intensity, 9.0);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_transform_keeps_nonfinite_points() {
        let cloud = PointCloud3D::from_points(vec![Point3D::new(f64::NAN, 0.0, 0.0)]);
        let out = cloud.transformed(&Pose3D::identity());
        assert_eq!(out.len(), 1);
        assert!(!out.points[0].is_finite());
    }
}
