//! Voxel-grid downsampling for 3D point clouds.
//!
//! Reduces point count before nearest-neighbor matching while preserving
//! the distance statistics the sensor models depend on. Space is divided
//! into cubes of edge length `leaf_size`; each occupied cube contributes a
//! single representative point, the centroid of its finite members.

use std::collections::BTreeMap;

use crate::core::types::{Point3D, PointCloud3D};

/// Configuration for the voxel filter.
#[derive(Debug, Clone, Copy)]
pub struct VoxelFilterConfig {
    /// Edge length of a voxel cube in meters.
    pub leaf_size: f64,
}

impl Default for VoxelFilterConfig {
    fn default() -> Self {
        Self { leaf_size: 0.1 }
    }
}

/// Voxel-grid downsampler.
///
/// Output order follows voxel index order, so the same input cloud always
/// produces the same output cloud. Downstream weight computations sum the
/// output in order; keeping that order stable keeps them reproducible.
#[derive(Debug, Clone)]
pub struct VoxelFilter {
    config: VoxelFilterConfig,
}

impl VoxelFilter {
    /// Create a filter with the given configuration.
    pub fn new(config: VoxelFilterConfig) -> Self {
        Self { config }
    }

    /// Create a filter with the given leaf size.
    pub fn with_leaf_size(leaf_size: f64) -> Self {
        Self::new(VoxelFilterConfig { leaf_size })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &VoxelFilterConfig {
        &self.config
    }

    /// Downsample a cloud to at most one point per voxel.
    ///
    /// Non-finite points are skipped. Each output point is the centroid of
    /// the finite points in its voxel, with averaged intensity.
    pub fn apply(&self, cloud: &PointCloud3D) -> PointCloud3D {
        if cloud.is_empty() {
            return PointCloud3D::new();
        }

        struct Accumulator {
            x: f64,
            y: f64,
            z: f64,
            intensity: f64,
            count: usize,
        }

        let inv_leaf = 1.0 / self.config.leaf_size;
        let mut voxels: BTreeMap<(i64, i64, i64), Accumulator> = BTreeMap::new();

        for point in cloud {
            if !point.is_finite() {
                continue;
            }

            let key = (
                (point.x * inv_leaf).floor() as i64,
                (point.y * inv_leaf).floor() as i64,
                (point.z * inv_leaf).floor() as i64,
            );

            let acc = voxels.entry(key).or_insert(Accumulator {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                intensity: 0.0,
                count: 0,
            });
            acc.x += point.x;
            acc.y += point.y;
            acc.z += point.z;
            acc.intensity += point.intensity as f64;
            acc.count += 1;
        }

        let mut out = PointCloud3D::new();
        for acc in voxels.values() {
            let n = acc.count as f64;
            out.push(Point3D::with_intensity(
                acc.x / n,
                acc.y / n,
                acc.z / n,
                (acc.intensity / n) as f32,
            ));
        }
        out
    }
}

impl Default for VoxelFilter {
    fn default() -> Self {
        Self::new(VoxelFilterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_cloud() {
        let filter = VoxelFilter::default();
        assert!(filter.apply(&PointCloud3D::new()).is_empty());
    }

    #[test]
    fn test_points_in_same_voxel_merge() {
        let cloud = PointCloud3D::from_points(vec![
            Point3D::new(0.01, 0.01, 0.01),
            Point3D::new(0.03, 0.03, 0.03),
        ]);
        let filter = VoxelFilter::with_leaf_size(0.1);
        let out = filter.apply(&cloud);

        assert_eq!(out.len(), 1);
        assert_relative_eq!(out.points[0].x, 0.02, epsilon = 1e-12);
        assert_relative_eq!(out.points[0].y, 0.02, epsilon = 1e-12);
        assert_relative_eq!(out.points[0].z, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_points_in_distinct_voxels_survive() {
        let cloud = PointCloud3D::from_points(vec![
            Point3D::new(0.05, 0.05, 0.05),
            Point3D::new(1.05, 0.05, 0.05),
            Point3D::new(0.05, 1.05, 0.05),
        ]);
        let filter = VoxelFilter::with_leaf_size(0.1);
        assert_eq!(filter.apply(&cloud).len(), 3);
    }

    #[test]
    fn test_nonfinite_points_dropped() {
        let cloud = PointCloud3D::from_points(vec![
            Point3D::new(f64::NAN, 0.0, 0.0),
            Point3D::new(0.05, 0.05, 0.05),
        ]);
        let filter = VoxelFilter::with_leaf_size(0.1);
        let out = filter.apply(&cloud);
        assert_eq!(out.len(), 1);
        assert!(out.points[0].is_finite());
    }

    #[test]
    fn test_intensity_averaged() {
        let cloud = PointCloud3D::from_points(vec![
            Point3D::with_intensity(0.01, 0.0, 0.0, 10.0),
            Point3D::with_intensity(0.02, 0.0, 0.0, 30.0),
        ]);
        let filter = VoxelFilter::with_leaf_size(0.1);
        let out = filter.apply(&cloud);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out.points[0].intensity, 20.0, epsilon = 1e-6);
    }

    #[test]
    fn test_deterministic_output() {
        let cloud = PointCloud3D::from_points(
            (0..500)
                .map(|i| {
                    let t = i as f64 * 0.037;
                    Point3D::new(t.sin() * 3.0, t.cos() * 3.0, (t * 0.5).sin())
                })
                .collect(),
        );
        let filter = VoxelFilter::with_leaf_size(0.25);
        let a = filter.apply(&cloud);
        let b = filter.apply(&cloud);
        assert_eq!(a, b);
        assert!(a.len() < cloud.len());
    }

    #[test]
    fn test_negative_coordinates_bin_correctly() {
        // Points either side of a voxel boundary at 0 must not merge.
        let cloud = PointCloud3D::from_points(vec![
            Point3D::new(-0.05, 0.0, 0.0),
            Point3D::new(0.05, 0.0, 0.0),
        ]);
        let filter = VoxelFilter::with_leaf_size(0.1);
        assert_eq!(filter.apply(&cloud).len(), 2);
    }
}
