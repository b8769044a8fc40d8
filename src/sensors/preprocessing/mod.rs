//! Point-cloud preprocessing.

pub mod voxel_filter;

pub use voxel_filter::{VoxelFilter, VoxelFilterConfig};
