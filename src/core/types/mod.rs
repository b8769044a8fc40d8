//! Core data types shared across the crate.

pub mod cloud;
pub mod pose;

pub use cloud::{Point3D, PointCloud3D};
pub use pose::{pose_from_rpy, pose_origin, pose_rpy, Pose3D};
