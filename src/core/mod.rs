//! Foundation layer: pose and point-cloud types.

pub mod types;
