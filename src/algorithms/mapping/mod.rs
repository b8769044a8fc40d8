//! Map representations for localization.

pub mod elevation_map;

pub use elevation_map::{ElevationMap, ElevationMapConfig};
