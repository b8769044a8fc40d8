//! 2D elevation map derived from a 3D point cloud.
//!
//! Each cell stores the maximum z of the input points whose (x, y) falls
//! inside it; cells never observed stay NaN. The map doubles as a coarse
//! map-comparison metric (`diff`) and as the backend of the elevation
//! sensor model.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::types::{Point3D, PointCloud3D};

/// Configuration for elevation map construction.
#[derive(Debug, Clone, Copy)]
pub struct ElevationMapConfig {
    /// Edge length of a map cell in meters.
    pub resolution: f64,

    /// Lower bound on the resolution. Requests below this are clamped
    /// so the grid cannot degenerate to zero-size cells.
    pub min_resolution: f64,
}

impl Default for ElevationMapConfig {
    fn default() -> Self {
        Self {
            resolution: 0.1,
            min_resolution: 1e-3,
        }
    }
}

/// Dense grid of maximum observed height per planar cell.
///
/// Built once from a point cloud and read-only afterwards, which makes
/// concurrent queries from the weighting threads safe without locking.
#[derive(Debug, Clone)]
pub struct ElevationMap {
    /// Cell values, row-major with rows indexed by x:
    /// `index = ix * size_y + iy`. NaN = unobserved.
    cells: Vec<f64>,

    /// Number of cells along x.
    size_x: usize,

    /// Number of cells along y.
    size_y: usize,

    /// Edge length of a cell in meters.
    resolution: f64,

    /// World x coordinate of the minimum map corner.
    x_min: f64,

    /// World y coordinate of the minimum map corner.
    y_min: f64,
}

impl ElevationMap {
    /// Build an elevation map covering the finite points of a cloud.
    ///
    /// The minimum corner is snapped down to a resolution-aligned origin
    /// and the grid is sized to cover the planar bounding box, at least
    /// one cell per axis. A cloud with no finite points yields a 1x1
    /// all-NaN map at the origin.
    pub fn from_cloud(config: ElevationMapConfig, cloud: &PointCloud3D) -> Self {
        let resolution = if config.resolution < config.min_resolution {
            log::warn!(
                "Elevation map resolution {} below minimum {}, clamping",
                config.resolution,
                config.min_resolution
            );
            config.min_resolution
        } else {
            config.resolution
        };

        // Planar bounding box over points with finite x and y.
        let mut x_min = f64::INFINITY;
        let mut y_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for point in cloud {
            if point.x.is_finite() && point.y.is_finite() {
                x_min = x_min.min(point.x);
                y_min = y_min.min(point.y);
                x_max = x_max.max(point.x);
                y_max = y_max.max(point.y);
            }
        }

        if !x_min.is_finite() || !y_min.is_finite() {
            log::warn!("Building elevation map from a cloud with no finite points");
            return Self {
                cells: vec![f64::NAN],
                size_x: 1,
                size_y: 1,
                resolution,
                x_min: 0.0,
                y_min: 0.0,
            };
        }

        // Snap the minimum corner down to a resolution-aligned origin.
        let x_origin = (x_min / resolution).floor() * resolution;
        let y_origin = (y_min / resolution).floor() * resolution;

        // One cell past the snapped maximum index, so points on the upper
        // bounding-box edge still fall inside the grid.
        let size_x = (((x_max - x_origin) / resolution).floor() as usize + 1).max(1);
        let size_y = (((y_max - y_origin) / resolution).floor() as usize + 1).max(1);

        let mut map = Self {
            cells: vec![f64::NAN; size_x * size_y],
            size_x,
            size_y,
            resolution,
            x_min: x_origin,
            y_min: y_origin,
        };

        for point in cloud {
            if let Some((ix, iy)) = map.tile(point.x, point.y) {
                if point.z.is_finite() {
                    let cell = &mut map.cells[ix * size_y + iy];
                    if cell.is_nan() || point.z > *cell {
                        *cell = point.z;
                    }
                }
            }
        }

        map
    }

    /// Elevation at the cell containing the given point.
    ///
    /// NaN when the point is non-finite or outside the map.
    pub fn elevation_at_point(&self, point: &Point3D) -> f64 {
        self.elevation_at(point.x, point.y)
    }

    /// Elevation at the cell containing the given world coordinates.
    ///
    /// NaN when the coordinates are non-finite or outside the map.
    pub fn elevation_at(&self, x: f64, y: f64) -> f64 {
        match self.tile(x, y) {
            Some((ix, iy)) => self.elevation_cell(ix, iy),
            None => f64::NAN,
        }
    }

    /// Elevation of the cell with the given indices.
    ///
    /// NaN when the indices are out of bounds.
    pub fn elevation_cell(&self, ix: usize, iy: usize) -> f64 {
        if ix < self.size_x && iy < self.size_y {
            self.cells[ix * self.size_y + iy]
        } else {
            f64::NAN
        }
    }

    /// Mean capped height difference against another map.
    ///
    /// Samples the center of every cell of this map; cells where both maps
    /// have a finite elevation contribute `min(|dz|, d_max)`. Returns
    /// `d_max` when no cell is comparable. Maps with different resolutions
    /// are still compared, with a warning.
    pub fn diff(&self, other: &ElevationMap, d_max: f64) -> f64 {
        if self.resolution != other.resolution {
            log::warn!(
                "Comparing elevation maps with different resolutions ({} vs {})",
                self.resolution,
                other.resolution
            );
        }

        let mut d_total = 0.0;
        let mut n = 0usize;
        for ix in 0..self.size_x {
            for iy in 0..self.size_y {
                let (x_center, y_center) = self.cell_center(ix, iy);
                let d = self.elevation_at(x_center, y_center) - other.elevation_at(x_center, y_center);
                if d.is_finite() {
                    d_total += d.abs().min(d_max);
                    n += 1;
                }
            }
        }

        if n == 0 {
            d_max
        } else {
            d_total / n as f64
        }
    }

    /// Resolution in meters per cell.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Grid dimensions as (size_x, size_y).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    /// World coordinates of the minimum map corner.
    pub fn origin(&self) -> (f64, f64) {
        (self.x_min, self.y_min)
    }

    /// World coordinates of a cell center.
    pub fn cell_center(&self, ix: usize, iy: usize) -> (f64, f64) {
        (
            self.x_min + (ix as f64 + 0.5) * self.resolution,
            self.y_min + (iy as f64 + 0.5) * self.resolution,
        )
    }

    /// Index of the cell containing the given world coordinates.
    ///
    /// `None` when the coordinates are non-finite or outside the map.
    pub fn tile(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }

        let ix = ((x - self.x_min) / self.resolution).floor();
        let iy = ((y - self.y_min) / self.resolution).floor();
        if ix >= 0.0 && iy >= 0.0 {
            let ix = ix as usize;
            let iy = iy as usize;
            if ix < self.size_x && iy < self.size_y {
                return Some((ix, iy));
            }
        }
        None
    }

    /// Write the grid as whitespace-separated rows, one x-index per line.
    ///
    /// Unobserved cells are written as `NaN`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for ix in 0..self.size_x {
            for iy in 0..self.size_y {
                if iy > 0 {
                    write!(writer, " ")?;
                }
                write!(writer, "{}", self.cells[ix * self.size_y + iy])?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    }

    /// Save under a timestamp-derived file name in the working directory.
    ///
    /// Returns the path that was written.
    pub fn save_with_default_name(&self) -> std::io::Result<PathBuf> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let path = PathBuf::from(format!(
            "elevation_{}_{}.csv",
            now.as_secs(),
            now.subsec_nanos()
        ));
        self.save(&path)?;
        Ok(path)
    }
}
