// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Rectangular sampling grid over a patch of the visual field.
//!
//! The grid is laid out in degrees of visual angle and carries the matching
//! retinal coordinates. Because the coordinate transform is per-axis, the
//! retinal grid stays separable and only one vector per axis is stored.

use serde::{Deserialize, Serialize};

use crate::coords::dva2ret_scalar;
use crate::error::{ensure_finite, PerceptError, PerceptResult};
use crate::retina::RetinalPoint;

/// Region of interest in the visual field (dva)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub xrange: (f64, f64),
    pub yrange: (f64, f64),
    pub xystep: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            xrange: (-20.0, 20.0),
            yrange: (-15.0, 15.0),
            xystep: 0.25,
        }
    }
}

impl GridSpec {
    pub fn validate(&self) -> PerceptResult<()> {
        ensure_finite("xrange.0", self.xrange.0)?;
        ensure_finite("xrange.1", self.xrange.1)?;
        ensure_finite("yrange.0", self.yrange.0)?;
        ensure_finite("yrange.1", self.yrange.1)?;
        ensure_finite("xystep", self.xystep)?;
        if self.xystep <= 0.0 {
            return Err(PerceptError::InvalidParameter(format!(
                "xystep must be positive, got {}",
                self.xystep
            )));
        }
        if self.xrange.0 > self.xrange.1 || self.yrange.0 > self.yrange.1 {
            return Err(PerceptError::InvalidParameter(format!(
                "grid ranges must be ordered (min, max), got x={:?} y={:?}",
                self.xrange, self.yrange
            )));
        }
        Ok(())
    }
}

fn axis_samples(range: (f64, f64), step: f64) -> Vec<f64> {
    let n = ((range.1 - range.0) / step + 0.5).floor() as usize + 1;
    (0..n).map(|i| range.0 + i as f64 * step).collect()
}

/// Sampled grid with visual-field and retinal coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct RetinalGrid {
    spec: GridSpec,
    x_dva: Vec<f64>,
    y_dva: Vec<f64>,
    x_ret: Vec<f64>,
    y_ret: Vec<f64>,
}

impl RetinalGrid {
    pub fn new(spec: GridSpec) -> PerceptResult<Self> {
        spec.validate()?;
        let x_dva = axis_samples(spec.xrange, spec.xystep);
        let y_dva = axis_samples(spec.yrange, spec.xystep);
        let x_ret = x_dva
            .iter()
            .map(|&d| dva2ret_scalar(d))
            .collect::<PerceptResult<Vec<_>>>()?;
        let y_ret = y_dva
            .iter()
            .map(|&d| dva2ret_scalar(d))
            .collect::<PerceptResult<Vec<_>>>()?;
        Ok(Self {
            spec,
            x_dva,
            y_dva,
            x_ret,
            y_ret,
        })
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// (rows, cols) = (y samples, x samples)
    pub fn shape(&self) -> (usize, usize) {
        (self.y_dva.len(), self.x_dva.len())
    }

    pub fn len(&self) -> usize {
        self.x_dva.len() * self.y_dva.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn x_dva(&self) -> &[f64] {
        &self.x_dva
    }

    pub fn y_dva(&self) -> &[f64] {
        &self.y_dva
    }

    pub fn x_ret(&self) -> &[f64] {
        &self.x_ret
    }

    pub fn y_ret(&self) -> &[f64] {
        &self.y_ret
    }

    /// Retinal location of grid cell (row, col)
    #[inline]
    pub fn point(&self, row: usize, col: usize) -> RetinalPoint {
        RetinalPoint::new(self.x_ret[col], self.y_ret[row])
    }

    /// Retinal location of the flat (row-major) index
    #[inline]
    pub fn point_at(&self, flat: usize) -> RetinalPoint {
        let cols = self.x_dva.len();
        self.point(flat / cols, flat % cols)
    }

    /// All retinal locations in row-major order
    pub fn retinal_points(&self) -> Vec<RetinalPoint> {
        let mut points = Vec::with_capacity(self.len());
        for &y in &self.y_ret {
            for &x in &self.x_ret {
                points.push(RetinalPoint::new(x, y));
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_shape() {
        let grid = RetinalGrid::new(GridSpec::default()).unwrap();
        assert_eq!(grid.shape(), (121, 161));
        assert_eq!(grid.len(), 121 * 161);
        // Fovea is sampled exactly
        assert_eq!(grid.x_dva()[80], 0.0);
        assert_eq!(grid.point(60, 80), RetinalPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_flat_index_is_row_major() {
        let spec = GridSpec {
            xrange: (-1.0, 1.0),
            yrange: (0.0, 1.0),
            xystep: 1.0,
        };
        let grid = RetinalGrid::new(spec).unwrap();
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.point_at(4), grid.point(1, 1));
        assert_eq!(grid.retinal_points()[5], grid.point(1, 2));
    }

    #[test]
    fn test_single_point_grid() {
        let spec = GridSpec {
            xrange: (2.0, 2.0),
            yrange: (-3.0, -3.0),
            xystep: 0.5,
        };
        let grid = RetinalGrid::new(spec).unwrap();
        assert_eq!(grid.shape(), (1, 1));
    }

    #[test]
    fn test_invalid_specs() {
        let mut spec = GridSpec::default();
        spec.xystep = 0.0;
        assert!(RetinalGrid::new(spec).is_err());
        let mut spec = GridSpec::default();
        spec.xrange = (5.0, -5.0);
        assert!(RetinalGrid::new(spec).is_err());
        let mut spec = GridSpec::default();
        spec.yrange = (f64::NAN, 1.0);
        assert!(RetinalGrid::new(spec).is_err());
    }
}
