// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Predicted brightness over a retinal grid.

use ndarray::Array2;

use crate::error::{PerceptError, PerceptResult};
use crate::grid::GridSpec;

/// 2D brightness map, rows along y and columns along x of the grid it was
/// predicted on
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessMap {
    data: Array2<f64>,
    grid: GridSpec,
}

impl BrightnessMap {
    /// Build from row-major values
    pub fn from_flat(values: Vec<f64>, shape: (usize, usize), grid: GridSpec) -> PerceptResult<Self> {
        let data = Array2::from_shape_vec(shape, values)
            .map_err(|e| PerceptError::Internal(format!("brightness map shape: {}", e)))?;
        Ok(Self { data, grid })
    }

    pub fn zeros(shape: (usize, usize), grid: GridSpec) -> Self {
        Self {
            data: Array2::zeros(shape),
            grid,
        }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    /// Largest brightness value (0 for an empty map)
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    /// (row, col) of the brightest cell; first in row-major order on ties
    pub fn argmax(&self) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), f64)> = None;
        for (idx, &v) in self.data.indexed_iter() {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((idx, v)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    /// Rows as plain vectors (for serialisation and plotting)
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.rows().into_iter().map(|r| r.to_vec()).collect()
    }
}
