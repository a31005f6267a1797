// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Axon map parameters and their fingerprint.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

use phosphene_structures::{ensure_finite, Eye, GridSpec, OpticDisc, PerceptError, PerceptResult};

use super::index::min_cell_size;
use crate::base::{Engine, Fingerprint};

/// How electrode contributions are combined along an axon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxonCombine {
    /// `sum_e amp_e * max_s(sensitivity_s * spread_e(s))`
    #[default]
    Summed,
    /// `max_s |sensitivity_s * sum_e amp_e * spread_e(s)|`, sign kept
    Joint,
}

impl AxonCombine {
    pub fn as_str(self) -> &'static str {
        match self {
            AxonCombine::Summed => "summed",
            AxonCombine::Joint => "joint",
        }
    }
}

impl std::str::FromStr for AxonCombine {
    type Err = PerceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summed" | "sum" => Ok(AxonCombine::Summed),
            "joint" => Ok(AxonCombine::Joint),
            other => Err(PerceptError::InvalidParameter(format!(
                "combine must be 'summed' or 'joint', not '{}'",
                other
            ))),
        }
    }
}

/// Everything that determines a built axon map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxonMapParams {
    /// Optic disc center (dva), right-eye frame
    pub loc_od: OpticDisc,
    pub eye: Eye,
    /// Number of nerve fiber bundles to grow
    pub n_axons: usize,
    /// Samples per bundle
    pub n_ax_segments: usize,
    /// Radial extent of every bundle (dva from the disc)
    pub ax_segments_range: (f64, f64),
    pub beta_sup: f64,
    pub beta_inf: f64,
    /// Current spread decay (µm)
    pub rho: f64,
    /// Axonal sensitivity decay (µm)
    pub axlambda: f64,
    /// Axon segments below this sensitivity are ignored
    pub min_ax_sensitivity: f64,
    pub thresh_percept: f64,
    pub combine: AxonCombine,
    pub engine: Engine,
    pub grid: GridSpec,
    /// Edge length of a bundle index cell (µm)
    pub index_cell_size: f64,
}

impl Default for AxonMapParams {
    fn default() -> Self {
        Self {
            loc_od: OpticDisc::default(),
            eye: Eye::Right,
            n_axons: 1000,
            n_ax_segments: 500,
            ax_segments_range: (0.0, 45.0),
            beta_sup: -1.9,
            beta_inf: 0.5,
            rho: 100.0,
            axlambda: 100.0,
            min_ax_sensitivity: 1e-3,
            thresh_percept: 0.0,
            combine: AxonCombine::Summed,
            engine: Engine::default(),
            grid: GridSpec::default(),
            index_cell_size: 100.0,
        }
    }
}

impl AxonMapParams {
    /// Check every parameter; the first problem wins
    pub fn validate(&self) -> PerceptResult<()> {
        OpticDisc::new(self.loc_od.x, self.loc_od.y)?;
        if self.n_axons == 0 {
            return Err(PerceptError::invalid("n_axons must be positive"));
        }
        if self.n_ax_segments == 0 {
            return Err(PerceptError::invalid("n_ax_segments must be positive"));
        }
        ensure_finite("ax_segments_range.0", self.ax_segments_range.0)?;
        ensure_finite("ax_segments_range.1", self.ax_segments_range.1)?;
        if self.ax_segments_range.0 < 0.0 || self.ax_segments_range.0 > self.ax_segments_range.1 {
            return Err(PerceptError::InvalidParameter(format!(
                "ax_segments_range must satisfy 0 <= min <= max, got {:?}",
                self.ax_segments_range
            )));
        }
        ensure_finite("beta_sup", self.beta_sup)?;
        ensure_finite("beta_inf", self.beta_inf)?;
        positive("rho", self.rho)?;
        positive("axlambda", self.axlambda)?;
        ensure_finite("min_ax_sensitivity", self.min_ax_sensitivity)?;
        if self.min_ax_sensitivity <= 0.0 || self.min_ax_sensitivity > 1.0 {
            return Err(PerceptError::InvalidParameter(format!(
                "min_ax_sensitivity must be in (0, 1], got {}",
                self.min_ax_sensitivity
            )));
        }
        ensure_finite("thresh_percept", self.thresh_percept)?;
        positive("index_cell_size", self.index_cell_size)?;
        if self.index_cell_size < min_cell_size() {
            return Err(PerceptError::InvalidParameter(format!(
                "index_cell_size must be at least {:.3} µm, got {}",
                min_cell_size(),
                self.index_cell_size
            )));
        }
        self.grid.validate()
    }

    /// Longest arc length (µm) whose sensitivity is still above `min_ax_sensitivity`
    pub fn max_arc_length(&self) -> f64 {
        self.axlambda * (-2.0 * self.min_ax_sensitivity.ln()).sqrt()
    }
}

fn positive(name: &str, value: f64) -> PerceptResult<()> {
    ensure_finite(name, value)?;
    if value <= 0.0 {
        return Err(PerceptError::InvalidParameter(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

impl Fingerprint for AxonMapParams {
    fn fingerprint(&self) -> u64 {
        let mut h = Xxh64::new(0);
        let mut f = |v: f64| h.update(&v.to_bits().to_le_bytes());
        f(self.loc_od.x);
        f(self.loc_od.y);
        f(self.ax_segments_range.0);
        f(self.ax_segments_range.1);
        f(self.beta_sup);
        f(self.beta_inf);
        f(self.rho);
        f(self.axlambda);
        f(self.min_ax_sensitivity);
        f(self.thresh_percept);
        f(self.grid.xrange.0);
        f(self.grid.xrange.1);
        f(self.grid.yrange.0);
        f(self.grid.yrange.1);
        f(self.grid.xystep);
        f(self.index_cell_size);
        h.update(&(self.n_axons as u64).to_le_bytes());
        h.update(&(self.n_ax_segments as u64).to_le_bytes());
        h.update(&[
            self.eye as u8,
            self.combine as u8,
            self.engine as u8,
        ]);
        h.digest()
    }
}
