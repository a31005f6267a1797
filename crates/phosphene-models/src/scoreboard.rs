// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scoreboard model: every electrode lights up a Gaussian blob, no axons.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use xxhash_rust::xxh64::Xxh64;

use phosphene_structures::{
    ensure_finite, BrightnessMap, Implant, PerceptError, PerceptResult, RetinalGrid, RetinalPoint,
    StimulusFrame,
};

use crate::axon_map::current_spread;
use crate::base::{apply_threshold, evaluate_grid, Engine, Fingerprint, ModelState, SpatialModel};

const MODEL_NAME: &str = "ScoreboardModel";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreboardParams {
    /// Current spread decay (µm)
    pub rho: f64,
    pub thresh_percept: f64,
    pub engine: Engine,
    pub grid: phosphene_structures::GridSpec,
}

impl Default for ScoreboardParams {
    fn default() -> Self {
        Self {
            rho: 100.0,
            thresh_percept: 0.0,
            engine: Engine::default(),
            grid: Default::default(),
        }
    }
}

impl ScoreboardParams {
    pub fn validate(&self) -> PerceptResult<()> {
        ensure_finite("rho", self.rho)?;
        if self.rho <= 0.0 {
            return Err(PerceptError::InvalidParameter(format!(
                "rho must be positive, got {}",
                self.rho
            )));
        }
        ensure_finite("thresh_percept", self.thresh_percept)?;
        self.grid.validate()
    }
}

impl Fingerprint for ScoreboardParams {
    fn fingerprint(&self) -> u64 {
        let mut h = Xxh64::new(0);
        for v in [
            self.rho,
            self.thresh_percept,
            self.grid.xrange.0,
            self.grid.xrange.1,
            self.grid.yrange.0,
            self.grid.yrange.1,
            self.grid.xystep,
        ] {
            h.update(&v.to_bits().to_le_bytes());
        }
        h.update(&[self.engine as u8]);
        h.digest()
    }
}

/// Built scoreboard: just the sampled grid
#[derive(Debug)]
pub struct BuiltScoreboard {
    params: ScoreboardParams,
    fingerprint: u64,
    grid: RetinalGrid,
}

impl BuiltScoreboard {
    pub fn build(params: &ScoreboardParams) -> PerceptResult<Self> {
        params.validate()?;
        let start = Instant::now();
        let grid = RetinalGrid::new(params.grid)?;
        info!(
            target: "phosphene-models",
            "Scoreboard grid {:?} ready in {:.1} ms",
            grid.shape(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(Self {
            params: params.clone(),
            fingerprint: params.fingerprint(),
            grid,
        })
    }

    pub fn params(&self) -> &ScoreboardParams {
        &self.params
    }

    pub fn grid(&self) -> &RetinalGrid {
        &self.grid
    }

    /// `sum_e amp_e * spread_e` at every grid point
    pub fn predict_frame(&self, implant: &Implant, frame: &StimulusFrame) -> PerceptResult<BrightnessMap> {
        frame.validate_for(implant)?;
        let electrodes: Vec<RetinalPoint> = implant.iter().map(|(_, e)| e.position()).collect();
        let active: Vec<(RetinalPoint, f64)> = frame
            .active_in(implant)
            .map(|(i, amp)| (electrodes[i], amp))
            .collect();
        let rho = self.params.rho;
        let values = evaluate_grid(self.grid.len(), self.params.engine, |i| {
            let p = self.grid.point_at(i);
            let value: f64 = active
                .iter()
                .map(|(pos, amp)| amp * current_spread(p.distance(pos), rho))
                .sum();
            apply_threshold(value, self.params.thresh_percept)
        });
        BrightnessMap::from_flat(values, self.grid.shape(), *self.grid.spec())
    }
}

impl Fingerprint for BuiltScoreboard {
    fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Scoreboard model (current spread only)
pub struct ScoreboardModel {
    state: ModelState<ScoreboardParams, BuiltScoreboard>,
}

impl ScoreboardModel {
    pub fn new(params: ScoreboardParams) -> Self {
        Self {
            state: ModelState::new(params),
        }
    }

    pub fn params(&self) -> ScoreboardParams {
        self.state.config()
    }

    pub fn reconfigure(&self, params: ScoreboardParams) -> bool {
        self.state.reconfigure(params)
    }

    pub fn build(&self) -> PerceptResult<Arc<BuiltScoreboard>> {
        self.state.build_with(MODEL_NAME, BuiltScoreboard::build)
    }

    pub fn built(&self) -> PerceptResult<Arc<BuiltScoreboard>> {
        self.state.require(MODEL_NAME)
    }

    pub fn predict_frame(&self, implant: &Implant, frame: &StimulusFrame) -> PerceptResult<BrightnessMap> {
        self.built()?.predict_frame(implant, frame)
    }
}

impl Default for ScoreboardModel {
    fn default() -> Self {
        Self::new(ScoreboardParams::default())
    }
}

impl SpatialModel for ScoreboardModel {
    fn name(&self) -> &'static str {
        MODEL_NAME
    }

    fn build(&self) -> PerceptResult<()> {
        ScoreboardModel::build(self).map(|_| ())
    }

    fn is_built(&self) -> bool {
        self.state.current().is_some()
    }

    fn grid(&self) -> PerceptResult<RetinalGrid> {
        Ok(self.built()?.grid().clone())
    }

    fn predict_frame(&self, implant: &Implant, frame: &StimulusFrame) -> PerceptResult<BrightnessMap> {
        ScoreboardModel::predict_frame(self, implant, frame)
    }
}
