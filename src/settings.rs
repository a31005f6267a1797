// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Turn a loaded [`PhospheneConfig`] into model parameters.
//!
//! The config crate keeps enum-like values as strings; they are parsed here,
//! where the model types are known.

use std::str::FromStr;

use tracing::debug;

use phosphene_config::{GridConfig, PhospheneConfig};
use phosphene_models::{
    AxonCombine, AxonMapModel, AxonMapParams, Engine, ScoreboardModel, ScoreboardParams,
    SpatialModel,
};
use phosphene_structures::{Eye, GridSpec, OpticDisc, PerceptError, PerceptResult};

/// Which spatial model a configuration asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    AxonMap,
    Scoreboard,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::AxonMap => "axon_map",
            ModelKind::Scoreboard => "scoreboard",
        }
    }
}

impl FromStr for ModelKind {
    type Err = PerceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "axon_map" | "axonmap" => Ok(ModelKind::AxonMap),
            "scoreboard" => Ok(ModelKind::Scoreboard),
            other => Err(PerceptError::InvalidParameter(format!(
                "model kind must be 'axon_map' or 'scoreboard', not '{}'",
                other
            ))),
        }
    }
}

pub fn grid_spec(grid: &GridConfig) -> GridSpec {
    GridSpec {
        xrange: (grid.xrange[0], grid.xrange[1]),
        yrange: (grid.yrange[0], grid.yrange[1]),
        xystep: grid.xystep,
    }
}

/// Axon map parameters from the `[model]` and `[grid]` sections
///
/// # Errors
///
/// Unknown eye/combine/engine strings, or parameters the model rejects
pub fn axon_map_params(config: &PhospheneConfig) -> PerceptResult<AxonMapParams> {
    let m = &config.model;
    let params = AxonMapParams {
        loc_od: OpticDisc::new(m.loc_od[0], m.loc_od[1])?,
        eye: Eye::from_str(&m.eye)?,
        n_axons: m.n_axons,
        n_ax_segments: m.n_ax_segments,
        ax_segments_range: (m.ax_segments_range[0], m.ax_segments_range[1]),
        beta_sup: m.beta_sup,
        beta_inf: m.beta_inf,
        rho: m.rho,
        axlambda: m.axlambda,
        min_ax_sensitivity: m.min_ax_sensitivity,
        thresh_percept: m.thresh_percept,
        combine: AxonCombine::from_str(&m.combine)?,
        engine: Engine::from_str(&m.engine)?,
        grid: grid_spec(&config.grid),
        index_cell_size: m.index_cell_size,
    };
    params.validate()?;
    Ok(params)
}

/// Scoreboard parameters; axon-specific fields are ignored
pub fn scoreboard_params(config: &PhospheneConfig) -> PerceptResult<ScoreboardParams> {
    let params = ScoreboardParams {
        rho: config.model.rho,
        thresh_percept: config.model.thresh_percept,
        engine: Engine::from_str(&config.model.engine)?,
        grid: grid_spec(&config.grid),
    };
    params.validate()?;
    Ok(params)
}

/// Unbuilt model selected by `model.kind`
pub fn model_from_config(config: &PhospheneConfig) -> PerceptResult<Box<dyn SpatialModel>> {
    let kind = ModelKind::from_str(&config.model.kind)?;
    debug!(target: "phosphene", "Creating {} model from configuration", kind.as_str());
    Ok(match kind {
        ModelKind::AxonMap => Box::new(AxonMapModel::new(axon_map_params(config)?)),
        ModelKind::Scoreboard => Box::new(ScoreboardModel::new(scoreboard_params(config)?)),
    })
}
