// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one section of `phosphene_configuration.toml`. Every
//! field has a default, so a file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PhospheneConfig {
    pub model: ModelConfig,
    pub grid: GridConfig,
    pub logging: LoggingConfig,
}

/// Spatial model selection and parameters
///
/// Enum-like values stay strings here and are parsed when the model is
/// created, so this crate does not depend on the model crates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `axon_map` or `scoreboard`
    pub kind: String,
    /// `RE` or `LE`
    pub eye: String,
    /// Optic disc (dva), right-eye frame
    pub loc_od: [f64; 2],
    pub n_axons: usize,
    pub n_ax_segments: usize,
    pub ax_segments_range: [f64; 2],
    pub beta_sup: f64,
    pub beta_inf: f64,
    pub rho: f64,
    pub axlambda: f64,
    pub min_ax_sensitivity: f64,
    pub thresh_percept: f64,
    /// `summed` or `joint`
    pub combine: String,
    /// `serial` or `rayon`
    pub engine: String,
    pub index_cell_size: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: "axon_map".to_string(),
            eye: "RE".to_string(),
            loc_od: [15.5, 1.5],
            n_axons: 1000,
            n_ax_segments: 500,
            ax_segments_range: [0.0, 45.0],
            beta_sup: -1.9,
            beta_inf: 0.5,
            rho: 100.0,
            axlambda: 100.0,
            min_ax_sensitivity: 1e-3,
            thresh_percept: 0.0,
            combine: "summed".to_string(),
            engine: "rayon".to_string(),
            index_cell_size: 100.0,
        }
    }
}

/// Simulated visual field patch (dva)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GridConfig {
    pub xrange: [f64; 2],
    pub yrange: [f64; 2],
    pub xystep: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            xrange: [-20.0, 20.0],
            yrange: [-15.0, 15.0],
            xystep: 0.25,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Crates to log at debug level (e.g. `["phosphene-models"]`)
    pub debug_crates: Vec<String>,
    /// Directory for per-run JSON logs (file-logging builds only)
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug_crates: Vec::new(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: PhospheneConfig = toml::from_str(
            r#"
            [model]
            n_axons = 250
            eye = "LE"

            [grid]
            xystep = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.model.n_axons, 250);
        assert_eq!(config.model.eye, "LE");
        assert_eq!(config.model.rho, 100.0);
        assert_eq!(config.grid.xystep, 0.5);
        assert_eq!(config.grid.xrange, [-20.0, 20.0]);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_json_round_trip_shape() {
        let json = serde_json::to_value(PhospheneConfig::default()).unwrap();
        assert_eq!(json["model"]["kind"], "axon_map");
        assert_eq!(json["grid"]["xystep"], 0.25);
    }
}
