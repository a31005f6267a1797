// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks value ranges and enumerated strings. Every problem is collected so
//! a broken file can be fixed in one pass.

use crate::{ConfigError, ConfigResult, GridConfig, LoggingConfig, ModelConfig, PhospheneConfig};

const MODEL_KINDS: &[&str] = &["axon_map", "scoreboard"];
const EYES: &[&str] = &["RE", "LE", "RIGHT", "LEFT"];
const COMBINE_RULES: &[&str] = &["summed", "sum", "joint"];
const ENGINES: &[&str] = &["serial", "rayon", "parallel"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NotPositive { field: String, value: f64 },
    NotFinite { field: String },
    UnknownChoice { field: String, value: String, allowed: &'static [&'static str] },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{} must be positive, got {}", field, value)
            }
            Self::NotFinite { field } => write!(f, "{} must be a finite number", field),
            Self::UnknownChoice {
                field,
                value,
                allowed,
            } => write!(
                f,
                "{} = '{}' is not one of: {}",
                field,
                value,
                allowed.join(", ")
            ),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &PhospheneConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_model(&config.model, &mut errors);
    validate_grid(&config.grid, &mut errors);
    validate_logging(&config.logging, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }
    Ok(())
}

fn choice(
    field: &str,
    value: &str,
    allowed: &'static [&'static str],
    case_insensitive_upper: bool,
    errors: &mut Vec<ConfigValidationError>,
) {
    let normalized = if case_insensitive_upper {
        value.trim().to_uppercase()
    } else {
        value.trim().to_lowercase()
    };
    if !allowed.contains(&normalized.as_str()) {
        errors.push(ConfigValidationError::UnknownChoice {
            field: field.to_string(),
            value: value.to_string(),
            allowed,
        });
    }
}

fn finite(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) -> bool {
    if value.is_finite() {
        true
    } else {
        errors.push(ConfigValidationError::NotFinite {
            field: field.to_string(),
        });
        false
    }
}

fn positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if finite(field, value, errors) && value <= 0.0 {
        errors.push(ConfigValidationError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn validate_model(model: &ModelConfig, errors: &mut Vec<ConfigValidationError>) {
    choice("model.kind", &model.kind, MODEL_KINDS, false, errors);
    choice("model.eye", &model.eye, EYES, true, errors);
    choice("model.combine", &model.combine, COMBINE_RULES, false, errors);
    choice("model.engine", &model.engine, ENGINES, false, errors);

    if finite("model.loc_od[0]", model.loc_od[0], errors) && model.loc_od[0] <= 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "model.loc_od".to_string(),
            reason: format!(
                "x must be positive (right-eye frame, mirrored for LE), got {}",
                model.loc_od[0]
            ),
        });
    }
    finite("model.loc_od[1]", model.loc_od[1], errors);

    for (field, count) in [
        ("model.n_axons", model.n_axons),
        ("model.n_ax_segments", model.n_ax_segments),
    ] {
        if count == 0 {
            errors.push(ConfigValidationError::NotPositive {
                field: field.to_string(),
                value: 0.0,
            });
        }
    }

    let [lo, hi] = model.ax_segments_range;
    if finite("model.ax_segments_range[0]", lo, errors)
        & finite("model.ax_segments_range[1]", hi, errors)
        && (lo < 0.0 || lo > hi)
    {
        errors.push(ConfigValidationError::InvalidValue {
            field: "model.ax_segments_range".to_string(),
            reason: format!("expected 0 <= min <= max, got [{}, {}]", lo, hi),
        });
    }

    finite("model.beta_sup", model.beta_sup, errors);
    finite("model.beta_inf", model.beta_inf, errors);
    positive("model.rho", model.rho, errors);
    positive("model.axlambda", model.axlambda, errors);
    positive("model.index_cell_size", model.index_cell_size, errors);
    finite("model.thresh_percept", model.thresh_percept, errors);

    if finite("model.min_ax_sensitivity", model.min_ax_sensitivity, errors)
        && (model.min_ax_sensitivity <= 0.0 || model.min_ax_sensitivity > 1.0)
    {
        errors.push(ConfigValidationError::InvalidValue {
            field: "model.min_ax_sensitivity".to_string(),
            reason: format!("must be in (0, 1], got {}", model.min_ax_sensitivity),
        });
    }
}

fn validate_grid(grid: &GridConfig, errors: &mut Vec<ConfigValidationError>) {
    for (field, [lo, hi]) in [("grid.xrange", grid.xrange), ("grid.yrange", grid.yrange)] {
        if finite(field, lo, errors) & finite(field, hi, errors) && lo > hi {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: format!("min {} is greater than max {}", lo, hi),
            });
        }
    }
    positive("grid.xystep", grid.xystep, errors);
}

fn validate_logging(logging: &LoggingConfig, errors: &mut Vec<ConfigValidationError>) {
    choice("logging.level", &logging.level, LOG_LEVELS, false, errors);
}
