// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{validate_config, ConfigError, ConfigResult, PhospheneConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "phosphene_configuration.toml";

/// Environment variable pointing at a configuration file
pub const CONFIG_PATH_ENV: &str = "PHOSPHENE_CONFIG_PATH";

/// Environment variable -> override key
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PHOSPHENE_MODEL", "model"),
    ("PHOSPHENE_EYE", "eye"),
    ("PHOSPHENE_N_AXONS", "n_axons"),
    ("PHOSPHENE_N_AX_SEGMENTS", "n_ax_segments"),
    ("PHOSPHENE_RHO", "rho"),
    ("PHOSPHENE_AXLAMBDA", "axlambda"),
    ("PHOSPHENE_THRESH_PERCEPT", "thresh_percept"),
    ("PHOSPHENE_COMBINE", "combine"),
    ("PHOSPHENE_ENGINE", "engine"),
    ("PHOSPHENE_XYSTEP", "xystep"),
    ("PHOSPHENE_LOG_LEVEL", "log_level"),
    ("PHOSPHENE_LOG_DIR", "log_dir"),
];

/// Find the phosphene configuration file
///
/// Search order:
/// 1. `PHOSPHENE_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load, override and validate the configuration
///
/// * `config_path` - config file; searched for when `None`
/// * `cli_args` - CLI overrides keyed like [`apply_cli_overrides`]
///
/// # Errors
///
/// Missing file, invalid TOML, unparsable override or failed validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<PhospheneConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: PhospheneConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    validate_config(&config)?;
    Ok(config)
}

/// Apply `PHOSPHENE_*` environment variables
///
/// - `PHOSPHENE_MODEL` -> `model.kind`
/// - `PHOSPHENE_EYE` -> `model.eye`
/// - `PHOSPHENE_N_AXONS`, `PHOSPHENE_N_AX_SEGMENTS`, `PHOSPHENE_RHO`,
///   `PHOSPHENE_AXLAMBDA`, `PHOSPHENE_THRESH_PERCEPT`, `PHOSPHENE_COMBINE`,
///   `PHOSPHENE_ENGINE` -> the `model` field of the same name
/// - `PHOSPHENE_XYSTEP` -> `grid.xystep`
/// - `PHOSPHENE_LOG_LEVEL` -> `logging.level`
/// - `PHOSPHENE_LOG_DIR` -> `logging.log_dir`
pub fn apply_environment_overrides(config: &mut PhospheneConfig) -> ConfigResult<()> {
    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = env::var(var) {
            set_value(config, key, &value)?;
        }
    }
    Ok(())
}

/// Apply CLI overrides
///
/// Keys: `model`, `eye`, `n_axons`, `n_ax_segments`, `rho`, `axlambda`,
/// `thresh_percept`, `combine`, `engine`, `xystep`, `log_level`, `log_dir`.
/// Unknown keys are ignored.
pub fn apply_cli_overrides(
    config: &mut PhospheneConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in cli_args {
        set_value(config, key, value)?;
    }
    Ok(())
}

fn set_value(config: &mut PhospheneConfig, key: &str, value: &str) -> ConfigResult<()> {
    match key {
        "model" => config.model.kind = value.to_string(),
        "eye" => config.model.eye = value.to_string(),
        "n_axons" => config.model.n_axons = parse(key, value)?,
        "n_ax_segments" => config.model.n_ax_segments = parse(key, value)?,
        "rho" => config.model.rho = parse(key, value)?,
        "axlambda" => config.model.axlambda = parse(key, value)?,
        "thresh_percept" => config.model.thresh_percept = parse(key, value)?,
        "combine" => config.model.combine = value.to_string(),
        "engine" => config.model.engine = value.to_string(),
        "xystep" => config.grid.xystep = parse(key, value)?,
        "log_level" => config.logging.level = value.to_string(),
        "log_dir" => config.logging.log_dir = Some(PathBuf::from(value)),
        _ => {}
    }
    Ok(())
}

fn parse<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = '{}'", key, value)))
}
