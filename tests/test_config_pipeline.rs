// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file to prediction, through the umbrella crate

#![cfg(feature = "config")]

use std::collections::HashMap;
use std::fs;

use tempfile::tempdir;

use phosphene::config::{load_config, ConfigError, CONFIG_FILE_NAME};
use phosphene::prelude::*;
use phosphene::settings::{axon_map_params, model_from_config};

const COMPACT: &str = r#"
[model]
kind = "axon_map"
eye = "LE"
n_axons = 100
n_ax_segments = 300
combine = "joint"
engine = "serial"

[grid]
xrange = [-5.0, 5.0]
yrange = [-4.0, 4.0]
xystep = 0.5

[logging]
level = "warn"
"#;

#[test]
fn test_config_file_to_percept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, COMPACT).unwrap();

    let config = load_config(Some(&path), None).unwrap();
    let params = axon_map_params(&config).unwrap();
    assert_eq!(params.eye, Eye::Left);
    assert_eq!(params.combine, AxonCombine::Joint);
    assert_eq!(params.n_axons, 100);

    let model = model_from_config(&config).unwrap();
    assert!(!model.is_built());
    model.build().unwrap();

    let implant = Implant::single("A1", Electrode::new(0.0, 0.0, 0.0, 100.0).unwrap(), Eye::Left)
        .unwrap();
    let map = model
        .predict_frame(&implant, &StimulusFrame::from_pairs([("A1", 1.0)]))
        .unwrap();
    assert_eq!(map.shape(), (17, 21));
    assert_eq!(map.argmax(), Some((8, 10)));
    assert!((map.max() - 1.0).abs() < 1e-12);
}

#[test]
fn test_cli_override_switches_model() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, COMPACT).unwrap();

    let mut cli = HashMap::new();
    cli.insert("model".to_string(), "scoreboard".to_string());
    cli.insert("rho".to_string(), "80".to_string());
    let config = load_config(Some(&path), Some(&cli)).unwrap();

    let model = model_from_config(&config).unwrap();
    assert_eq!(model.name(), "ScoreboardModel");
    model.build().unwrap();
    assert_eq!(model.grid().unwrap().shape(), (17, 21));
}

#[test]
fn test_invalid_file_never_reaches_the_model() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[model]\ncombine = \"average\"\n").unwrap();
    assert!(matches!(
        load_config(Some(&path), None),
        Err(ConfigError::ValidationError(_))
    ));

    fs::write(&path, "[model\n").unwrap();
    assert!(matches!(
        load_config(Some(&path), None),
        Err(ConfigError::ParseError(_))
    ));
}
