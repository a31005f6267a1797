// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Predict the percept of a single electrode and print a JSON summary.
//!
//! Loads `phosphene_configuration.toml` (or `--config`), applies environment
//! and `--set key=value` overrides, builds the configured model and drives
//! one electrode.

use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use serde_json::json;
use tracing::info;

use phosphene::observability::{init_logging, CrateDebugFlags, LogFormat, DEBUG_ENV};
use phosphene::prelude::*;

/// Predict the percept of one electrode with the configured spatial model
#[derive(Parser, Debug)]
#[command(name = "predict_percept", version, long_about = None)]
struct Args {
    /// Configuration file (default: search for phosphene_configuration.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Electrode position and radius in retinal µm: x,y or x,y,r
    #[arg(long, value_parser = parse_electrode, default_value = "0,0,100", allow_hyphen_values = true)]
    electrode: (f64, f64, f64),

    /// Stimulus amplitude
    #[arg(long = "amp", default_value_t = 1.0)]
    amplitude: f64,

    /// Configuration override, e.g. `--set rho=150` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    overrides: Vec<(String, String)>,

    /// Enable debug logging for a crate, e.g. `--debug phosphene-models` (repeatable)
    #[arg(long, value_name = "CRATE")]
    debug: Vec<String>,

    /// Enable debug logging for all crates
    #[arg(long, default_value_t = false)]
    debug_all: bool,

    /// Emit JSON logs instead of text
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Include the full brightness map in the output
    #[arg(long, default_value_t = false)]
    full_map: bool,
}

impl Args {
    /// Debug flags from the command line and `PHOSPHENE_DEBUG`
    fn debug_flags(&self, env_value: Option<&str>) -> CrateDebugFlags {
        let mut flags = CrateDebugFlags::default();
        if let Some(value) = env_value {
            flags.merge_env_value(value);
        }
        flags.enabled_crates.extend(self.debug.iter().cloned());
        if self.debug_all {
            flags.enable_all();
        }
        flags
    }
}

fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("{context}: {err}");
    process::exit(1);
}

fn parse_electrode(value: &str) -> Result<(f64, f64, f64), String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in '{value}': {e}"))?;
    match parts.as_slice() {
        [x, y] => Ok((*x, *y, 100.0)),
        [x, y, r] => Ok((*x, *y, *r)),
        _ => Err(format!("expected x,y or x,y,r, got '{value}'")),
    }
}

fn parse_override(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{value}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{value}'"));
    }
    Ok((key.to_string(), val.trim().to_string()))
}

fn main() {
    let args = Args::parse();

    let overrides: HashMap<String, String> = args.overrides.iter().cloned().collect();
    let config = load_config(args.config.as_deref(), Some(&overrides))
        .unwrap_or_else(|e| fail("Failed to load configuration", e));

    let mut flags = args
        .debug_flags(env::var(DEBUG_ENV).ok().as_deref())
        .with_base_level(config.logging.level.clone());
    for crate_name in &config.logging.debug_crates {
        flags.enabled_crates.insert(crate_name.clone());
    }
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    let _guard = init_logging(&flags, format, config.logging.log_dir.clone())
        .unwrap_or_else(|e| fail("Failed to initialise logging", e));

    for (name, version) in phosphene::crate_versions() {
        info!(target: "phosphene", "{} v{}", name, version);
    }

    let model = model_from_config(&config).unwrap_or_else(|e| fail("Invalid model parameters", e));
    let eye = config
        .model
        .eye
        .parse::<Eye>()
        .unwrap_or_else(|e| fail("Invalid eye", e));

    let started = Instant::now();
    model.build().unwrap_or_else(|e| fail("Build failed", e));
    let build_ms = started.elapsed().as_secs_f64() * 1000.0;

    let (x, y, r) = args.electrode;
    let electrode = Electrode::new(x, y, 0.0, r).unwrap_or_else(|e| fail("Invalid electrode", e));
    let implant =
        Implant::single("A1", electrode, eye).unwrap_or_else(|e| fail("Invalid implant", e));
    let frame = StimulusFrame::from_pairs([("A1", args.amplitude)]);

    let started = Instant::now();
    let percept = model
        .predict_frame(&implant, &frame)
        .unwrap_or_else(|e| fail("Prediction failed", e));
    let predict_ms = started.elapsed().as_secs_f64() * 1000.0;

    let (rows, cols) = percept.shape();
    let mut summary = json!({
        "model": model.name(),
        "eye": eye.as_str(),
        "electrode": { "x": x, "y": y, "r": r, "amplitude": args.amplitude },
        "shape": [rows, cols],
        "grid": percept.grid(),
        "max": percept.max(),
        "argmax": percept.argmax().map(|(row, col)| [row, col]),
        "build_ms": build_ms,
        "predict_ms": predict_ms,
    });
    if args.full_map {
        summary["brightness"] = json!(percept.to_rows());
    }

    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(e) => fail("Failed to serialise summary", e),
    }
}
