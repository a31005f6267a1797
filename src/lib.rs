// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # phosphene
//!
//! Predicts what a retinal implant user sees. Electrodes activate nerve
//! fibers that pass near them, so a single electrode produces a streak that
//! follows the axon bundle instead of a round dot.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! phosphene = "0.1"  # Default: parallel + config + observability
//! ```
//!
//! ```rust,no_run
//! use phosphene::prelude::*;
//!
//! let model = AxonMapModel::new(AxonMapParams {
//!     rho: 200.0,
//!     axlambda: 500.0,
//!     ..Default::default()
//! });
//! model.build()?;
//!
//! let implant = Implant::single("A1", Electrode::new(0.0, 0.0, 0.0, 100.0)?, Eye::Right)?;
//! let percept = model.predict_frame(&implant, &StimulusFrame::from_pairs([("A1", 1.0)]))?;
//! println!("peak brightness {}", percept.max());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`parallel`** (default): rayon grid and frame evaluation
//! - **`config`** (default): TOML configuration with env/CLI overrides, and
//!   [`settings`] to turn it into a model
//! - **`observability`** (default): logging initialisation and debug flags
//! - **`file-logging`**: per-run JSON log files
//! - **`cli`** (default): `clap` argument parsing for the `predict_percept` tool
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: phosphene-structures                       │
//! │  (Implant, StimulusFrame, RetinalGrid, dva <-> µm)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: phosphene-models                           │
//! │  (Axon bundles, bundle index, axon map, scoreboard)     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Cross-cutting: phosphene-config, -observability        │
//! │  (TOML + overrides, tracing setup)                      │
//! └─────────────────────────────────────────────────────────┘
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use phosphene_models as models;
pub use phosphene_structures as structures;

#[cfg(feature = "config")]
pub use phosphene_config as config;

#[cfg(feature = "observability")]
pub use phosphene_observability as observability;

#[cfg(feature = "config")]
pub mod settings;

/// Common imports
pub mod prelude {
    pub use phosphene_models::{
        AxonCombine, AxonMapModel, AxonMapParams, BuiltAxonMap, Engine, Fingerprint,
        ScoreboardModel, ScoreboardParams, SpatialModel,
    };
    pub use phosphene_structures::{
        dva2ret, ret2dva, BrightnessMap, Electrode, Eye, GridSpec, Implant, OpticDisc,
        PerceptError, PerceptResult, RetinalGrid, RetinalPoint, StimulusFrame,
    };

    #[cfg(feature = "config")]
    pub use crate::settings::{model_from_config, ModelKind};
    #[cfg(feature = "config")]
    pub use phosphene_config::{load_config, PhospheneConfig};
}

/// Versions of every workspace crate, for startup banners
pub fn crate_versions() -> Vec<(&'static str, &'static str)> {
    let mut versions = vec![
        ("phosphene", VERSION),
        ("phosphene-structures", phosphene_structures::VERSION),
        ("phosphene-models", phosphene_models::VERSION),
    ];
    #[cfg(feature = "config")]
    versions.push(("phosphene-config", phosphene_config::VERSION));
    #[cfg(feature = "observability")]
    versions.push(("phosphene-observability", phosphene_observability::VERSION));
    versions
}
