// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# phosphene-models

Spatial models that predict what a retinal implant user sees:

- `axon_map`: nerve fiber bundles (Jansonius 2009) plus axonal sensitivity
  (Beyeler 2019). Stimulating an electrode activates every axon passing near
  it, so phosphenes streak along the bundles.
- `scoreboard`: current spread only, one Gaussian blob per electrode.

Both follow the same lifecycle: configure, `build()` the expensive
geometry once, then predict any number of frames from many threads.

## Features

- `parallel` (default): evaluate grid points and frames with rayon
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod axon_map;
pub mod base;
pub mod scoreboard;

pub use axon_map::{
    AxonCombine, AxonMapModel, AxonMapParams, AxonPath, Bundle, BundleIndex, BuiltAxonMap,
    Hemisphere, NearestBundle,
};
pub use base::{Engine, Fingerprint, ModelState, SpatialModel};
pub use scoreboard::{BuiltScoreboard, ScoreboardModel, ScoreboardParams};
