// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # phosphene-structures
//!
//! Core data types shared by the phosphene models: implants and stimuli coming
//! in, retinal grids and brightness maps going out, and the Watson (2014)
//! transform between degrees of visual angle and retinal microns.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod coords;
pub mod error;
pub mod grid;
pub mod implant;
pub mod percept;
pub mod retina;
pub mod stimulus;

pub use coords::{dva2ret, dva2ret_scalar, ret2dva, ret2dva_scalar};
pub use error::{ensure_finite, PerceptError, PerceptResult};
pub use grid::{GridSpec, RetinalGrid};
pub use implant::{Electrode, Implant};
pub use percept::BrightnessMap;
pub use retina::{Eye, OpticDisc, RetinalPoint};
pub use stimulus::StimulusFrame;
