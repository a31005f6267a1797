// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Axon map spatial model.

- `bundles`: nerve fiber bundle growth
- `index`: nearest-bundle lookup
- `sensitivity`: current spread and axonal sensitivity along an axon
- `model`: built state and the model lifecycle
*/

pub mod bundles;
pub mod index;
pub mod model;
pub mod params;
pub mod sensitivity;

pub use bundles::{grow_bundles, starting_angles, Bundle, Hemisphere};
pub use index::{BundleIndex, BundlePoint, IndexStats, NearestBundle};
pub use model::{AxonMapModel, BuiltAxonMap};
pub use params::{AxonCombine, AxonMapParams};
pub use sensitivity::{axonal_sensitivity, current_spread, weight, AxonPath, AxonSegment};
