// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Electrodes and implants as consumed by the spatial models.
//!
//! Array layout and electrode naming are the implant builder's business; this
//! module only holds the finished geometry.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, PerceptError, PerceptResult};
use crate::retina::{Eye, RetinalPoint};

/// Disk electrode on the retinal surface (microns)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Electrode {
    pub x: f64,
    pub y: f64,
    /// Height above the retinal surface
    pub z: f64,
    /// Disk radius
    pub r: f64,
}

impl Electrode {
    pub fn new(x: f64, y: f64, z: f64, r: f64) -> PerceptResult<Self> {
        ensure_finite("electrode.x", x)?;
        ensure_finite("electrode.y", y)?;
        ensure_finite("electrode.z", z)?;
        ensure_finite("electrode.r", r)?;
        if r <= 0.0 {
            return Err(PerceptError::InvalidParameter(format!(
                "electrode radius must be positive, got {}",
                r
            )));
        }
        Ok(Self { x, y, z, r })
    }

    /// Electrode center projected onto the retinal plane
    #[inline]
    pub fn position(&self) -> RetinalPoint {
        RetinalPoint::new(self.x, self.y)
    }
}

/// An ordered set of named electrodes implanted in one eye
#[derive(Debug, Clone, PartialEq)]
pub struct Implant {
    eye: Eye,
    electrodes: Vec<(String, Electrode)>,
    by_name: AHashMap<String, usize>,
}

impl Implant {
    /// Create an empty implant
    pub fn new(eye: Eye) -> Self {
        Self {
            eye,
            electrodes: Vec::new(),
            by_name: AHashMap::new(),
        }
    }

    /// Implant with a single electrode
    pub fn single(name: impl Into<String>, electrode: Electrode, eye: Eye) -> PerceptResult<Self> {
        let mut implant = Self::new(eye);
        implant.add_electrode(name, electrode)?;
        Ok(implant)
    }

    /// Append an electrode; names must be unique
    pub fn add_electrode(&mut self, name: impl Into<String>, electrode: Electrode) -> PerceptResult<()> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(PerceptError::InvalidParameter(format!(
                "duplicate electrode name '{}'",
                name
            )));
        }
        self.by_name.insert(name.clone(), self.electrodes.len());
        self.electrodes.push((name, electrode));
        Ok(())
    }

    pub fn eye(&self) -> Eye {
        self.eye
    }

    pub fn len(&self) -> usize {
        self.electrodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.electrodes.is_empty()
    }

    /// Electrode by name
    pub fn get(&self, name: &str) -> Option<&Electrode> {
        self.by_name.get(name).map(|&i| &self.electrodes[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Electrodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Electrode)> {
        self.electrodes.iter().map(|(n, e)| (n.as_str(), e))
    }
}
