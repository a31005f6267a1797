// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Eye designation, retinal points and the optic disc location.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{ensure_finite, PerceptError, PerceptResult};

/// Which eye an implant sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Eye {
    #[default]
    #[serde(rename = "RE")]
    Right,
    #[serde(rename = "LE")]
    Left,
}

impl Eye {
    /// Sign applied to x coordinates generated in the right-eye frame
    #[inline]
    pub fn x_sign(self) -> f64 {
        match self {
            Eye::Right => 1.0,
            Eye::Left => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Eye::Right => "RE",
            Eye::Left => "LE",
        }
    }
}

impl Display for Eye {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Eye {
    type Err = PerceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RE" | "RIGHT" => Ok(Eye::Right),
            "LE" | "LEFT" => Ok(Eye::Left),
            other => Err(PerceptError::InvalidParameter(format!(
                "eye must be 'LE' or 'RE', not '{}'",
                other
            ))),
        }
    }
}

/// A location on the retinal surface in microns
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RetinalPoint {
    pub x: f64,
    pub y: f64,
}

impl RetinalPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance_squared(&self, other: &RetinalPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(&self, other: &RetinalPoint) -> f64 {
        self.distance_squared(other).sqrt()
    }

    #[inline]
    pub fn mirrored_x(&self) -> Self {
        Self::new(-self.x, self.y)
    }
}

impl From<(f64, f64)> for RetinalPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Optic disc center in degrees of visual angle, right-eye canonical frame
///
/// `x` is always positive (the disc is nasal, at `+x`, in a right eye). For a
/// left eye the disc sits at `(-x, y)`; use [`OpticDisc::for_eye`] to get the
/// actual location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpticDisc {
    pub x: f64,
    pub y: f64,
}

impl OpticDisc {
    /// Create a validated disc location
    pub fn new(x: f64, y: f64) -> PerceptResult<Self> {
        ensure_finite("loc_od.x", x)?;
        ensure_finite("loc_od.y", y)?;
        if x <= 0.0 {
            return Err(PerceptError::InvalidParameter(format!(
                "loc_od.x must be positive in the right-eye frame, got {} \
                 (give the right-eye position; left eyes are mirrored)",
                x
            )));
        }
        Ok(Self { x, y })
    }

    /// Disc location (dva) in the given eye
    pub fn for_eye(&self, eye: Eye) -> (f64, f64) {
        (eye.x_sign() * self.x, self.y)
    }
}

impl Default for OpticDisc {
    fn default() -> Self {
        Self { x: 15.5, y: 1.5 }
    }
}
