// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Stimulus frames: electrode name -> amplitude at one instant.

use ahash::AHashMap;

use crate::error::{ensure_finite, PerceptError, PerceptResult};
use crate::implant::Implant;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StimulusFrame {
    amplitudes: AHashMap<String, f64>,
}

impl StimulusFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(name, amplitude)` pairs; later pairs win
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let amplitudes = pairs.into_iter().map(|(n, a)| (n.into(), a)).collect();
        Self { amplitudes }
    }

    /// Same amplitude on every electrode of `implant`
    pub fn uniform(implant: &Implant, amplitude: f64) -> Self {
        Self::from_pairs(implant.iter().map(|(name, _)| (name.to_string(), amplitude)))
    }

    pub fn set(&mut self, name: impl Into<String>, amplitude: f64) {
        self.amplitudes.insert(name.into(), amplitude);
    }

    /// Amplitude on `name` (0 if the electrode is not driven)
    pub fn amplitude(&self, name: &str) -> f64 {
        self.amplitudes.get(name).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    /// True when every amplitude is zero
    pub fn is_silent(&self) -> bool {
        self.amplitudes.values().all(|&a| a == 0.0)
    }

    /// Check the frame against an implant
    ///
    /// Every driven name must exist in the implant and every amplitude must be
    /// finite.
    pub fn validate_for(&self, implant: &Implant) -> PerceptResult<()> {
        for (name, &amp) in &self.amplitudes {
            if !implant.contains(name) {
                return Err(PerceptError::IncompatibleInput(format!(
                    "stimulus drives electrode '{}' which the implant does not have",
                    name
                )));
            }
            ensure_finite(&format!("amplitude of '{}'", name), amp)?;
        }
        Ok(())
    }

    /// Nonzero amplitudes in implant order, paired with the electrode index
    pub fn active_in<'a>(&'a self, implant: &'a Implant) -> impl Iterator<Item = (usize, f64)> + 'a {
        implant
            .iter()
            .enumerate()
            .map(move |(i, (name, _))| (i, self.amplitude(name)))
            .filter(|&(_, a)| a != 0.0)
    }
}
