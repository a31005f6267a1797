// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Shared model plumbing: the `SpatialModel` trait, the build-state cache and
grid evaluation.

## Lifecycle

```text
Unbuilt --build()--> Built(fingerprint) --reconfigure(different)--> Unbuilt
                        |   ^
                        +---+ build() with same fingerprint: no-op
```

Builds and reconfigurations are serialised by the configuration mutex.
Predictions only touch the built slot, an `RwLock<Option<Arc<_>>>` that is
written once per build, so readers never see partial geometry.
*/

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use phosphene_structures::{
    BrightnessMap, Implant, PerceptError, PerceptResult, RetinalGrid, StimulusFrame,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How grid points (and independent frames) are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// One thread
    Serial,
    /// Rayon work stealing (falls back to serial without the `parallel` feature)
    #[default]
    Rayon,
}

impl Engine {
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Serial => "serial",
            Engine::Rayon => "rayon",
        }
    }
}

impl std::str::FromStr for Engine {
    type Err = PerceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serial" => Ok(Engine::Serial),
            "rayon" | "parallel" => Ok(Engine::Rayon),
            other => Err(PerceptError::InvalidParameter(format!(
                "engine must be 'serial' or 'rayon', not '{}'",
                other
            ))),
        }
    }
}

/// Digest identifying a configuration (or the configuration a value was built from)
pub trait Fingerprint {
    fn fingerprint(&self) -> u64;
}

/// A spatial model that turns an implant + stimulus frame into a brightness map
pub trait SpatialModel: Send + Sync {
    /// Short model name for logs
    fn name(&self) -> &'static str;

    /// Perform all expensive one-time work; no-op when nothing changed
    fn build(&self) -> PerceptResult<()>;

    fn is_built(&self) -> bool;

    /// Grid the model predicts on (available once built)
    fn grid(&self) -> PerceptResult<RetinalGrid>;

    /// Predict the percept for one stimulus frame
    fn predict_frame(&self, implant: &Implant, frame: &StimulusFrame) -> PerceptResult<BrightnessMap>;
}

/// Configuration plus the value built from it
pub struct ModelState<P, T> {
    config: Mutex<P>,
    built: RwLock<Option<Arc<T>>>,
}

impl<P, T> ModelState<P, T>
where
    P: Fingerprint + Clone,
    T: Fingerprint,
{
    pub fn new(config: P) -> Self {
        Self {
            config: Mutex::new(config),
            built: RwLock::new(None),
        }
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> P {
        self.config.lock().clone()
    }

    pub fn current(&self) -> Option<Arc<T>> {
        self.built.read().clone()
    }

    /// Built value, or `NotBuilt` naming the model
    pub fn require(&self, model: &str) -> PerceptResult<Arc<T>> {
        self.current().ok_or_else(|| {
            PerceptError::NotBuilt(format!("{}: you must call `build` first", model))
        })
    }

    /// Build from the current configuration unless the cached value matches it
    pub fn build_with<F>(&self, model: &str, build: F) -> PerceptResult<Arc<T>>
    where
        F: FnOnce(&P) -> PerceptResult<T>,
    {
        let config = self.config.lock();
        let fingerprint = config.fingerprint();
        if let Some(existing) = self.current() {
            if existing.fingerprint() == fingerprint {
                debug!(
                    target: "phosphene-models",
                    "{}: configuration {:016x} already built",
                    model,
                    fingerprint
                );
                return Ok(existing);
            }
        }
        let built = Arc::new(build(&*config)?);
        *self.built.write() = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Replace the configuration; drops the built value when it no longer matches
    ///
    /// Returns true if the model went back to unbuilt.
    pub fn reconfigure(&self, new_config: P) -> bool {
        let mut config = self.config.lock();
        let fingerprint = new_config.fingerprint();
        *config = new_config;
        let mut built = self.built.write();
        let stale = built
            .as_ref()
            .map(|b| b.fingerprint() != fingerprint)
            .unwrap_or(false);
        if stale {
            *built = None;
        }
        stale
    }
}

/// Zero out values at or below the perception threshold
#[inline]
pub fn apply_threshold(value: f64, thresh_percept: f64) -> f64 {
    if value > thresh_percept {
        value
    } else {
        0.0
    }
}

/// Evaluate `f` for every flat grid index, in order
pub fn evaluate_grid<R, F>(len: usize, engine: Engine, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    match engine {
        #[cfg(feature = "parallel")]
        Engine::Rayon => (0..len).into_par_iter().map(f).collect(),
        _ => (0..len).map(f).collect(),
    }
}

/// Run `f` over independent items, keeping input order
pub fn map_frames<I, R, F>(items: &[I], engine: Engine, f: F) -> PerceptResult<Vec<R>>
where
    I: Sync,
    R: Send,
    F: Fn(&I) -> PerceptResult<R> + Sync + Send,
{
    match engine {
        #[cfg(feature = "parallel")]
        Engine::Rayon => items.par_iter().map(f).collect(),
        _ => items.iter().map(f).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Cfg(u64);

    impl Fingerprint for Cfg {
        fn fingerprint(&self) -> u64 {
            self.0
        }
    }

    struct Built {
        fp: u64,
    }

    impl Fingerprint for Built {
        fn fingerprint(&self) -> u64 {
            self.fp
        }
    }

    #[test]
    fn test_require_before_build_fails() {
        let state: ModelState<Cfg, Built> = ModelState::new(Cfg(1));
        assert!(matches!(state.require("m"), Err(PerceptError::NotBuilt(_))));
    }

    #[test]
    fn test_build_is_idempotent() {
        let state: ModelState<Cfg, Built> = ModelState::new(Cfg(7));
        let mut calls = 0;
        let a = state
            .build_with("m", |c| {
                calls += 1;
                Ok(Built { fp: c.0 })
            })
            .unwrap();
        let b = state
            .build_with("m", |c| {
                calls += 1;
                Ok(Built { fp: c.0 })
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_reconfigure_invalidates_only_on_change() {
        let state: ModelState<Cfg, Built> = ModelState::new(Cfg(7));
        state.build_with("m", |c| Ok(Built { fp: c.0 })).unwrap();
        assert!(!state.reconfigure(Cfg(7)));
        assert!(state.current().is_some());
        assert!(state.reconfigure(Cfg(8)));
        assert!(state.current().is_none());
    }

    #[test]
    fn test_failed_build_leaves_unbuilt() {
        let state: ModelState<Cfg, Built> = ModelState::new(Cfg(1));
        let res = state.build_with("m", |_| Err(PerceptError::invalid("n_axons must be positive")));
        assert!(res.is_err());
        assert!(state.current().is_none());
    }

    #[test]
    fn test_threshold() {
        assert_eq!(apply_threshold(0.5, 0.1), 0.5);
        assert_eq!(apply_threshold(0.1, 0.1), 0.0);
        assert_eq!(apply_threshold(-0.3, 0.0), 0.0);
    }

    #[test]
    fn test_engines_agree() {
        let serial = evaluate_grid(100, Engine::Serial, |i| (i as f64).sqrt());
        let parallel = evaluate_grid(100, Engine::Rayon, |i| (i as f64).sqrt());
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_engine_parsing() {
        assert_eq!("serial".parse::<Engine>().unwrap(), Engine::Serial);
        assert_eq!("Rayon".parse::<Engine>().unwrap(), Engine::Rayon);
        assert!("dask".parse::<Engine>().is_err());
    }
}
