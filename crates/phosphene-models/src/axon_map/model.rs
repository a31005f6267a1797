// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Axon map model: build once, predict many times.

`BuiltAxonMap` owns everything derived from a parameter set (bundles, the
bundle index, the grid and one traced axon per grid point) and is shared
through an `Arc`. `AxonMapModel` wraps it with the configure/build lifecycle.
*/

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use phosphene_structures::{
    BrightnessMap, Electrode, Implant, PerceptError, PerceptResult, RetinalGrid, RetinalPoint,
    StimulusFrame,
};

use super::bundles::{grow_bundles, Bundle};
use super::index::BundleIndex;
use super::params::{AxonCombine, AxonMapParams};
use super::sensitivity::AxonPath;
use crate::base::{apply_threshold, evaluate_grid, map_frames, Fingerprint, ModelState, SpatialModel};

const MODEL_NAME: &str = "AxonMapModel";

/// Immutable state derived from one set of axon map parameters
#[derive(Debug)]
pub struct BuiltAxonMap {
    params: AxonMapParams,
    fingerprint: u64,
    bundles: Vec<Bundle>,
    index: BundleIndex,
    grid: RetinalGrid,
    paths: Vec<AxonPath>,
}

impl BuiltAxonMap {
    /// Grow bundles, index them and trace the axon of every grid point
    pub fn build(params: &AxonMapParams) -> PerceptResult<Self> {
        params.validate()?;
        let start = Instant::now();
        let fingerprint = params.fingerprint();
        info!(
            target: "phosphene-models",
            "🧵 Building axon map {:016x}: {} axons x {} segments, eye {}",
            fingerprint,
            params.n_axons,
            params.n_ax_segments,
            params.eye
        );

        let bundles = grow_bundles(params)?;
        let index = BundleIndex::new(&bundles, params.index_cell_size)?;
        let grid = RetinalGrid::new(params.grid)?;

        let max_arc = params.max_arc_length();
        let paths = evaluate_grid(grid.len(), params.engine, |i| {
            AxonPath::trace(&index, grid.point_at(i), params.axlambda, max_arc)
        });

        let stats = index.get_stats();
        info!(
            target: "phosphene-models",
            "✅ Axon map built in {:.1} ms: {} bundles, {} points in {} cells, {} grid points",
            start.elapsed().as_secs_f64() * 1000.0,
            stats.total_bundles,
            stats.total_points,
            stats.occupied_cells,
            paths.len()
        );

        Ok(Self {
            params: params.clone(),
            fingerprint,
            bundles,
            index,
            grid,
            paths,
        })
    }

    pub fn params(&self) -> &AxonMapParams {
        &self.params
    }

    pub fn index(&self) -> &BundleIndex {
        &self.index
    }

    pub fn grid(&self) -> &RetinalGrid {
        &self.grid
    }

    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    /// Axon of an arbitrary retinal location
    pub fn trace_axon(&self, point: RetinalPoint) -> AxonPath {
        AxonPath::trace(
            &self.index,
            point,
            self.params.axlambda,
            self.params.max_arc_length(),
        )
    }

    /// Weight of one electrode on one retinal location, in [0, 1]
    pub fn weight(&self, point: RetinalPoint, electrode: &Electrode) -> f64 {
        self.trace_axon(point)
            .weight(&electrode.position(), self.params.rho)
    }

    /// Brightness over the model grid for one stimulus frame
    pub fn predict_frame(&self, implant: &Implant, frame: &StimulusFrame) -> PerceptResult<BrightnessMap> {
        let active = self.active_electrodes(implant, frame)?;
        let (rows, cols) = self.grid.shape();
        if active.is_empty() {
            return Ok(BrightnessMap::zeros((rows, cols), *self.grid.spec()));
        }
        let values = evaluate_grid(self.paths.len(), self.params.engine, |i| {
            self.brightness(&self.paths[i], &active)
        });
        debug!(
            target: "phosphene-models",
            "Predicted {} grid points from {} active electrodes",
            values.len(),
            active.len()
        );
        BrightnessMap::from_flat(values, (rows, cols), *self.grid.spec())
    }

    /// Brightness over another grid; axons are traced on the fly unless the
    /// grid matches the cached one
    pub fn predict_on_grid(
        &self,
        implant: &Implant,
        frame: &StimulusFrame,
        grid: &RetinalGrid,
    ) -> PerceptResult<BrightnessMap> {
        if grid.spec() == self.grid.spec() {
            return self.predict_frame(implant, frame);
        }
        let active = self.active_electrodes(implant, frame)?;
        let shape = grid.shape();
        if active.is_empty() {
            return Ok(BrightnessMap::zeros(shape, *grid.spec()));
        }
        let values = evaluate_grid(grid.len(), self.params.engine, |i| {
            self.brightness(&self.trace_axon(grid.point_at(i)), &active)
        });
        BrightnessMap::from_flat(values, shape, *grid.spec())
    }

    /// Independent frames, in input order
    pub fn predict_frames(
        &self,
        implant: &Implant,
        frames: &[StimulusFrame],
    ) -> PerceptResult<Vec<BrightnessMap>> {
        map_frames(frames, self.params.engine, |frame| {
            self.predict_frame(implant, frame)
        })
    }

    /// Validated (position, amplitude) of every driven electrode, implant order
    fn active_electrodes(
        &self,
        implant: &Implant,
        frame: &StimulusFrame,
    ) -> PerceptResult<Vec<(RetinalPoint, f64)>> {
        if implant.eye() != self.params.eye {
            return Err(PerceptError::IncompatibleInput(format!(
                "implant is in eye {} but the axon map was built for eye {}",
                implant.eye(),
                self.params.eye
            )));
        }
        frame.validate_for(implant)?;
        let electrodes: Vec<RetinalPoint> = implant.iter().map(|(_, e)| e.position()).collect();
        Ok(frame
            .active_in(implant)
            .map(|(i, amp)| (electrodes[i], amp))
            .collect())
    }

    fn brightness(&self, path: &AxonPath, active: &[(RetinalPoint, f64)]) -> f64 {
        let rho = self.params.rho;
        let value = match self.params.combine {
            AxonCombine::Summed => active
                .iter()
                .map(|(pos, amp)| amp * path.weight(pos, rho))
                .sum(),
            AxonCombine::Joint => path.joint_activation(active, rho),
        };
        apply_threshold(value, self.params.thresh_percept)
    }
}

impl Fingerprint for BuiltAxonMap {
    fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Axon map model with a cached build (Beyeler et al. 2019)
///
/// ```no_run
/// use phosphene_models::{AxonMapModel, AxonMapParams};
/// use phosphene_structures::{Electrode, Eye, Implant, StimulusFrame};
///
/// let model = AxonMapModel::new(AxonMapParams::default());
/// model.build()?;
/// let implant = Implant::single("A1", Electrode::new(0.0, 0.0, 0.0, 100.0)?, Eye::Right)?;
/// let frame = StimulusFrame::from_pairs([("A1", 1.0)]);
/// let percept = model.predict_frame(&implant, &frame)?;
/// println!("peak brightness {}", percept.max());
/// # Ok::<(), phosphene_structures::PerceptError>(())
/// ```
pub struct AxonMapModel {
    state: ModelState<AxonMapParams, BuiltAxonMap>,
}

impl AxonMapModel {
    pub fn new(params: AxonMapParams) -> Self {
        Self {
            state: ModelState::new(params),
        }
    }

    pub fn params(&self) -> AxonMapParams {
        self.state.config()
    }

    /// Swap parameters; returns true if the built state was dropped
    pub fn reconfigure(&self, params: AxonMapParams) -> bool {
        let dropped = self.state.reconfigure(params);
        if dropped {
            debug!(target: "phosphene-models", "{}: parameters changed, build invalidated", MODEL_NAME);
        }
        dropped
    }

    /// Build (or reuse) the axon map for the current parameters
    pub fn build(&self) -> PerceptResult<Arc<BuiltAxonMap>> {
        self.state.build_with(MODEL_NAME, BuiltAxonMap::build)
    }

    /// Current built state, `NotBuilt` before a successful build
    pub fn built(&self) -> PerceptResult<Arc<BuiltAxonMap>> {
        self.state.require(MODEL_NAME)
    }

    pub fn is_built(&self) -> bool {
        self.state.current().is_some()
    }

    pub fn predict_frame(&self, implant: &Implant, frame: &StimulusFrame) -> PerceptResult<BrightnessMap> {
        self.built()?.predict_frame(implant, frame)
    }

    pub fn predict_frames(
        &self,
        implant: &Implant,
        frames: &[StimulusFrame],
    ) -> PerceptResult<Vec<BrightnessMap>> {
        self.built()?.predict_frames(implant, frames)
    }

    /// Bundle polylines of the current build (retinal µm)
    pub fn bundles(&self) -> PerceptResult<Vec<Vec<RetinalPoint>>> {
        Ok(self
            .built()?
            .bundles()
            .iter()
            .map(|b| b.points.clone())
            .collect())
    }
}

impl Default for AxonMapModel {
    fn default() -> Self {
        Self::new(AxonMapParams::default())
    }
}

impl SpatialModel for AxonMapModel {
    fn name(&self) -> &'static str {
        MODEL_NAME
    }

    fn build(&self) -> PerceptResult<()> {
        AxonMapModel::build(self).map(|_| ())
    }

    fn is_built(&self) -> bool {
        AxonMapModel::is_built(self)
    }

    fn grid(&self) -> PerceptResult<RetinalGrid> {
        Ok(self.built()?.grid().clone())
    }

    fn predict_frame(&self, implant: &Implant, frame: &StimulusFrame) -> PerceptResult<BrightnessMap> {
        AxonMapModel::predict_frame(self, implant, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phosphene_structures::{Eye, GridSpec};

    fn small_params() -> AxonMapParams {
        AxonMapParams {
            n_axons: 60,
            n_ax_segments: 200,
            grid: GridSpec {
                xrange: (-4.0, 4.0),
                yrange: (-3.0, 3.0),
                xystep: 0.5,
            },
            ..Default::default()
        }
    }

    fn implant_at(x: f64, y: f64, eye: Eye) -> Implant {
        Implant::single("A1", Electrode::new(x, y, 0.0, 100.0).unwrap(), eye).unwrap()
    }

    #[test]
    fn test_predict_before_build() {
        let model = AxonMapModel::new(small_params());
        let frame = StimulusFrame::from_pairs([("A1", 1.0)]);
        let res = model.predict_frame(&implant_at(0.0, 0.0, Eye::Right), &frame);
        assert!(matches!(res, Err(PerceptError::NotBuilt(_))));
        assert!(matches!(model.bundles(), Err(PerceptError::NotBuilt(_))));
    }

    #[test]
    fn test_build_is_cached_until_reconfigured() {
        let model = AxonMapModel::new(small_params());
        let a = model.build().unwrap();
        let b = model.build().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        assert!(!model.reconfigure(small_params()));
        assert!(model.is_built());

        assert!(model.reconfigure(AxonMapParams {
            rho: 150.0,
            ..small_params()
        }));
        assert!(!model.is_built());
        let c = model.build().unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.params().rho, 150.0);
    }

    #[test]
    fn test_eye_mismatch_rejected() {
        let model = AxonMapModel::new(small_params());
        model.build().unwrap();
        let frame = StimulusFrame::from_pairs([("A1", 1.0)]);
        let res = model.predict_frame(&implant_at(0.0, 0.0, Eye::Left), &frame);
        assert!(matches!(res, Err(PerceptError::IncompatibleInput(_))));
    }

    #[test]
    fn test_unknown_electrode_and_bad_amplitude() {
        let model = AxonMapModel::new(small_params());
        model.build().unwrap();
        let implant = implant_at(0.0, 0.0, Eye::Right);
        let res = model.predict_frame(&implant, &StimulusFrame::from_pairs([("B7", 1.0)]));
        assert!(matches!(res, Err(PerceptError::IncompatibleInput(_))));
        let res = model.predict_frame(&implant, &StimulusFrame::from_pairs([("A1", f64::NAN)]));
        assert!(matches!(res, Err(PerceptError::InvalidParameter(_))));
    }

    #[test]
    fn test_joint_equals_summed_for_one_electrode() {
        let implant = implant_at(300.0, -200.0, Eye::Right);
        let frame = StimulusFrame::from_pairs([("A1", 1.5)]);
        let summed = BuiltAxonMap::build(&small_params()).unwrap();
        let joint = BuiltAxonMap::build(&AxonMapParams {
            combine: AxonCombine::Joint,
            ..small_params()
        })
        .unwrap();
        let a = summed.predict_frame(&implant, &frame).unwrap();
        let b = joint.predict_frame(&implant, &frame).unwrap();
        for (x, y) in a.data().iter().zip(b.data().iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_threshold_zeroes_dim_points() {
        let implant = implant_at(0.0, 0.0, Eye::Right);
        let frame = StimulusFrame::from_pairs([("A1", 1.0)]);
        let built = BuiltAxonMap::build(&AxonMapParams {
            thresh_percept: 0.5,
            ..small_params()
        })
        .unwrap();
        let map = built.predict_frame(&implant, &frame).unwrap();
        assert!(map.data().iter().all(|&v| v == 0.0 || v > 0.5));
        assert!(map.max() > 0.5);
    }

    #[test]
    fn test_predict_on_other_grid_matches_cached_points() {
        let built = BuiltAxonMap::build(&small_params()).unwrap();
        let implant = implant_at(200.0, 100.0, Eye::Right);
        let frame = StimulusFrame::from_pairs([("A1", 1.0)]);
        let coarse = RetinalGrid::new(GridSpec {
            xrange: (-4.0, 4.0),
            yrange: (-3.0, 3.0),
            xystep: 1.0,
        })
        .unwrap();
        let fine = built.predict_frame(&implant, &frame).unwrap();
        let other = built.predict_on_grid(&implant, &frame, &coarse).unwrap();
        assert_eq!(other.shape(), (7, 9));
        // Every coarse point is also a fine point
        for r in 0..7 {
            for c in 0..9 {
                assert_eq!(other.get(r, c), fine.get(2 * r, 2 * c));
            }
        }
    }

    #[test]
    fn test_trait_object() {
        let model: Box<dyn SpatialModel> = Box::new(AxonMapModel::new(small_params()));
        assert!(!model.is_built());
        assert!(model.grid().is_err());
        model.build().unwrap();
        assert_eq!(model.grid().unwrap().shape(), (13, 17));
        assert_eq!(model.name(), "AxonMapModel");
    }
}
