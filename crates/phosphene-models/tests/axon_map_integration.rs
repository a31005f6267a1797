// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the axon map model
//!
//! These exercise full builds on realistic bundle counts, so they are slower
//! than the unit tests next to the code.

use std::sync::Arc;

use phosphene_models::axon_map::bundles::is_mirror_of;
use phosphene_models::axon_map::current_spread;
use phosphene_models::{AxonMapModel, AxonMapParams, BuiltAxonMap, Engine};
use phosphene_structures::{
    Electrode, Eye, GridSpec, Implant, PerceptError, RetinalPoint, StimulusFrame,
};

fn compact_params(eye: Eye) -> AxonMapParams {
    AxonMapParams {
        eye,
        n_axons: 100,
        n_ax_segments: 300,
        grid: GridSpec {
            xrange: (-5.0, 5.0),
            yrange: (-4.0, 4.0),
            xystep: 0.5,
        },
        ..Default::default()
    }
}

fn single(x: f64, y: f64, eye: Eye) -> Implant {
    Implant::single("A1", Electrode::new(x, y, 0.0, 100.0).unwrap(), eye).unwrap()
}

#[test]
fn test_left_eye_bundles_mirror_right_eye() {
    let right = BuiltAxonMap::build(&compact_params(Eye::Right)).unwrap();
    let left = BuiltAxonMap::build(&compact_params(Eye::Left)).unwrap();
    assert!(is_mirror_of(left.bundles(), right.bundles()));
}

#[test]
fn test_left_eye_percept_mirrors_right_eye() {
    let right = BuiltAxonMap::build(&compact_params(Eye::Right)).unwrap();
    let left = BuiltAxonMap::build(&compact_params(Eye::Left)).unwrap();
    let frame = StimulusFrame::from_pairs([("A1", 1.0)]);
    let r = right
        .predict_frame(&single(400.0, 150.0, Eye::Right), &frame)
        .unwrap();
    let l = left
        .predict_frame(&single(-400.0, 150.0, Eye::Left), &frame)
        .unwrap();
    let (rows, cols) = r.shape();
    for row in 0..rows {
        for col in 0..cols {
            let a = r.get(row, col).unwrap();
            let b = l.get(row, cols - 1 - col).unwrap();
            assert!((a - b).abs() < 1e-12, "({}, {}): {} vs {}", row, col, a, b);
        }
    }
}

#[test]
fn test_not_built_and_zero_axons() {
    let model = AxonMapModel::new(compact_params(Eye::Right));
    let frame = StimulusFrame::from_pairs([("A1", 1.0)]);
    assert!(matches!(
        model.predict_frame(&single(0.0, 0.0, Eye::Right), &frame),
        Err(PerceptError::NotBuilt(_))
    ));

    let broken = AxonMapModel::new(AxonMapParams {
        n_axons: 0,
        ..compact_params(Eye::Right)
    });
    assert!(matches!(broken.build(), Err(PerceptError::InvalidParameter(_))));
    assert!(!broken.is_built());
}

#[test]
fn test_silent_stimulus_gives_zero_map() {
    let model = AxonMapModel::new(compact_params(Eye::Right));
    model.build().unwrap();
    let implant = single(0.0, 0.0, Eye::Right);
    let map = model
        .predict_frame(&implant, &StimulusFrame::uniform(&implant, 0.0))
        .unwrap();
    assert!(map.is_all_zero());
    assert_eq!(map.shape(), (17, 21));
    let map = model.predict_frame(&implant, &StimulusFrame::new()).unwrap();
    assert!(map.is_all_zero());
}

#[test]
fn test_predictions_are_deterministic() {
    let mut implant = Implant::new(Eye::Right);
    implant
        .add_electrode("A1", Electrode::new(-300.0, 200.0, 0.0, 100.0).unwrap())
        .unwrap();
    implant
        .add_electrode("A2", Electrode::new(500.0, -400.0, 0.0, 100.0).unwrap())
        .unwrap();
    let frame = StimulusFrame::from_pairs([("A1", 1.0), ("A2", 0.7)]);

    let first = AxonMapModel::new(compact_params(Eye::Right));
    first.build().unwrap();
    let second = AxonMapModel::new(AxonMapParams {
        engine: Engine::Serial,
        ..compact_params(Eye::Right)
    });
    second.build().unwrap();

    let a = first.predict_frame(&implant, &frame).unwrap();
    let b = first.predict_frame(&implant, &frame).unwrap();
    let c = second.predict_frame(&implant, &frame).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.data(), c.data());
}

#[test]
fn test_end_to_end_single_electrode() {
    let params = AxonMapParams {
        loc_od: phosphene_structures::OpticDisc::new(15.5, 1.5).unwrap(),
        eye: Eye::Right,
        n_axons: 100,
        ..Default::default()
    };
    let rho = params.rho;
    assert_eq!(rho, params.axlambda);
    let model = AxonMapModel::new(params);
    let built = model.build().unwrap();

    let frame = StimulusFrame::from_pairs([("A1", 1.0)]);
    let map = model
        .predict_frame(&single(0.0, 0.0, Eye::Right), &frame)
        .unwrap();

    // Peak sits on the electrode, which the default grid samples exactly
    assert_eq!(map.shape(), (121, 161));
    assert_eq!(map.argmax(), Some((60, 80)));
    assert!((map.max() - 1.0).abs() < 1e-12);

    // With rho == axlambda every value lies between the soma term and a
    // Gaussian twice as wide, so brightness decays with distance
    let grid = built.grid();
    let electrode = RetinalPoint::new(0.0, 0.0);
    for row in 0..121 {
        for col in 0..161 {
            let d = grid.point(row, col).distance(&electrode);
            let v = map.get(row, col).unwrap();
            let lower = current_spread(d, rho);
            let upper = (-(d * d) / (4.0 * rho * rho)).exp();
            assert!(v >= lower - 1e-12, "({}, {}) below soma term", row, col);
            assert!(v <= upper + 1e-12, "({}, {}) above envelope", row, col);
        }
    }

    // Bundles come back in retinal microns and start at the optic disc
    let bundles = model.bundles().unwrap();
    assert_eq!(bundles.len(), 100);
    let disc = phosphene_structures::dva2ret(15.5, 1.5).unwrap();
    assert!(bundles[0][0].distance(&RetinalPoint::from(disc)) < 1e-9);
}

#[test]
fn test_shared_build_across_threads() {
    let model = Arc::new(AxonMapModel::new(compact_params(Eye::Right)));
    let built = model.build().unwrap();
    let implant = single(250.0, -100.0, Eye::Right);
    let frame = StimulusFrame::from_pairs([("A1", 2.0)]);
    let expected = built.predict_frame(&implant, &frame).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let model = Arc::clone(&model);
                let implant = &implant;
                let frame = &frame;
                s.spawn(move || {
                    model.build().unwrap();
                    model.predict_frame(implant, frame).unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_predict_frames_keeps_order() {
    let model = AxonMapModel::new(compact_params(Eye::Right));
    model.build().unwrap();
    let implant = single(0.0, 0.0, Eye::Right);
    let frames: Vec<StimulusFrame> = [0.0, 1.0, 0.5, 2.0]
        .iter()
        .map(|&a| StimulusFrame::uniform(&implant, a))
        .collect();
    let maps = model.predict_frames(&implant, &frames).unwrap();
    assert_eq!(maps.len(), 4);
    assert!(maps[0].is_all_zero());
    for (map, amp) in maps.iter().zip([0.0, 1.0, 0.5, 2.0]) {
        assert!((map.max() - amp).abs() < 1e-12);
    }
}

#[test]
fn test_index_agrees_with_brute_force_on_real_bundles() {
    let built = BuiltAxonMap::build(&compact_params(Eye::Right)).unwrap();
    let index = built.index();
    for x in (-6000..6000).step_by(410) {
        for y in (-5000..5000).step_by(370) {
            let q = RetinalPoint::new(x as f64, y as f64);
            assert_eq!(index.nearest_vertex(&q), index.nearest_vertex_brute_force(&q));
        }
    }
}
