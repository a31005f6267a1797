// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Current spread, axonal sensitivity and the axon path of a retinal location.

use phosphene_structures::RetinalPoint;

use super::index::BundleIndex;

/// Gaussian current spread at `distance` µm from an electrode center
#[inline]
pub fn current_spread(distance: f64, rho: f64) -> f64 {
    (-(distance * distance) / (2.0 * rho * rho)).exp().clamp(0.0, 1.0)
}

/// Gaussian sensitivity of an axon segment `arc` µm from the soma
#[inline]
pub fn axonal_sensitivity(arc: f64, axlambda: f64) -> f64 {
    (-(arc * arc) / (2.0 * axlambda * axlambda)).exp().clamp(0.0, 1.0)
}

/// One sampled location along an axon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxonSegment {
    pub pos: RetinalPoint,
    /// Arc length from the soma (µm)
    pub arc: f64,
    pub sensitivity: f64,
}

/// Axon of one retinal location: the soma, the foot point on its nearest
/// bundle, then bundle vertices back toward the optic disc
#[derive(Debug, Clone, PartialEq)]
pub struct AxonPath {
    segments: Vec<AxonSegment>,
}

impl AxonPath {
    /// Trace the axon leaving `soma`, keeping segments with arc length at
    /// most `max_arc`
    pub fn trace(index: &BundleIndex, soma: RetinalPoint, axlambda: f64, max_arc: f64) -> Self {
        let mut segments = vec![AxonSegment {
            pos: soma,
            arc: 0.0,
            sensitivity: 1.0,
        }];

        let hit = index.nearest(&soma);
        let mut arc = hit.distance;
        if arc > max_arc {
            return Self { segments };
        }
        if arc > 0.0 {
            segments.push(AxonSegment {
                pos: hit.foot,
                arc,
                sensitivity: axonal_sensitivity(arc, axlambda),
            });
        }

        let mut prev = hit.foot;
        let points = index.bundle_points(hit.bundle);
        for vertex in points[..=hit.offset.min(points.len().saturating_sub(1))].iter().rev() {
            let step = prev.distance(&vertex.pos);
            if step == 0.0 {
                continue;
            }
            arc += step;
            if arc > max_arc {
                break;
            }
            segments.push(AxonSegment {
                pos: vertex.pos,
                arc,
                sensitivity: axonal_sensitivity(arc, axlambda),
            });
            prev = vertex.pos;
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[AxonSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn soma(&self) -> RetinalPoint {
        self.segments[0].pos
    }

    /// Largest `sensitivity * spread` over the path for one electrode, in [0, 1]
    pub fn weight(&self, electrode: &RetinalPoint, rho: f64) -> f64 {
        self.segments
            .iter()
            .map(|s| s.sensitivity * current_spread(s.pos.distance(electrode), rho))
            .fold(0.0, f64::max)
    }

    /// `sensitivity * sum_e amp_e * spread_e` with the largest magnitude along
    /// the path (sign kept; first segment wins ties)
    pub fn joint_activation(&self, electrodes: &[(RetinalPoint, f64)], rho: f64) -> f64 {
        let mut best = 0.0f64;
        for s in &self.segments {
            let drive: f64 = electrodes
                .iter()
                .map(|(pos, amp)| amp * current_spread(s.pos.distance(pos), rho))
                .sum();
            let act = s.sensitivity * drive;
            if act.abs() > best.abs() {
                best = act;
            }
        }
        best
    }
}

/// Weight of an electrode on a retinal location, tracing the axon on demand
pub fn weight(
    index: &BundleIndex,
    point: RetinalPoint,
    electrode: RetinalPoint,
    axlambda: f64,
    rho: f64,
    min_ax_sensitivity: f64,
) -> f64 {
    let max_arc = axlambda * (-2.0 * min_ax_sensitivity.ln()).sqrt();
    AxonPath::trace(index, point, axlambda, max_arc).weight(&electrode, rho)
}
