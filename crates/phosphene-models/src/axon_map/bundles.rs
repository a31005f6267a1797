// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Nerve fiber bundle growth (Jansonius et al. 2009).

Every bundle is a spiral leaving the optic disc at angle `phi0`:

```text
phi(rho) = phi0 + b * max(rho - 4, 0)^c
```

with `b` and `c` depending on `phi0` and the hemisphere. Traces are grown in
the right-eye frame (disc at `+x`) and mirrored for a left eye before being
converted to retinal microns.
*/

use tracing::{debug, warn};

use phosphene_structures::{dva2ret, PerceptError, PerceptResult, RetinalPoint};

use super::params::AxonMapParams;

/// Half of the retina a bundle runs through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    Superior,
    Inferior,
}

/// One traced nerve fiber bundle, ordered from the optic disc outward
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub id: usize,
    /// Starting angle at the disc (degrees)
    pub phi0: f64,
    pub hemisphere: Hemisphere,
    /// Retinal locations (µm)
    pub points: Vec<RetinalPoint>,
}

impl Bundle {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cumulative arc length (µm) at every point, starting at 0
    pub fn arc_lengths(&self) -> Vec<f64> {
        let mut arc = Vec::with_capacity(self.points.len());
        let mut total = 0.0;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                total += self.points[i - 1].distance(p);
            }
            arc.push(total);
        }
        arc
    }

    /// Total length (µm)
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// Starting angles: `ceil(n/2)` superior angles then `floor(n/2)` inferior ones
pub fn starting_angles(n_axons: usize) -> Vec<(f64, Hemisphere)> {
    let n_sup = n_axons.div_ceil(2);
    let n_inf = n_axons / 2;
    let mut angles = Vec::with_capacity(n_axons);
    for k in 0..n_sup {
        angles.push((180.0 * (k as f64 + 0.5) / n_sup as f64, Hemisphere::Superior));
    }
    for k in 0..n_inf {
        angles.push((-180.0 * (k as f64 + 0.5) / n_inf as f64, Hemisphere::Inferior));
    }
    angles
}

/// Spiral coefficients `(b, c)` for a starting angle
fn spiral_coefficients(phi0: f64, hemisphere: Hemisphere, beta_sup: f64, beta_inf: f64) -> (f64, f64) {
    match hemisphere {
        Hemisphere::Superior => {
            let b = (beta_sup + 3.9 * (-(phi0 - 121.0) / 14.0).tanh()).exp();
            let c = 1.9 + 1.4 * ((phi0 - 121.0) / 14.0).tanh();
            (b, c)
        }
        Hemisphere::Inferior => {
            let b = -(beta_inf + 1.5 * (-(-phi0 - 90.0) / 25.0).tanh()).exp();
            let c = 1.0 + 0.5 * ((-phi0 - 90.0) / 25.0).tanh();
            (b, c)
        }
    }
}

/// Radial sample positions (dva from the disc)
fn radial_samples(range: (f64, f64), n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![range.0];
    }
    let step = (range.1 - range.0) / (n - 1) as f64;
    (0..n).map(|i| range.0 + i as f64 * step).collect()
}

/// Trace one bundle in the right-eye frame (dva)
///
/// Stops at the horizontal raphe and wherever the distance from the disc
/// stops growing.
pub fn jansonius_trace(
    phi0: f64,
    hemisphere: Hemisphere,
    od: (f64, f64),
    rho: &[f64],
    beta_sup: f64,
    beta_inf: f64,
) -> Vec<(f64, f64)> {
    let (b, c) = spiral_coefficients(phi0, hemisphere, beta_sup, beta_inf);
    let (od_x, od_y) = od;
    let mut trace = Vec::with_capacity(rho.len());
    let mut last_dist: Option<f64> = None;

    for &r in rho {
        let phi = (phi0 + b * (r - 4.0).max(0.0).powf(c)).to_radians();
        let x = r * phi.cos() + od_x;
        let mut y = r * phi.sin();
        if x > 0.0 {
            y += od_y * (x / od_x).powi(2);
        }

        let crosses_raphe = match hemisphere {
            Hemisphere::Superior => x < 0.0 && y < 0.0,
            Hemisphere::Inferior => x < 0.0 && y > 0.0,
        };
        if crosses_raphe {
            break;
        }

        let dist = ((x - od_x).powi(2) + (y - od_y).powi(2)).sqrt();
        if let Some(prev) = last_dist {
            if dist <= prev {
                break;
            }
        }
        last_dist = Some(dist);
        trace.push((x, y));
    }
    trace
}

/// Grow all bundles for a configuration, in retinal microns
///
/// Bundle ids follow the starting-angle order (superior first). Empty traces
/// are dropped and the remaining bundles renumbered.
pub fn grow_bundles(params: &AxonMapParams) -> PerceptResult<Vec<Bundle>> {
    params.validate()?;
    let od = (params.loc_od.x, params.loc_od.y);
    let rho = radial_samples(params.ax_segments_range, params.n_ax_segments);
    let sign = params.eye.x_sign();

    let mut bundles = Vec::with_capacity(params.n_axons);
    let mut dropped = 0usize;
    for (phi0, hemisphere) in starting_angles(params.n_axons) {
        let trace = jansonius_trace(phi0, hemisphere, od, &rho, params.beta_sup, params.beta_inf);
        if trace.is_empty() {
            dropped += 1;
            continue;
        }
        let points = trace
            .into_iter()
            .map(|(x, y)| dva2ret(sign * x, y).map(RetinalPoint::from))
            .collect::<PerceptResult<Vec<_>>>()?;
        bundles.push(Bundle {
            id: bundles.len(),
            phi0,
            hemisphere,
            points,
        });
    }

    if dropped > 0 {
        warn!(
            target: "phosphene-models",
            "Dropped {} empty nerve fiber bundles out of {}",
            dropped,
            params.n_axons
        );
    }
    if bundles.is_empty() {
        return Err(PerceptError::InvalidParameter(format!(
            "no nerve fiber bundle survived growth (n_axons={}, ax_segments_range={:?})",
            params.n_axons, params.ax_segments_range
        )));
    }

    debug!(
        target: "phosphene-models",
        "Grew {} bundles ({} points) for eye {}",
        bundles.len(),
        bundles.iter().map(Bundle::len).sum::<usize>(),
        params.eye
    );
    Ok(bundles)
}

/// Whether the left-eye bundles are the x-mirror of the right-eye ones
pub fn is_mirror_of(left: &[Bundle], right: &[Bundle]) -> bool {
    left.len() == right.len()
        && left.iter().zip(right).all(|(l, r)| {
            l.points.len() == r.points.len()
                && l.points
                    .iter()
                    .zip(&r.points)
                    .all(|(a, b)| *a == b.mirrored_x())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use phosphene_structures::Eye;

    fn small_params() -> AxonMapParams {
        AxonMapParams {
            n_axons: 20,
            n_ax_segments: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_starting_angles() {
        let angles = starting_angles(5);
        assert_eq!(angles.len(), 5);
        assert_eq!(angles[0], (30.0, Hemisphere::Superior));
        assert_eq!(angles[2], (150.0, Hemisphere::Superior));
        assert_eq!(angles[3], (-45.0, Hemisphere::Inferior));
        assert_eq!(angles[4], (-135.0, Hemisphere::Inferior));

        let one = starting_angles(1);
        assert_eq!(one, vec![(90.0, Hemisphere::Superior)]);
    }

    #[test]
    fn test_trace_starts_at_disc() {
        let rho = radial_samples((0.0, 45.0), 100);
        let trace = jansonius_trace(60.0, Hemisphere::Superior, (15.5, 1.5), &rho, -1.9, 0.5);
        assert!(!trace.is_empty());
        assert_eq!(trace[0], (15.5, 1.5));
    }

    #[test]
    fn test_traces_never_cross_raphe() {
        let bundles = grow_bundles(&small_params()).unwrap();
        for b in &bundles {
            for p in &b.points {
                match b.hemisphere {
                    Hemisphere::Superior => assert!(!(p.x < 0.0 && p.y < 0.0)),
                    Hemisphere::Inferior => assert!(!(p.x < 0.0 && p.y > 0.0)),
                }
            }
        }
    }

    #[test]
    fn test_distance_from_disc_increases() {
        let od = (15.5, 1.5);
        let rho = radial_samples((0.0, 45.0), 300);
        for (phi0, hemisphere) in starting_angles(40) {
            let trace = jansonius_trace(phi0, hemisphere, od, &rho, -1.9, 0.5);
            let d: Vec<f64> = trace
                .iter()
                .map(|(x, y)| ((x - od.0).powi(2) + (y - od.1).powi(2)).sqrt())
                .collect();
            assert!(d.windows(2).all(|w| w[1] > w[0]), "phi0={} not outward", phi0);
        }
    }

    #[test]
    fn test_ids_are_dense_and_superior_first() {
        let bundles = grow_bundles(&small_params()).unwrap();
        for (i, b) in bundles.iter().enumerate() {
            assert_eq!(b.id, i);
        }
        let first_inferior = bundles
            .iter()
            .position(|b| b.hemisphere == Hemisphere::Inferior)
            .unwrap();
        assert!(bundles[first_inferior..]
            .iter()
            .all(|b| b.hemisphere == Hemisphere::Inferior));
    }

    #[test]
    fn test_left_eye_is_mirror() {
        let right = grow_bundles(&small_params()).unwrap();
        let left = grow_bundles(&AxonMapParams {
            eye: Eye::Left,
            ..small_params()
        })
        .unwrap();
        assert!(is_mirror_of(&left, &right));
    }

    #[test]
    fn test_left_eye_disc_given_in_right_eye_frame() {
        let left = AxonMapParams {
            eye: Eye::Left,
            ..small_params()
        };
        let bundles = grow_bundles(&left).unwrap();
        let disc = RetinalPoint::from(dva2ret(-15.5, 1.5).unwrap());
        assert!(disc.y > 400.0);
        assert!(bundles.iter().all(|b| b.points[0] == disc));

        // The left eye's actual position would silently lose the disc's y
        let actual = AxonMapParams {
            loc_od: phosphene_structures::OpticDisc { x: -15.5, y: 1.5 },
            ..left
        };
        assert!(matches!(
            grow_bundles(&actual),
            Err(PerceptError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_axons_rejected() {
        let params = AxonMapParams {
            n_axons: 0,
            ..Default::default()
        };
        assert!(matches!(
            grow_bundles(&params),
            Err(PerceptError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_arc_lengths() {
        let b = Bundle {
            id: 0,
            phi0: 0.0,
            hemisphere: Hemisphere::Superior,
            points: vec![
                RetinalPoint::new(0.0, 0.0),
                RetinalPoint::new(3.0, 4.0),
                RetinalPoint::new(3.0, 10.0),
            ],
        };
        assert_eq!(b.arc_lengths(), vec![0.0, 5.0, 11.0]);
        assert_eq!(b.length(), 11.0);
    }
}
