// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Visual field <-> retina coordinate transform (Watson 2014).

Each axis is transformed independently:

```text
r_mm = 0.268 |d| + 3.427e-4 d^2 - 8.3309e-7 |d|^3        (d in degrees)
```

The mapping is denser near the fovea. The inverse has no exact closed form;
Watson's fitted polynomial seeds a few Newton steps on the forward map.
*/

use crate::error::{ensure_finite, PerceptError, PerceptResult};

/// Largest eccentricity (degrees) accepted by [`dva2ret_scalar`]
pub const MAX_ECCENTRICITY_DEG: f64 = 180.0;

const NEWTON_MAX_ITER: usize = 50;
const NEWTON_TOL_DEG: f64 = 1e-12;

#[inline]
fn forward_mm(deg: f64) -> f64 {
    0.268 * deg + 3.427e-4 * deg * deg - 8.3309e-7 * deg * deg * deg
}

#[inline]
fn forward_mm_derivative(deg: f64) -> f64 {
    0.268 + 2.0 * 3.427e-4 * deg - 3.0 * 8.3309e-7 * deg * deg
}

/// Largest retinal eccentricity (microns) accepted by [`ret2dva_scalar`]
pub fn max_eccentricity_um() -> f64 {
    1000.0 * forward_mm(MAX_ECCENTRICITY_DEG)
}

/// Convert one axis from degrees of visual angle to retinal microns
pub fn dva2ret_scalar(deg: f64) -> PerceptResult<f64> {
    ensure_finite("dva", deg)?;
    let abs_deg = deg.abs();
    if abs_deg >= MAX_ECCENTRICITY_DEG {
        return Err(PerceptError::InvalidParameter(format!(
            "{} deg lies outside the visual field (|dva| < {})",
            deg, MAX_ECCENTRICITY_DEG
        )));
    }
    Ok(deg.signum() * 1000.0 * forward_mm(abs_deg))
}

/// Convert one axis from retinal microns to degrees of visual angle
pub fn ret2dva_scalar(um: f64) -> PerceptResult<f64> {
    ensure_finite("retinal coordinate", um)?;
    let target_mm = um.abs() / 1000.0;
    if um.abs() >= max_eccentricity_um() {
        return Err(PerceptError::InvalidParameter(format!(
            "{} um lies outside the retina covered by the transform",
            um
        )));
    }
    if target_mm == 0.0 {
        return Ok(0.0);
    }

    // Watson's fitted inverse is within a few percent; Newton does the rest.
    let mut deg = 3.556 * target_mm + 0.05993 * target_mm.powi(2) - 0.007358 * target_mm.powi(3)
        + 3.027e-4 * target_mm.powi(4);
    deg = deg.clamp(0.0, MAX_ECCENTRICITY_DEG);
    for _ in 0..NEWTON_MAX_ITER {
        let step = (forward_mm(deg) - target_mm) / forward_mm_derivative(deg);
        deg = (deg - step).clamp(0.0, MAX_ECCENTRICITY_DEG);
        if step.abs() <= NEWTON_TOL_DEG * deg.max(1.0) {
            break;
        }
    }
    Ok(um.signum() * deg)
}

/// Convert a visual field location (dva) to retinal coordinates (microns)
pub fn dva2ret(x_deg: f64, y_deg: f64) -> PerceptResult<(f64, f64)> {
    Ok((dva2ret_scalar(x_deg)?, dva2ret_scalar(y_deg)?))
}

/// Convert a retinal location (microns) to visual field coordinates (dva)
pub fn ret2dva(x_um: f64, y_um: f64) -> PerceptResult<(f64, f64)> {
    Ok((ret2dva_scalar(x_um)?, ret2dva_scalar(y_um)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_origin_maps_to_origin() {
        assert_eq!(dva2ret(0.0, 0.0).unwrap(), (0.0, 0.0));
        assert_eq!(ret2dva(0.0, 0.0).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_known_values() {
        // 1 deg ~ 268 um near the fovea
        let (x, _) = dva2ret(1.0, 0.0).unwrap();
        assert!((x - 268.342).abs() < 1e-2, "got {}", x);
        let (_, y) = dva2ret(0.0, -10.0).unwrap();
        assert!((y + 2713.44).abs() < 1e-1, "got {}", y);
    }

    #[test]
    fn test_axes_are_independent() {
        let (x1, _) = dva2ret(5.0, 0.0).unwrap();
        let (x2, _) = dva2ret(5.0, 12.0).unwrap();
        assert_eq!(x1, x2);
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(matches!(
            dva2ret(f64::NAN, 0.0),
            Err(PerceptError::InvalidParameter(_))
        ));
        assert!(dva2ret(0.0, f64::INFINITY).is_err());
        assert!(ret2dva(f64::NEG_INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(dva2ret(200.0, 0.0).is_err());
        assert!(ret2dva(0.0, 1.0e6).is_err());
    }

    #[test]
    fn test_monotonic() {
        let mut prev = dva2ret_scalar(-90.0).unwrap();
        let mut d = -89.5;
        while d <= 90.0 {
            let r = dva2ret_scalar(d).unwrap();
            assert!(r > prev);
            prev = r;
            d += 0.5;
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip(x in -90.0f64..90.0, y in -90.0f64..90.0) {
            let (xr, yr) = dva2ret(x, y).unwrap();
            let (xd, yd) = ret2dva(xr, yr).unwrap();
            prop_assert!((xd - x).abs() <= 1e-6 * x.abs().max(1e-3));
            prop_assert!((yd - y).abs() <= 1e-6 * y.abs().max(1e-3));
        }
    }
}
