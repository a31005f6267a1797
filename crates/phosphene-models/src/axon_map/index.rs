// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Nearest-bundle lookup.

All bundle points live in one arena in bundle order; a uniform grid of
buckets maps cell coordinates to arena indices. A query walks rings of cells
around the query cell until no unvisited cell can hold a closer point.
*/

use ahash::AHashMap;
use phosphene_structures::coords::max_eccentricity_um;
use phosphene_structures::{PerceptError, PerceptResult, RetinalPoint};

use super::bundles::Bundle;

/// Most cells an index may span along either axis
pub const MAX_CELLS_PER_AXIS: i64 = 1 << 16;

/// Smallest cell size (µm) that keeps the whole retina within
/// [`MAX_CELLS_PER_AXIS`] cells per axis
pub fn min_cell_size() -> f64 {
    2.0 * max_eccentricity_um() / MAX_CELLS_PER_AXIS as f64
}

/// One bundle vertex in the arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundlePoint {
    pub bundle: u32,
    /// Position within its bundle (0 = at the optic disc)
    pub offset: u32,
    /// Arc length from the disc (µm)
    pub arc: f64,
    pub pos: RetinalPoint,
}

/// Where a location attaches to its nearest bundle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestBundle {
    pub bundle: usize,
    /// Start vertex of the segment holding the foot point
    pub offset: usize,
    /// Arc length from the disc to the foot point (µm)
    pub arc_length: f64,
    /// Distance from the query to the foot point (µm)
    pub distance: f64,
    /// Closest point on the bundle
    pub foot: RetinalPoint,
}

/// Index statistics
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub total_points: usize,
    pub total_bundles: usize,
    pub occupied_cells: usize,
    pub max_points_per_cell: usize,
}

/// Grid-bucket index over the points of every bundle
#[derive(Debug, Clone)]
pub struct BundleIndex {
    points: Vec<BundlePoint>,
    /// Arena index of each bundle's first point, plus the arena length
    bundle_start: Vec<usize>,
    cells: AHashMap<(i32, i32), Vec<u32>>,
    cell_size: f64,
    /// Occupied cell range: (min_cx, min_cy, max_cx, max_cy)
    bounds: (i32, i32, i32, i32),
}

impl BundleIndex {
    /// Index a set of bundles; bundle `i` of the slice gets id `i`
    pub fn new(bundles: &[Bundle], cell_size: f64) -> PerceptResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(PerceptError::InvalidParameter(format!(
                "index cell size must be positive, got {}",
                cell_size
            )));
        }
        let total: usize = bundles.iter().map(Bundle::len).sum();
        if total == 0 {
            return Err(PerceptError::invalid("cannot index bundles without points"));
        }
        if total > u32::MAX as usize {
            return Err(PerceptError::InvalidParameter(format!(
                "too many bundle points to index: {}",
                total
            )));
        }

        let mut points = Vec::with_capacity(total);
        let mut bundle_start = Vec::with_capacity(bundles.len() + 1);
        for (id, bundle) in bundles.iter().enumerate() {
            bundle_start.push(points.len());
            for (offset, (pos, arc)) in bundle.points.iter().zip(bundle.arc_lengths()).enumerate() {
                points.push(BundlePoint {
                    bundle: id as u32,
                    offset: offset as u32,
                    arc,
                    pos: *pos,
                });
            }
        }
        bundle_start.push(points.len());

        let mut cells: AHashMap<(i32, i32), Vec<u32>> = AHashMap::new();
        let mut bounds = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for (i, p) in points.iter().enumerate() {
            let (cx, cy) = cell_of(&p.pos, cell_size).ok_or_else(|| {
                PerceptError::InvalidParameter(format!(
                    "bundle point ({}, {}) cannot be indexed with cell size {}",
                    p.pos.x, p.pos.y, cell_size
                ))
            })?;
            bounds.0 = bounds.0.min(cx);
            bounds.1 = bounds.1.min(cy);
            bounds.2 = bounds.2.max(cx);
            bounds.3 = bounds.3.max(cy);
            cells.entry((cx, cy)).or_default().push(i as u32);
        }

        let span_x = bounds.2 as i64 - bounds.0 as i64 + 1;
        let span_y = bounds.3 as i64 - bounds.1 as i64 + 1;
        if span_x.max(span_y) > MAX_CELLS_PER_AXIS {
            return Err(PerceptError::InvalidParameter(format!(
                "index cell size {} is too small: bundles span {}x{} cells (max {} per axis)",
                cell_size, span_x, span_y, MAX_CELLS_PER_AXIS
            )));
        }

        Ok(Self {
            points,
            bundle_start,
            cells,
            cell_size,
            bounds,
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn num_bundles(&self) -> usize {
        self.bundle_start.len() - 1
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Points of one bundle, disc first
    pub fn bundle_points(&self, bundle: usize) -> &[BundlePoint] {
        match (self.bundle_start.get(bundle), self.bundle_start.get(bundle + 1)) {
            (Some(&start), Some(&end)) => &self.points[start..end],
            _ => &[],
        }
    }

    /// Arena index of the closest bundle vertex
    ///
    /// Ties resolve to the lowest arena index, i.e. the lowest bundle id and
    /// then the lowest offset.
    pub fn nearest_vertex(&self, query: &RetinalPoint) -> usize {
        // Clamping keeps the ring lower bound valid: every occupied cell is
        // at least as far from the query as from the clamped cell
        let (qx, qy) = self.query_cell(query);
        let (min_cx, min_cy, max_cx, max_cy) = self.bounds_i64();

        // Chebyshev distance from the query cell to the occupied range
        let gap_x = (min_cx - qx).max(qx - max_cx).max(0);
        let gap_y = (min_cy - qy).max(qy - max_cy).max(0);
        let first_ring = gap_x.max(gap_y);
        let last_ring = (qx - min_cx)
            .abs()
            .max((max_cx - qx).abs())
            .max((qy - min_cy).abs())
            .max((max_cy - qy).abs());

        let mut best: Option<(f64, u32)> = None;
        for ring in first_ring..=last_ring {
            if let Some((best_d2, _)) = best {
                // Anything in this ring is at least (ring - 1) cells away
                let reach = (ring - 1) as f64 * self.cell_size;
                if reach > 0.0 && reach * reach > best_d2 {
                    break;
                }
            }
            self.visit_ring(qx, qy, ring, |idx| {
                let d2 = self.points[idx as usize].pos.distance_squared(query);
                let better = match best {
                    None => true,
                    Some((bd2, bidx)) => d2 < bd2 || (d2 == bd2 && idx < bidx),
                };
                if better {
                    best = Some((d2, idx));
                }
            });
        }

        // The arena is never empty, so at least one ring holds a point
        best.map(|(_, idx)| idx as usize).unwrap_or(0)
    }

    /// Nearest bundle with the foot point refined against the segments next
    /// to the nearest vertex
    pub fn nearest(&self, query: &RetinalPoint) -> NearestBundle {
        let vertex = self.points[self.nearest_vertex(query)];
        let bundle = vertex.bundle as usize;
        let pts = self.bundle_points(bundle);
        let k = vertex.offset as usize;

        // A foot on vertex k belongs to the segment ending there
        let mut result = NearestBundle {
            bundle,
            offset: k.saturating_sub(1),
            arc_length: vertex.arc,
            distance: vertex.pos.distance(query),
            foot: vertex.pos,
        };

        let mut candidates = Vec::with_capacity(2);
        if k > 0 {
            candidates.push(k - 1);
        }
        if k + 1 < pts.len() {
            candidates.push(k);
        }
        for start in candidates {
            let (a, b) = (&pts[start], &pts[start + 1]);
            let (foot, t) = project_onto_segment(query, &a.pos, &b.pos);
            let d = foot.distance(query);
            if d < result.distance {
                result = NearestBundle {
                    bundle,
                    offset: start,
                    arc_length: a.arc + t * (b.arc - a.arc),
                    distance: d,
                    foot,
                };
            }
        }
        result
    }

    /// Linear scan over the arena; same tie rule as [`Self::nearest_vertex`]
    pub fn nearest_vertex_brute_force(&self, query: &RetinalPoint) -> usize {
        let mut best = (f64::INFINITY, 0usize);
        for (i, p) in self.points.iter().enumerate() {
            let d2 = p.pos.distance_squared(query);
            if d2 < best.0 {
                best = (d2, i);
            }
        }
        best.1
    }

    pub fn get_stats(&self) -> IndexStats {
        IndexStats {
            total_points: self.points.len(),
            total_bundles: self.num_bundles(),
            occupied_cells: self.cells.len(),
            max_points_per_cell: self.cells.values().map(Vec::len).max().unwrap_or(0),
        }
    }

    fn bounds_i64(&self) -> (i64, i64, i64, i64) {
        let (a, b, c, d) = self.bounds;
        (a as i64, b as i64, c as i64, d as i64)
    }

    /// Query cell, clamped to one cell outside the occupied range
    fn query_cell(&self, query: &RetinalPoint) -> (i64, i64) {
        let (min_cx, min_cy, max_cx, max_cy) = self.bounds_i64();
        let clamp = |v: f64, lo: i64, hi: i64| -> i64 {
            let c = (v / self.cell_size).floor();
            if c.is_nan() {
                lo - 1
            } else {
                c.clamp((lo - 1) as f64, (hi + 1) as f64) as i64
            }
        };
        (
            clamp(query.x, min_cx, max_cx),
            clamp(query.y, min_cy, max_cy),
        )
    }

    fn visit_ring<F: FnMut(u32)>(&self, qx: i64, qy: i64, ring: i64, mut visit: F) {
        let (min_cx, min_cy, max_cx, max_cy) = self.bounds_i64();
        let mut visit_cell = |cx: i64, cy: i64| {
            if !((min_cx..=max_cx).contains(&cx) && (min_cy..=max_cy).contains(&cy)) {
                return;
            }
            // In bounds, so both fit in i32
            if let Some(bucket) = self.cells.get(&(cx as i32, cy as i32)) {
                for &idx in bucket {
                    visit(idx);
                }
            }
        };
        if ring == 0 {
            visit_cell(qx, qy);
            return;
        }
        let x0 = (qx - ring).max(min_cx);
        let x1 = (qx + ring).min(max_cx);
        for cy in [qy - ring, qy + ring] {
            if (min_cy..=max_cy).contains(&cy) {
                for cx in x0..=x1 {
                    visit_cell(cx, cy);
                }
            }
        }
        let y0 = (qy - ring + 1).max(min_cy);
        let y1 = (qy + ring - 1).min(max_cy);
        for cx in [qx - ring, qx + ring] {
            if (min_cx..=max_cx).contains(&cx) {
                for cy in y0..=y1 {
                    visit_cell(cx, cy);
                }
            }
        }
    }
}

/// Cell holding `p`, or `None` when it falls outside the i32 cell range
#[inline]
fn cell_of(p: &RetinalPoint, cell_size: f64) -> Option<(i32, i32)> {
    let cx = (p.x / cell_size).floor();
    let cy = (p.y / cell_size).floor();
    let range = i32::MIN as f64..=i32::MAX as f64;
    (range.contains(&cx) && range.contains(&cy)).then(|| (cx as i32, cy as i32))
}

/// Closest point on segment `ab` and its position `t` in [0, 1]
fn project_onto_segment(p: &RetinalPoint, a: &RetinalPoint, b: &RetinalPoint) -> (RetinalPoint, f64) {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return (*a, 0.0);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    (RetinalPoint::new(a.x + t * dx, a.y + t * dy), t)
}
