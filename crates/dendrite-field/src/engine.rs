//! Two-level branching network synthesis and field evaluation.
//!
//! Every query runs the same pipeline: gather a 7x7 jittered-point
//! neighborhood around the query cell, link interior points to their
//! locally lowest neighbor (level 1), split each segment at a Catmull-Rom
//! midpoint, build a half-resolution neighborhood for the quadrant the
//! query falls in and hang 9 shorter segments off the subdivided network
//! (level 2), then return the distance to the nearest segment plus the
//! elevation along it. The pipeline is pure; nothing is shared between
//! queries except the read-only point cache.

use dendrite_geom::{catmull_rom_midpoint, lerp_clamp, Rect, Segment3};
use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::control::ControlFunction;
use crate::grid::PointGrid;

// Overlay radii, halving with each structural level so diagnostic renders
// stay legible at the grid's natural zoom.
const POINT_RADIUS_L1: f32 = 0.0625;
const POINT_RADIUS_L2: f32 = 0.03125;
const SEGMENT_RADIUS_L1: f32 = 0.015625;
const SEGMENT_RADIUS_L2: f32 = 0.0078125;
const GRID_RADIUS_L1: f32 = 0.0078125;
const GRID_RADIUS_L2: f32 = 0.00390625;

/// Configuration for a [`BranchingField`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldConfig {
    /// Seed for the jittered point grid.
    pub seed: i32,
    /// Jitter margin from cell edges, in (0, 0.5).
    pub eps: f32,
    /// Light up small discs at grid points and midpoints.
    pub display_points: bool,
    /// Light up bands along the generated segments.
    pub display_segments: bool,
    /// Light up the integer and half-integer grid lines.
    pub display_grid: bool,
    /// Noise-space rectangle remapped into the control function's domain.
    pub noise_rect: Rect,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            eps: 0.15,
            display_points: false,
            display_segments: false,
            display_grid: false,
            noise_rect: Rect::UNIT,
        }
    }
}

/// A scalar field synthesized from a two-level branching segment network.
///
/// Construction precomputes the point cache; evaluation borrows `self`
/// immutably and is safe to run from any number of threads at once.
#[derive(Debug, Clone)]
pub struct BranchingField<C> {
    control: C,
    config: FieldConfig,
    grid: PointGrid,
}

impl<C: ControlFunction> BranchingField<C> {
    /// Creates a field driven by the given control function.
    pub fn new(control: C, config: FieldConfig) -> Self {
        let grid = PointGrid::new(config.seed, config.eps);
        Self {
            control,
            config,
            grid,
        }
    }

    /// The configuration this field was built with.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The control function steering descent.
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Evaluates the field at `(x, y)` in noise-space coordinates.
    ///
    /// The result is the Worley term (nearest-segment distance plus the
    /// elevation along that segment), with any enabled diagnostic overlays
    /// lit on top via `max`.
    pub fn evaluate(&self, x: f32, y: f32) -> f32 {
        let cx = x.floor();
        let cy = y.floor();

        // Level 1: jittered points and steepest-descent segments
        let points = self.points7(cx as i32, cy as i32);
        let elevations = self.elevations(&points);
        let segments = level1_segments(&points, &elevations);

        // Subdivide level 1 at curvature-aware midpoints
        let (begins, midpoints, ends) = subdivide(&segments);

        // Level 2: half-resolution points hung onto the subdivided network
        let sub_points = self.sub_points(cx, cy, x, y, &points);
        let sub_segments = sub_segments(&sub_points, &begins, &ends);

        worley(x, y, &begins, &ends, &sub_segments)
            .max(self.overlays_level1(x, y, &points, &midpoints, &begins, &ends))
            .max(self.overlays_level2(x, y, &sub_points, &sub_segments))
    }

    /// The 7x7 point neighborhood around cell `(cx, cy)`; `[i][j]` holds
    /// the point of cell `(cx + j - 3, cy + i - 3)`.
    fn points7(&self, cx: i32, cy: i32) -> [[Vec2; 7]; 7] {
        let mut points = [[Vec2::ZERO; 7]; 7];
        for (i, row) in points.iter_mut().enumerate() {
            for (j, p) in row.iter_mut().enumerate() {
                *p = self.grid.point(cx + j as i32 - 3, cy + i as i32 - 3);
            }
        }
        points
    }

    /// The 5x5 point neighborhood around cell `(cx, cy)`.
    fn points5(&self, cx: i32, cy: i32) -> [[Vec2; 5]; 5] {
        let mut points = [[Vec2::ZERO; 5]; 5];
        for (i, row) in points.iter_mut().enumerate() {
            for (j, p) in row.iter_mut().enumerate() {
                *p = self.grid.point(cx + j as i32 - 2, cy + i as i32 - 2);
            }
        }
        points
    }

    /// Control-function elevations of a 7x7 neighborhood, with coordinates
    /// remapped from noise space into the control domain.
    fn elevations(&self, points: &[[Vec2; 7]; 7]) -> [[f32; 7]; 7] {
        let domain = self.control.domain();
        let mut elevations = [[0.0f32; 7]; 7];
        for (row, points_row) in elevations.iter_mut().zip(points.iter()) {
            for (e, p) in row.iter_mut().zip(points_row.iter()) {
                let q = self.config.noise_rect.remap_to(&domain, *p);
                *e = self.control.elevation(q.x, q.y);
            }
        }
        elevations
    }

    /// Builds the half-resolution 5x5 neighborhood for the quadrant of
    /// `(cx, cy)` containing `(x, y)`, then splices the level-1 points in at
    /// their quadrant offsets so the two levels never disagree on shared
    /// geometry.
    fn sub_points(&self, cx: f32, cy: f32, x: f32, y: f32, points: &[[Vec2; 7]; 7]) -> [[Vec2; 5]; 5] {
        let (qx, qy) = sub_quadrant(cx, cy, x, y);

        let mut sub = self.points5(2 * cx as i32 + qx, 2 * cy as i32 + qy);
        for row in &mut sub {
            for p in row {
                *p *= 0.5;
            }
        }

        for row in points {
            for p in row {
                let (pqx, pqy) = sub_quadrant(cx, cy, p.x, p.y);
                let k = 2 - qy + pqy;
                let l = 2 - qx + pqx;
                if (0..5).contains(&k) && (0..5).contains(&l) {
                    sub[k as usize][l as usize] = *p;
                }
            }
        }

        sub
    }

    /// Level-1 diagnostic overlays: point discs, segment bands and the
    /// integer grid lines.
    fn overlays_level1(
        &self,
        x: f32,
        y: f32,
        points: &[[Vec2; 7]; 7],
        midpoints: &[[Vec2; 5]; 5],
        begins: &[Segment3; 25],
        ends: &[Segment3; 25],
    ) -> f32 {
        let mut value = 0.0f32;

        if self.config.display_points {
            value = value.max(points_overlay(x, y, points, POINT_RADIUS_L1));
            value = value.max(points_overlay(x, y, midpoints, POINT_RADIUS_L2));
        }
        if self.config.display_segments {
            value = value.max(segments_overlay(x, y, begins, SEGMENT_RADIUS_L1));
            value = value.max(segments_overlay(x, y, ends, SEGMENT_RADIUS_L1));
        }
        if self.config.display_grid {
            value = value.max(grid_overlay(x, y, 0.0, GRID_RADIUS_L1));
        }

        value
    }

    /// Level-2 overlays: sub-point discs, sub-segment bands and the
    /// half-integer grid lines.
    fn overlays_level2(
        &self,
        x: f32,
        y: f32,
        sub_points: &[[Vec2; 5]; 5],
        sub_segments: &[Segment3; 9],
    ) -> f32 {
        let mut value = 0.0f32;

        if self.config.display_points {
            value = value.max(points_overlay(x, y, sub_points, POINT_RADIUS_L2));
        }
        if self.config.display_segments {
            value = value.max(segments_overlay(x, y, sub_segments, SEGMENT_RADIUS_L2));
        }
        if self.config.display_grid {
            value = value.max(grid_overlay(x, y, 0.5, GRID_RADIUS_L2));
        }

        value
    }
}

/// Links each interior point of the 7x7 neighborhood to the lowest of its
/// 3x3 neighbors (itself included). The scan is row-major with a strict
/// comparison, so ties resolve to the first minimum encountered; a point
/// that is its own local minimum yields a zero-length segment.
fn level1_segments(points: &[[Vec2; 7]; 7], elevations: &[[f32; 7]; 7]) -> [Segment3; 25] {
    let mut segments = [Segment3::default(); 25];

    for i in 1..6 {
        for j in 1..6 {
            let mut lowest = f32::INFINITY;
            let mut li = i;
            let mut lj = j;

            for k in (i - 1)..=(i + 1) {
                for l in (j - 1)..=(j + 1) {
                    if elevations[k][l] < lowest {
                        lowest = elevations[k][l];
                        li = k;
                        lj = l;
                    }
                }
            }

            let a = points[i][j].extend(elevations[i][j]);
            let b = points[li][lj].extend(lowest);
            segments[5 * (i - 1) + (j - 1)] = Segment3::new(a, b);
        }
    }

    segments
}

/// Splits each segment at a midpoint into begin and end children.
///
/// When a segment has exactly one predecessor (another segment ending at
/// its start) and one successor (another starting at its end), the midpoint
/// comes from a Catmull-Rom cubic through the chain, keeping branches
/// smooth across cell boundaries. A missing neighbor on one side is
/// replaced by mirroring the opposite endpoint; with no unique neighbor on
/// either side the arithmetic midpoint is used. Zero-length segments never
/// count as chain neighbors.
fn subdivide(segments: &[Segment3; 25]) -> ([Segment3; 25], [[Vec2; 5]; 5], [Segment3; 25]) {
    let mut begins = [Segment3::default(); 25];
    let mut midpoints = [[Vec2::ZERO; 5]; 5];
    let mut ends = [Segment3::default(); 25];

    for (idx, curr) in segments.iter().enumerate() {
        let mut ending_in_a = 0;
        let mut last_ending_in_a = Segment3::default();
        let mut starting_in_b = 0;
        let mut last_starting_in_b = Segment3::default();

        for segment in segments {
            if segment.a == segment.b {
                continue;
            }
            if segment.b == curr.a {
                ending_in_a += 1;
                last_ending_in_a = *segment;
            } else if segment.a == curr.b {
                starting_in_b += 1;
                last_starting_in_b = *segment;
            }
        }

        let midpoint = match (ending_in_a, starting_in_b) {
            (1, 1) => catmull_rom_midpoint(last_ending_in_a.a, curr.a, curr.b, last_starting_in_b.b),
            (_, 1) => {
                // Mirror the end through the start as a virtual predecessor
                let virtual_start = 2.0 * curr.a - curr.b;
                catmull_rom_midpoint(virtual_start, curr.a, curr.b, last_starting_in_b.b)
            }
            (1, _) => {
                let virtual_end = 2.0 * curr.b - curr.a;
                catmull_rom_midpoint(last_ending_in_a.a, curr.a, curr.b, virtual_end)
            }
            _ => curr.midpoint(),
        };

        begins[idx] = Segment3::new(curr.a, midpoint);
        midpoints[idx / 5][idx % 5] = midpoint.truncate();
        ends[idx] = Segment3::new(midpoint, curr.b);
    }

    (begins, midpoints, ends)
}

/// Which quadrant of cell `(cx, cy)` the point `(x, y)` falls in.
///
/// `floor(2 * (coord - cell_origin))` yields 0 or 1 per axis inside the
/// cell and extends consistently to neighboring cells, which is what lets
/// level-1 points be spliced into the half-resolution grid.
fn sub_quadrant(cx: f32, cy: f32, x: f32, y: f32) -> (i32, i32) {
    (
        (2.0 * (x - cx)).floor() as i32,
        (2.0 * (y - cy)).floor() as i32,
    )
}

/// Hangs each interior point of the half-resolution neighborhood onto the
/// nearest level-1 child segment.
///
/// The projection parameter is clamped to the segment; strictly interior
/// hits are pushed toward the far endpoint by `distance / length` so the
/// join approaches 45 degrees, saturating at the endpoint. The new
/// segment's start reuses the end's elevation.
fn sub_segments(
    sub_points: &[[Vec2; 5]; 5],
    begins: &[Segment3; 25],
    ends: &[Segment3; 25],
) -> [Segment3; 9] {
    let mut segments = [Segment3::default(); 9];

    for i in 1..4 {
        for j in 1..4 {
            let p = sub_points[i][j];

            let mut nearest_dist = f32::INFINITY;
            let mut nearest = Segment3::default();
            for segment in begins.iter().chain(ends.iter()) {
                let dist = segment.xy().distance_to(p);
                if dist < nearest_dist {
                    nearest_dist = dist;
                    nearest = *segment;
                }
            }

            let flat = nearest.xy();
            let mut u = flat.project(p).clamp(0.0, 1.0);
            if u > 0.0 && u < 1.0 {
                let v = u + nearest_dist / flat.length();
                u = if v > 1.0 { 1.0 } else { v };
            }

            let end = nearest.point_at(u);
            let start = Vec3::new(p.x, p.y, end.z);
            segments[3 * (i - 1) + (j - 1)] = Segment3::new(start, end);
        }
    }

    segments
}

/// The Worley term: distance to the nearest segment of either level, plus
/// the elevation interpolated along that segment at the query's projection.
fn worley(
    x: f32,
    y: f32,
    begins: &[Segment3; 25],
    ends: &[Segment3; 25],
    sub_segments: &[Segment3; 9],
) -> f32 {
    let p = Vec2::new(x, y);

    let mut nearest_dist = f32::INFINITY;
    let mut nearest = Segment3::default();
    for segment in begins.iter().chain(ends.iter()).chain(sub_segments.iter()) {
        let dist = segment.xy().distance_to(p);
        if dist < nearest_dist {
            nearest_dist = dist;
            nearest = *segment;
        }
    }

    let u = nearest.xy().project(p);
    nearest_dist + lerp_clamp(nearest.a.z, nearest.b.z, u)
}

/// 1.0 when `(x, y)` is within `radius` of any point of the grid, else 0.0.
fn points_overlay<const N: usize>(x: f32, y: f32, points: &[[Vec2; N]; N], radius: f32) -> f32 {
    let p = Vec2::new(x, y);
    for row in points {
        for point in row {
            if p.distance(*point) < radius {
                return 1.0;
            }
        }
    }
    0.0
}

/// 1.0 when `(x, y)` is within `radius` of any segment, else 0.0.
fn segments_overlay(x: f32, y: f32, segments: &[Segment3], radius: f32) -> f32 {
    let p = Vec2::new(x, y);
    for segment in segments {
        if segment.xy().distance_to(p) < radius {
            return 1.0;
        }
    }
    0.0
}

/// 1.0 when `(x, y)` is within `radius` of a grid line offset by `delta`
/// from the integers, else 0.0.
fn grid_overlay(x: f32, y: f32, delta: f32, radius: f32) -> f32 {
    if (x - x.floor() - delta).abs() < radius || (y - y.floor() - delta).abs() < radius {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{PerlinControl, PlaneControl};

    fn terrain_field() -> BranchingField<PerlinControl> {
        let config = FieldConfig {
            noise_rect: Rect::new(Vec2::ZERO, Vec2::splat(4.0)),
            ..FieldConfig::default()
        };
        let control = PerlinControl::new(0).with_domain(Rect::new(Vec2::ZERO, Vec2::splat(0.5)));
        BranchingField::new(control, config)
    }

    #[test]
    fn test_evaluate_idempotent_bitwise() {
        let field = terrain_field();
        for &(x, y) in &[(0.3, 0.7), (1.9, 2.1), (-0.4, 3.2)] {
            let a = field.evaluate(x, y);
            let b = field.evaluate(x, y);
            assert_eq!(a.to_bits(), b.to_bits(), "evaluate({x}, {y}) not stable");
        }
    }

    #[test]
    fn test_evaluate_finite_over_domain() {
        let field = terrain_field();
        for i in 0..40 {
            for j in 0..40 {
                let x = i as f32 * 0.1;
                let y = j as f32 * 0.1;
                let v = field.evaluate(x, y);
                assert!(v.is_finite(), "evaluate({x}, {y}) = {v}");
            }
        }
    }

    #[test]
    fn test_descent_validity() {
        let field = terrain_field();
        let points = field.points7(1, 2);
        let elevations = field.elevations(&points);
        for segment in level1_segments(&points, &elevations) {
            assert!(
                segment.b.z <= segment.a.z,
                "segment climbs: {:?} -> {:?}",
                segment.a,
                segment.b
            );
        }
    }

    #[test]
    fn test_subdivision_continuity() {
        let field = terrain_field();
        let points = field.points7(0, 0);
        let elevations = field.elevations(&points);
        let segments = level1_segments(&points, &elevations);
        let (begins, midpoints, ends) = subdivide(&segments);

        for i in 0..25 {
            assert_eq!(begins[i].a, segments[i].a);
            assert_eq!(ends[i].b, segments[i].b);
            assert_eq!(begins[i].b, ends[i].a, "children disagree on midpoint");
            assert_eq!(midpoints[i / 5][i % 5], begins[i].b.truncate());
        }
    }

    #[test]
    fn test_sub_segment_ends_on_parent_network() {
        let field = terrain_field();
        let x = 1.3;
        let y = 2.6;
        let points = field.points7(1, 2);
        let elevations = field.elevations(&points);
        let segments = level1_segments(&points, &elevations);
        let (begins, _, ends) = subdivide(&segments);
        let sub_points = field.sub_points(1.0, 2.0, x, y, &points);

        for sub in sub_segments(&sub_points, &begins, &ends) {
            let end = sub.b.truncate();
            let dist = begins
                .iter()
                .chain(ends.iter())
                .map(|s| s.xy().distance_to(end))
                .fold(f32::INFINITY, f32::min);
            assert!(dist < 1e-5, "sub-segment end {end:?} off the network: {dist}");
            // Start keeps the end's elevation
            assert_eq!(sub.a.z, sub.b.z);
        }
    }

    #[test]
    fn test_sub_quadrant_indexing() {
        assert_eq!(sub_quadrant(0.0, 0.0, 0.25, 0.75), (0, 1));
        assert_eq!(sub_quadrant(0.0, 0.0, 0.75, 0.25), (1, 0));
        // Extends into neighboring cells with the same formula
        assert_eq!(sub_quadrant(0.0, 0.0, -0.25, 1.6), (-1, 3));
        assert_eq!(sub_quadrant(1.0, 1.0, 1.6, 2.3), (1, 2));
        assert_eq!(sub_quadrant(-2.0, -2.0, -1.7, -2.0), (0, 0));
    }

    #[test]
    fn test_sub_points_preserve_level1_geometry() {
        // The query cell's own point must survive the splice at the correct
        // half-resolution offset.
        let field = terrain_field();
        let points = field.points7(1, 2);
        let center = points[3][3];
        let sub = field.sub_points(1.0, 2.0, center.x, center.y, &points);
        assert!(
            sub.iter().flatten().any(|p| *p == center),
            "level-1 point lost during splice"
        );
    }

    #[test]
    fn test_constant_control_value_at_point() {
        // Scenario: constant elevation 0.5, query exactly at a jittered
        // point. Distance is 0 and the interpolated elevation is 0.5.
        let field = BranchingField::new(PlaneControl::new(0.5), FieldConfig::default());
        let p = field.grid.point(1, 1);
        let v = field.evaluate(p.x, p.y);
        assert!((v - 0.5).abs() < 1e-6, "value at jittered point: {v}");
    }

    #[test]
    fn test_grid_overlay_on_integer_line() {
        // A zero control keeps the Worley term at the bare distance, below
        // 1 near the network, so the grid overlay wins the max exactly.
        let base = BranchingField::new(PlaneControl::new(0.0), FieldConfig::default());
        let lit = BranchingField::new(
            PlaneControl::new(0.0),
            FieldConfig {
                display_grid: true,
                ..FieldConfig::default()
            },
        );
        for &(x, y) in &[(0.0, 0.5), (2.0, 1.3), (-1.0, 0.25)] {
            let worley = base.evaluate(x, y);
            assert!(worley < 1.0, "worley term unexpectedly large: {worley}");
            assert_eq!(lit.evaluate(x, y), 1.0, "grid line not lit at ({x}, {y})");
        }
    }

    #[test]
    fn test_overlays_never_subtract() {
        let base = terrain_field();
        let lit = BranchingField::new(
            *base.control(),
            FieldConfig {
                display_points: true,
                display_segments: true,
                display_grid: true,
                ..*base.config()
            },
        );
        for i in 0..20 {
            let x = i as f32 * 0.17;
            let y = i as f32 * 0.13;
            assert!(lit.evaluate(x, y) >= base.evaluate(x, y));
        }
    }

    #[test]
    fn test_continuity_across_cell_boundary() {
        let field = terrain_field();
        let gap = 1.0e-4;
        for i in 0..10 {
            let y = 0.35 + i as f32 * 0.3;
            let left = field.evaluate(2.0 - gap, y);
            let right = field.evaluate(2.0 + gap, y);
            assert!(
                (left - right).abs() < 0.02,
                "seam at y = {y}: {left} vs {right}"
            );
        }
    }

    #[test]
    fn test_projection_clamped_after_join_policy() {
        // Whatever the 45-degree shift does, the end must stay between the
        // parent's endpoints: its elevation is a convex combination.
        let field = terrain_field();
        let points = field.points7(0, 0);
        let elevations = field.elevations(&points);
        let segments = level1_segments(&points, &elevations);
        let (begins, _, ends) = subdivide(&segments);
        let sub_points = field.sub_points(0.0, 0.0, 0.6, 0.6, &points);

        for sub in sub_segments(&sub_points, &begins, &ends) {
            let on_some_parent = begins.iter().chain(ends.iter()).any(|parent| {
                let lo = parent.a.z.min(parent.b.z) - 1e-6;
                let hi = parent.a.z.max(parent.b.z) + 1e-6;
                (lo..=hi).contains(&sub.b.z) && parent.xy().distance_to(sub.b.truncate()) < 1e-5
            });
            assert!(on_some_parent, "sub-segment end escaped its parent");
        }
    }
}
