//! Segment and interval math used by the dendrite field synthesis engine.
//!
//! Provides the small set of geometric primitives the engine needs on its
//! per-sample hot path: axis-aligned rectangles with linear coordinate
//! remapping, 2-D and 3-D line segments with projection and distance
//! queries, and the Catmull-Rom midpoint used for segment subdivision.
//!
//! # Example
//!
//! ```
//! use dendrite_geom::Segment2;
//! use glam::Vec2;
//!
//! let segment = Segment2::new(Vec2::ZERO, Vec2::new(2.0, 0.0));
//! assert_eq!(segment.distance_to(Vec2::new(1.0, 1.0)), 1.0);
//! assert_eq!(segment.project(Vec2::new(1.0, 1.0)), 0.5);
//! ```

use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Interval remapping
// =============================================================================

/// Linearly remaps `v` from `[in_lo, in_hi]` to `[out_lo, out_hi]`.
#[inline]
pub fn remap(v: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    out_lo + (v - in_lo) * (out_hi - out_lo) / (in_hi - in_lo)
}

/// Like [`remap`], but the result is clamped to the output interval.
#[inline]
pub fn remap_clamp(v: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let t = ((v - in_lo) / (in_hi - in_lo)).clamp(0.0, 1.0);
    out_lo + t * (out_hi - out_lo)
}

/// Linear interpolation between `a` and `b` with `t` clamped to [0, 1].
#[inline]
pub fn lerp_clamp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

// =============================================================================
// Rectangles
// =============================================================================

/// An axis-aligned rectangle, used for noise-space and control-space domains.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Rect {
    /// The unit square from (0, 0) to (1, 1).
    pub const UNIT: Rect = Rect {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    /// Creates a rectangle from two corners.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Remaps a point from this rectangle's coordinates into `other`'s.
    pub fn remap_to(&self, other: &Rect, p: Vec2) -> Vec2 {
        Vec2::new(
            remap(p.x, self.min.x, self.max.x, other.min.x, other.max.x),
            remap(p.y, self.min.y, self.max.y, other.min.y, other.max.y),
        )
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::UNIT
    }
}

// =============================================================================
// Segments
// =============================================================================

/// A 2-D line segment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment2 {
    /// Start point.
    pub a: Vec2,
    /// End point.
    pub b: Vec2,
}

impl Segment2 {
    /// Creates a segment from two endpoints.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    /// Segment length.
    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }

    /// Point on the segment's support line at parameter `u`
    /// (`u = 0` is `a`, `u = 1` is `b`).
    pub fn point_at(&self, u: f32) -> Vec2 {
        self.a + (self.b - self.a) * u
    }

    /// Parameter of the orthogonal projection of `p` onto the support line.
    ///
    /// The result is not clamped; values outside [0, 1] mean the projection
    /// falls beyond an endpoint. Zero-length segments project everything to 0.
    pub fn project(&self, p: Vec2) -> f32 {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq == 0.0 {
            return 0.0;
        }
        (p - self.a).dot(ab) / len_sq
    }

    /// Euclidean distance from `p` to the segment.
    pub fn distance_to(&self, p: Vec2) -> f32 {
        let u = self.project(p).clamp(0.0, 1.0);
        p.distance(self.point_at(u))
    }
}

/// A 3-D line segment; z carries the elevation of each endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment3 {
    /// Start point.
    pub a: Vec3,
    /// End point.
    pub b: Vec3,
}

impl Segment3 {
    /// Creates a segment from two endpoints.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    /// Drops the z coordinate of both endpoints.
    pub fn xy(&self) -> Segment2 {
        Segment2::new(self.a.truncate(), self.b.truncate())
    }

    /// Arithmetic midpoint of the two endpoints.
    pub fn midpoint(&self) -> Vec3 {
        (self.a + self.b) * 0.5
    }

    /// Point on the segment at parameter `u` (`u = 0` is `a`, `u = 1` is `b`).
    pub fn point_at(&self, u: f32) -> Vec3 {
        self.a + (self.b - self.a) * u
    }
}

// =============================================================================
// Catmull-Rom subdivision
// =============================================================================

/// Midpoint of the middle segment of a uniform Catmull-Rom cubic through
/// four control points.
///
/// Evaluating the standard basis at t = 0.5 collapses to
/// `(-p0 + 9*(p1 + p2) - p3) / 16`, which passes through the curve between
/// `p1` and `p2` while bending toward the neighbors.
pub fn catmull_rom_midpoint(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Vec3 {
    ((p1 + p2) * 9.0 - p0 - p3) * (1.0 / 16.0)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_interval() {
        assert_eq!(remap(0.5, 0.0, 1.0, 0.0, 10.0), 5.0);
        assert_eq!(remap(2.0, 0.0, 4.0, -1.0, 1.0), 0.0);
        // Unclamped beyond the input interval
        assert_eq!(remap(2.0, 0.0, 1.0, 0.0, 10.0), 20.0);
        assert_eq!(remap_clamp(2.0, 0.0, 1.0, 0.0, 10.0), 10.0);
        assert_eq!(remap_clamp(-1.0, 0.0, 1.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_lerp_clamp() {
        assert_eq!(lerp_clamp(1.0, 3.0, 0.5), 2.0);
        assert_eq!(lerp_clamp(1.0, 3.0, -2.0), 1.0);
        assert_eq!(lerp_clamp(1.0, 3.0, 5.0), 3.0);
    }

    #[test]
    fn test_rect_remap() {
        let from = Rect::new(Vec2::ZERO, Vec2::splat(4.0));
        let to = Rect::new(Vec2::ZERO, Vec2::splat(0.5));
        let p = from.remap_to(&to, Vec2::new(2.0, 4.0));
        assert_eq!(p, Vec2::new(0.25, 0.5));
    }

    #[test]
    fn test_segment_endpoints_exact() {
        let s = Segment2::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, -1.0));
        assert_eq!(s.point_at(0.0), s.a);
        assert_eq!(s.point_at(1.0), s.b);
        assert_eq!(s.distance_to(s.a), 0.0);
        assert_eq!(s.distance_to(s.b), 0.0);
    }

    #[test]
    fn test_projection_parameter() {
        let s = Segment2::new(Vec2::ZERO, Vec2::new(4.0, 0.0));
        assert_eq!(s.project(Vec2::new(1.0, 5.0)), 0.25);
        // Projection beyond the endpoints is not clamped
        assert_eq!(s.project(Vec2::new(8.0, 0.0)), 2.0);
        assert_eq!(s.project(Vec2::new(-4.0, 1.0)), -1.0);
    }

    #[test]
    fn test_degenerate_segment() {
        let p = Vec2::new(1.0, 1.0);
        let s = Segment2::new(p, p);
        assert_eq!(s.project(Vec2::new(5.0, 3.0)), 0.0);
        assert_eq!(s.distance_to(Vec2::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn test_distance_to_interior() {
        let s = Segment2::new(Vec2::ZERO, Vec2::new(2.0, 0.0));
        assert_eq!(s.distance_to(Vec2::new(1.0, 3.0)), 3.0);
        // Past the end, distance is to the endpoint
        assert_eq!(s.distance_to(Vec2::new(5.0, 4.0)), 5.0);
    }

    #[test]
    fn test_segment3_projection_drops_z() {
        let s = Segment3::new(Vec3::new(0.0, 0.0, 7.0), Vec3::new(1.0, 0.0, -3.0));
        let flat = s.xy();
        assert_eq!(flat.a, Vec2::ZERO);
        assert_eq!(flat.b, Vec2::new(1.0, 0.0));
        assert_eq!(s.midpoint(), Vec3::new(0.5, 0.0, 2.0));
    }

    #[test]
    fn test_catmull_rom_midpoint_collinear() {
        // Equally spaced collinear control points reduce to the arithmetic
        // midpoint of the middle segment.
        let p = |x: f32| Vec3::new(x, 0.0, x);
        let mid = catmull_rom_midpoint(p(0.0), p(1.0), p(2.0), p(3.0));
        assert_eq!(mid, Vec3::new(1.5, 0.0, 1.5));
    }

    #[test]
    fn test_catmull_rom_midpoint_bends_toward_neighbors() {
        let mid = catmull_rom_midpoint(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 1.0, 0.0),
        );
        assert_eq!(mid.x, 1.5);
        // The raised neighbors pull the midpoint below the chord.
        assert!(mid.y < 0.0, "expected a bend, got {mid:?}");
    }
}
