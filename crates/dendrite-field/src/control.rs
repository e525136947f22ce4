//! Control functions: the external elevation fields steering descent.
//!
//! A control function is a scalar elevation field over a declared
//! rectangular domain. The engine remaps grid-point coordinates from its
//! own noise-space rectangle into the domain before sampling, then links
//! each grid point to its locally lowest neighbor; the shape of the
//! elevation field is what the branching network descends along.

use dendrite_geom::Rect;
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A scalar elevation field over a rectangular domain.
///
/// Implementations must be pure: the same `(x, y)` always yields the same
/// elevation, and elevations stay in [0, 1] over the declared domain.
pub trait ControlFunction {
    /// Samples the elevation at `(x, y)` in domain coordinates.
    fn elevation(&self, x: f32, y: f32) -> f32;

    /// The rectangle over which this function is defined.
    fn domain(&self) -> Rect;
}

// =============================================================================
// Constant plane
// =============================================================================

/// A constant elevation plane.
///
/// Useful as a neutral control: with no gradient to descend, the network
/// degenerates into a uniform lattice, which makes it the baseline for
/// inspecting the raw segment geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneControl {
    /// The elevation returned everywhere.
    pub value: f32,
}

impl PlaneControl {
    /// Creates a plane at the given elevation.
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Default for PlaneControl {
    fn default() -> Self {
        Self { value: 0.5 }
    }
}

impl ControlFunction for PlaneControl {
    fn elevation(&self, _x: f32, _y: f32) -> f32 {
        self.value
    }

    fn domain(&self) -> Rect {
        Rect::UNIT
    }
}

// =============================================================================
// Gradient noise
// =============================================================================

/// Permutation table for gradient noise.
/// Classic permutation from Ken Perlin's reference implementation.
const PERM: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn perm(x: i32, seed: i32) -> u8 {
    PERM[((x.wrapping_add(seed)) & 255) as usize]
}

#[inline]
fn grad2(hash: u8, x: f32, y: f32) -> f32 {
    let h = hash & 7;
    let u = if h < 4 { x } else { y };
    let v = if h < 4 { y } else { x };
    (if h & 1 != 0 { -u } else { u }) + (if h & 2 != 0 { -2.0 * v } else { 2.0 * v })
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// A smooth pseudo-random elevation field (classic gradient noise).
///
/// Signed gradient noise remapped to [0, 1], so the descent network follows
/// rolling hills and valleys; this is the terrain-heightmap control.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerlinControl {
    /// Random seed for the gradient hash.
    pub seed: i32,
    /// Domain rectangle the engine remaps queries into.
    pub domain: Rect,
}

impl PerlinControl {
    /// Creates a field with the given seed over the unit square.
    pub fn new(seed: i32) -> Self {
        Self {
            seed,
            domain: Rect::UNIT,
        }
    }

    /// Sets the domain rectangle.
    pub fn with_domain(mut self, domain: Rect) -> Self {
        self.domain = domain;
        self
    }
}

impl ControlFunction for PerlinControl {
    fn elevation(&self, x: f32, y: f32) -> f32 {
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;

        let xf = x - x.floor();
        let yf = y - y.floor();

        let u = fade(xf);
        let v = fade(yf);

        let s = self.seed;
        let aa = perm(perm(xi, s) as i32 + yi, s);
        let ab = perm(perm(xi, s) as i32 + yi + 1, s);
        let ba = perm(perm(xi + 1, s) as i32 + yi, s);
        let bb = perm(perm(xi + 1, s) as i32 + yi + 1, s);

        let x1 = lerp(grad2(aa, xf, yf), grad2(ba, xf - 1.0, yf), u);
        let x2 = lerp(grad2(ab, xf, yf - 1.0), grad2(bb, xf - 1.0, yf - 1.0), u);

        (lerp(x1, x2, v) * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    fn domain(&self) -> Rect {
        self.domain
    }
}

// =============================================================================
// Discharge potential
// =============================================================================

/// A radial discharge-potential field.
///
/// Elevation grows with the distance from an attachment origin, so every
/// descent path converges toward the origin; the two-level network then
/// draws the characteristic inward-branching Lichtenberg figure.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LichtenbergControl {
    /// Attachment point the discharge converges toward.
    pub origin: Vec2,
    /// Distance at which the potential saturates to 1.
    pub radius: f32,
    /// Domain rectangle the engine remaps queries into.
    pub domain: Rect,
}

impl LichtenbergControl {
    /// Creates a potential centered on `origin`, saturating at `radius`.
    pub fn new(origin: Vec2, radius: f32) -> Self {
        Self {
            origin,
            radius,
            domain: Rect::new(origin - Vec2::splat(radius), origin + Vec2::splat(radius)),
        }
    }

    /// Sets the domain rectangle.
    pub fn with_domain(mut self, domain: Rect) -> Self {
        self.domain = domain;
        self
    }
}

impl Default for LichtenbergControl {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 1.0)
    }
}

impl ControlFunction for LichtenbergControl {
    fn elevation(&self, x: f32, y: f32) -> f32 {
        (Vec2::new(x, y).distance(self.origin) / self.radius).clamp(0.0, 1.0)
    }

    fn domain(&self) -> Rect {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_is_constant() {
        let plane = PlaneControl::new(0.3);
        assert_eq!(plane.elevation(0.0, 0.0), 0.3);
        assert_eq!(plane.elevation(-17.5, 42.0), 0.3);
    }

    #[test]
    fn test_perlin_range_and_determinism() {
        let noise = PerlinControl::new(0);
        for i in 0..100 {
            for j in 0..100 {
                let x = i as f32 * 0.07;
                let y = j as f32 * 0.07;
                let v = noise.elevation(x, y);
                assert!((0.0..=1.0).contains(&v), "elevation({x}, {y}) = {v}");
                assert_eq!(v, noise.elevation(x, y));
            }
        }
    }

    #[test]
    fn test_perlin_seed_changes_output() {
        let a = PerlinControl::new(0);
        let b = PerlinControl::new(42);
        assert_ne!(a.elevation(1.5, 2.5), b.elevation(1.5, 2.5));
    }

    #[test]
    fn test_lichtenberg_potential_shape() {
        let control = LichtenbergControl::new(Vec2::ZERO, 1.0);
        assert_eq!(control.elevation(0.0, 0.0), 0.0);
        let near = control.elevation(0.2, 0.0);
        let far = control.elevation(0.8, 0.0);
        assert!(near < far, "potential must grow away from the origin");
        // Saturates outside the radius
        assert_eq!(control.elevation(3.0, 4.0), 1.0);
    }

    #[test]
    fn test_lichtenberg_default_domain_covers_radius() {
        let control = LichtenbergControl::new(Vec2::new(1.0, -1.0), 2.0);
        assert_eq!(control.domain().min, Vec2::new(-1.0, -3.0));
        assert_eq!(control.domain().max, Vec2::new(3.0, 1.0));
    }
}
