//! Deterministic jittered point grid with a precomputed cache window.

use glam::Vec2;

/// Half extent of the precomputed window; the cache covers cells in
/// `[-CACHE_HALF, CACHE_HALF)` on both axes.
const CACHE_HALF: i32 = 16;

const CACHE_SIDE: usize = (2 * CACHE_HALF) as usize;

/// One pseudo-randomly jittered point per integer grid cell.
///
/// The point for cell `(x, y)` is a pure function of the cell coordinates,
/// the global seed and the jitter margin `eps`: identical inputs always
/// yield the identical point. A window of cells around the origin is
/// precomputed at construction; lookups outside the window recompute
/// directly and are value-identical to the cached path. There is no
/// eviction and no interior mutability, so a `PointGrid` is freely
/// shareable across threads.
#[derive(Debug, Clone)]
pub struct PointGrid {
    seed: i32,
    eps: f32,
    cache: Vec<Vec2>,
}

impl PointGrid {
    /// Creates a grid and precomputes the cache window.
    ///
    /// `eps` is the jitter margin from the cell edges, in (0, 0.5): offsets
    /// are drawn from `[eps, 1 - eps]` on each axis.
    pub fn new(seed: i32, eps: f32) -> Self {
        debug_assert!((0.0..0.5).contains(&eps), "eps out of range: {eps}");

        let mut cache = Vec::with_capacity(CACHE_SIDE * CACHE_SIDE);
        for y in -CACHE_HALF..CACHE_HALF {
            for x in -CACHE_HALF..CACHE_HALF {
                cache.push(generate(seed, eps, x, y));
            }
        }

        Self { seed, eps, cache }
    }

    /// The jittered point of cell `(x, y)`, in grid coordinates.
    pub fn point(&self, x: i32, y: i32) -> Vec2 {
        if (-CACHE_HALF..CACHE_HALF).contains(&x) && (-CACHE_HALF..CACHE_HALF).contains(&y) {
            let row = (y + CACHE_HALF) as usize;
            let col = (x + CACHE_HALF) as usize;
            self.cache[row * CACHE_SIDE + col]
        } else {
            generate(self.seed, self.eps, x, y)
        }
    }
}

/// Computes the jittered point of a cell directly, bypassing the cache.
fn generate(seed: i32, eps: f32, x: i32, y: i32) -> Vec2 {
    let cell_seed = 541i32
        .wrapping_mul(x)
        .wrapping_add(79i32.wrapping_mul(y))
        .wrapping_add(seed) as u32;

    let h0 = mix(cell_seed);
    let h1 = mix(h0 ^ 0x9e37_79b9);

    let jx = eps + (1.0 - 2.0 * eps) * unit(h0);
    let jy = eps + (1.0 - 2.0 * eps) * unit(h1);

    Vec2::new(x as f32 + jx, y as f32 + jy)
}

/// 32-bit multiply-xorshift finalizer.
#[inline]
fn mix(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

/// Maps a hash to a uniform sample strictly inside (0, 1).
///
/// Uses 16 bits plus a half-step offset, keeping a margin of 2^-17 from
/// both endpoints. Adding such a sample to a cell coordinate below 256
/// can never round onto the next integer, so the jitter never places a
/// point exactly on a cell boundary, whatever `eps` is.
#[inline]
fn unit(h: u32) -> f32 {
    ((h >> 16) as f32 + 0.5) * (1.0 / 65_536.0)
}
