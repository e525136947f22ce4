//! Raster sampling and image output for scalar fields.
//!
//! Samples any `Fn(f32, f32) -> f32` over a rectangle into a row-major
//! buffer (rows dispatched in parallel; every sample is independent),
//! min/max-stretches the result to 16 bits and writes a grayscale PNG.
//!
//! # Example
//!
//! ```no_run
//! use dendrite_geom::Rect;
//! use glam::Vec2;
//!
//! let rect = Rect::new(Vec2::ZERO, Vec2::splat(4.0));
//! let values = dendrite_render::sample_rect(|x, y| x + y, rect, 256, 256);
//! let image = dendrite_render::to_gray16(&values, 256, 256);
//! dendrite_render::write_png("ramp.png", &image).unwrap();
//! ```

use std::path::Path;

use dendrite_geom::{remap_clamp, Rect};
use image::{ImageBuffer, Luma};
use rayon::prelude::*;
use thiserror::Error;

/// Errors from raster output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The raster has a zero dimension.
    #[error("empty raster ({width}x{height})")]
    EmptyRaster {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// Encoding or writing the image file failed.
    #[error("failed to write image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Samples `f` over `rect` into a row-major `width * height` buffer.
///
/// Pixel `(j, i)` maps to the rectangle via a clamped linear remap of the
/// pixel indices, matching the raster convention of the demo drivers
/// (row 0 is `rect.min.y`). Rows are sampled in parallel; `f` only needs
/// to be `Sync`, never `&mut`.
pub fn sample_rect<F>(f: F, rect: Rect, width: u32, height: u32) -> Vec<f32>
where
    F: Fn(f32, f32) -> f32 + Sync,
{
    let mut values = vec![0.0f32; width as usize * height as usize];

    values
        .par_chunks_mut(width.max(1) as usize)
        .enumerate()
        .for_each(|(i, row)| {
            let y = remap_clamp(i as f32, 0.0, height as f32, rect.min.y, rect.max.y);
            for (j, value) in row.iter_mut().enumerate() {
                let x = remap_clamp(j as f32, 0.0, width as f32, rect.min.x, rect.max.x);
                *value = f(x, y);
            }
        });

    values
}

/// Min/max-stretches a sample buffer to a 16-bit grayscale image.
///
/// The smallest sample maps to 0 and the largest to 65535; a constant
/// buffer maps to all zeros.
pub fn to_gray16(values: &[f32], width: u32, height: u32) -> ImageBuffer<Luma<u16>, Vec<u16>> {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }

    ImageBuffer::from_fn(width, height, |x, y| {
        let v = values[(y * width + x) as usize];
        if hi > lo {
            Luma([remap_clamp(v, lo, hi, 0.0, 65535.0) as u16])
        } else {
            Luma([0])
        }
    })
}

/// Writes a 16-bit grayscale image as PNG.
pub fn write_png(
    path: impl AsRef<Path>,
    image: &ImageBuffer<Luma<u16>, Vec<u16>>,
) -> Result<(), RenderError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(RenderError::EmptyRaster {
            width: image.width(),
            height: image.height(),
        });
    }
    image.save(path.as_ref())?;
    Ok(())
}
