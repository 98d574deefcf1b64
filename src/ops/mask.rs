// ============================================================================
// CLUMPING MASK — smooth low-frequency density field over the noise grid
// ============================================================================
//
// A coarse grid of random greys (one per 50 noise cells, plus a border) is
// bilinearly upscaled to noise resolution.  The smooth interpolation is what
// turns independent cells into soft, cloud-shaped clumps.

use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::ops::resample::resize_bilinear;
use crate::ops::rng::Mulberry32;

/// Noise cells per coarse mask cell.
pub const MASK_CELL_SIZE: u32 = 50;
/// Extra coarse cells per axis so the upscale never runs off the grid.
const MASK_BORDER_CELLS: u32 = 2;
/// At or below this randomness no mask is built and no draws are consumed.
pub const MASK_MIN_RANDOMNESS: f64 = 0.05;
/// Share of randomness that becomes the cut-off threshold (kept below 1).
const THRESHOLD_PER_RANDOMNESS: f64 = 0.8;
/// Span of the multiplier above the floor.
const MASK_SPAN: f64 = 0.8;
/// Grain that survives in fully masked-out regions.
pub const MASK_FLOOR: f64 = 0.2;

#[derive(Clone, Debug)]
pub struct ClumpMask {
    field: GrayImage,
}

impl ClumpMask {
    /// Build the mask for a `noise_w × noise_h` grid, or `None` when
    /// `randomness` is too small to matter.  Draws come from `rng` in
    /// row-major coarse-cell order, before any noise is sampled.
    pub fn build(rng: &mut Mulberry32, randomness: f64, noise_w: u32, noise_h: u32) -> Option<Self> {
        if !(randomness > MASK_MIN_RANDOMNESS) || noise_w == 0 || noise_h == 0 {
            return None;
        }

        let coarse_w = noise_w.div_ceil(MASK_CELL_SIZE) + MASK_BORDER_CELLS;
        let coarse_h = noise_h.div_ceil(MASK_CELL_SIZE) + MASK_BORDER_CELLS;

        let mut coarse = RgbaImage::new(coarse_w, coarse_h);
        for px in coarse.pixels_mut() {
            let v = rng.next_byte();
            *px = Rgba([v, v, v, 255]);
        }

        let smooth = resize_bilinear(&coarse, noise_w, noise_h);
        let field = GrayImage::from_fn(noise_w, noise_h, |x, y| Luma([smooth.get_pixel(x, y)[0]]));
        Some(Self { field })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.field.dimensions()
    }

    /// Local density in `[0, 1]`.
    #[inline]
    pub fn value(&self, x: u32, y: u32) -> f64 {
        self.field.get_pixel(x, y)[0] as f64 / 255.0
    }

    /// Same as [`value`](Self::value) by row-major index.
    #[inline]
    pub fn value_at(&self, index: usize) -> f64 {
        self.field.as_raw()[index] as f64 / 255.0
    }

    pub fn field(&self) -> &GrayImage {
        &self.field
    }
}

/// Opacity multiplier for a pixel whose mask value is `mask_value`.
///
/// Always in `[0.2, 1.0]`: masking attenuates grain but never erases it.
/// A threshold at or above 1 (out-of-range randomness) counts as fully
/// masked instead of dividing by zero.
pub fn mask_multiplier(mask_value: f64, randomness: f64) -> f64 {
    let threshold = randomness * THRESHOLD_PER_RANDOMNESS;
    let mask = if threshold >= 1.0 || !threshold.is_finite() || mask_value.is_nan() {
        0.0
    } else {
        ((mask_value - threshold) / (1.0 - threshold)).clamp(0.0, 1.0)
    };
    mask * MASK_SPAN + MASK_FLOOR
}
