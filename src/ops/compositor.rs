// ============================================================================
// GRAIN COMPOSITOR — settings in, finished RGBA buffer out
// ============================================================================
//
// Pipeline, in order:
//   1. sanitize settings, derive output + noise resolution
//   2. flat background fill
//   3. seed one PRNG stream; build the clumping mask from it (if enabled)
//   4. sequential noise pass at noise resolution (all remaining PRNG draws)
//   5. nearest-neighbour upscale + source-over blend at `opacity`
//   6. optional Gaussian blur (`roughness * 10` px)
//
// Only step 4 touches the PRNG, so everything after it can run on rayon
// without affecting the pixels.

use std::time::Instant;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::ops::filters::gaussian_blur;
use crate::ops::mask::{ClumpMask, mask_multiplier};
use crate::ops::noise;
use crate::ops::resample::resize_nearest;
use crate::ops::rng::Mulberry32;
use crate::settings::GrainSettings;

/// Roughness at or below this skips the blur entirely.
pub const BLUR_MIN_ROUGHNESS: f64 = 0.01;
/// Blur radius in pixels at roughness 1.0.
pub const BLUR_RADIUS_PER_ROUGHNESS: f64 = 10.0;

/// Convert a fractional alpha to a byte, clamping out-of-range values.
#[inline]
fn alpha_byte(effect: f64) -> u8 {
    let v = (effect * 255.0).round();
    if v.is_nan() { 0 } else { v.clamp(0.0, 255.0) as u8 }
}

/// Build the grain layer at noise resolution.
///
/// Per cell (row-major): one texture sample, then, in colour mode, three
/// channel draws.  Alpha is `noise * intensity`, attenuated by the mask.
pub fn render_noise_layer(
    settings: &GrainSettings,
    rng: &mut Mulberry32,
    mask: Option<&ClumpMask>,
) -> RgbaImage {
    let s = settings.sanitized();
    let (nw, nh) = s.noise_dimensions();
    let grain = s.grain_rgb();

    let mut layer = RgbaImage::new(nw, nh);
    for (i, px) in layer.pixels_mut().enumerate() {
        let mut effect = noise::sample(s.texture, rng, s.intensity) * s.intensity;
        if let Some(mask) = mask {
            effect *= mask_multiplier(mask.value_at(i), s.randomness);
        }
        let alpha = alpha_byte(effect);
        let [r, g, b] = if s.monochrome {
            grain
        } else {
            [rng.next_byte(), rng.next_byte(), rng.next_byte()]
        };
        *px = Rgba([r, g, b, alpha]);
    }
    layer
}

/// Noise buffer exactly as a render would produce it (mask included).
pub fn noise_buffer(settings: &GrainSettings) -> RgbaImage {
    let s = settings.sanitized();
    let (nw, nh) = s.noise_dimensions();
    let mut rng = Mulberry32::new(s.seed);
    let mask = ClumpMask::build(&mut rng, s.randomness, nw, nh);
    render_noise_layer(&s, &mut rng, mask.as_ref())
}

/// Source-over blend of `layer` onto opaque `dst` with a global alpha.
/// `dst` stays fully opaque.
pub fn composite_over(dst: &mut RgbaImage, layer: &RgbaImage, global_alpha: f64) {
    debug_assert_eq!(dst.dimensions(), layer.dimensions());
    let global = global_alpha.clamp(0.0, 1.0) as f32;
    if global <= 0.0 {
        return;
    }
    let stride = dst.width() as usize * 4;
    let src_raw = layer.as_raw();
    let dst_raw: &mut [u8] = dst;
    dst_raw
        .par_chunks_mut(stride)
        .zip(src_raw.par_chunks(stride))
        .for_each(|(row_out, row_in)| {
            for (d, s) in row_out.chunks_exact_mut(4).zip(row_in.chunks_exact(4)) {
                let a = s[3] as f32 / 255.0 * global;
                if a <= 0.0 {
                    continue;
                }
                let inv = 1.0 - a;
                for c in 0..3 {
                    d[c] = (s[c] as f32 * a + d[c] as f32 * inv).round().clamp(0.0, 255.0) as u8;
                }
                d[3] = 255;
            }
        });
}

/// Render the grain image for `settings`.  Pure: same settings, same bytes.
pub fn render(settings: &GrainSettings) -> RgbaImage {
    render_until(settings, || false).unwrap_or_default()
}

/// [`render`], abandoned with `None` as soon as `cancelled` reports true.
/// Checked before each stage (noise, composite, blur); a finished buffer is
/// byte-identical to [`render`].
pub fn render_until(settings: &GrainSettings, cancelled: impl Fn() -> bool) -> Option<RgbaImage> {
    if cancelled() {
        return None;
    }
    let start = Instant::now();
    let s = settings.sanitized();
    let (w, h) = s.output_dimensions();
    let (nw, nh) = s.noise_dimensions();

    let [br, bg, bb] = s.bg_rgb();
    let mut out = RgbaImage::from_pixel(w, h, Rgba([br, bg, bb, 255]));

    let mut rng = Mulberry32::new(s.seed);
    let mask = ClumpMask::build(&mut rng, s.randomness, nw, nh);
    let layer = render_noise_layer(&s, &mut rng, mask.as_ref());
    if cancelled() {
        return None;
    }

    let scaled = resize_nearest(&layer, w, h);
    drop(layer);
    composite_over(&mut out, &scaled, s.opacity);
    drop(scaled);

    if s.roughness > BLUR_MIN_ROUGHNESS {
        if cancelled() {
            return None;
        }
        let radius = (s.roughness * BLUR_RADIUS_PER_ROUGHNESS) as f32;
        out = gaussian_blur(&out, radius);
    }

    crate::log_info!(
        "Rendered {}x{} (noise {}x{}, {}, mask {}) in {:.0}ms",
        w,
        h,
        nw,
        nh,
        s.texture.label(),
        if mask.is_some() { "on" } else { "off" },
        start.elapsed().as_secs_f64() * 1000.0
    );
    Some(out)
}
