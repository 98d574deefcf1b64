// ============================================================================
// RESAMPLING — nearest-neighbour and bilinear scaling of RGBA buffers
// ============================================================================
//
// Both routines map destination pixel centres onto the source grid, so a
// source that divides evenly into the destination yields exact blocks.

use image::RgbaImage;
use rayon::prelude::*;

/// Source index for destination index `d` when stretching `src_len` over `dst_len`.
#[inline]
fn nearest_index(d: u32, src_len: u32, dst_len: u32) -> u32 {
    let pos = (d as f64 + 0.5) * src_len as f64 / dst_len as f64;
    (pos.floor() as u32).min(src_len - 1)
}

/// Hard-edged resize: every destination pixel copies exactly one source pixel.
pub fn resize_nearest(src: &RgbaImage, dst_w: u32, dst_h: u32) -> RgbaImage {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 || dst_w == 0 || dst_h == 0 {
        return RgbaImage::new(dst_w, dst_h);
    }
    if (sw, sh) == (dst_w, dst_h) {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let src_stride = sw as usize * 4;
    let x_map: Vec<usize> = (0..dst_w)
        .map(|x| nearest_index(x, sw, dst_w) as usize * 4)
        .collect();

    let mut out = RgbaImage::new(dst_w, dst_h);
    let dst_raw: &mut [u8] = &mut out;
    dst_raw
        .par_chunks_mut(dst_w as usize * 4)
        .enumerate()
        .for_each(|(y, row_out)| {
            let sy = nearest_index(y as u32, sh, dst_h) as usize;
            let row_in = &src_raw[sy * src_stride..(sy + 1) * src_stride];
            for (x, &sx) in x_map.iter().enumerate() {
                row_out[x * 4..x * 4 + 4].copy_from_slice(&row_in[sx..sx + 4]);
            }
        });
    out
}

/// Clamp-to-edge bilinear sample at fractional source coordinates.
#[inline]
fn sample_bilinear(src: &RgbaImage, fx: f32, fy: f32) -> [f32; 4] {
    let (w, h) = src.dimensions();
    let x0 = fx.floor() as i32;
    let y0 = fy.floor() as i32;
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let px = |sx: i32, sy: i32| -> [f32; 4] {
        let cx = sx.clamp(0, w as i32 - 1) as u32;
        let cy = sy.clamp(0, h as i32 - 1) as u32;
        let p = src.get_pixel(cx, cy).0;
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    };

    let p00 = px(x0, y0);
    let p10 = px(x0 + 1, y0);
    let p01 = px(x0, y0 + 1);
    let p11 = px(x0 + 1, y0 + 1);

    let w00 = (1.0 - tx) * (1.0 - ty);
    let w10 = tx * (1.0 - ty);
    let w01 = (1.0 - tx) * ty;
    let w11 = tx * ty;

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        out[c] = p00[c] * w00 + p10[c] * w10 + p01[c] * w01 + p11[c] * w11;
    }
    out
}

/// Smooth resize: every destination pixel blends the four nearest source pixels.
pub fn resize_bilinear(src: &RgbaImage, dst_w: u32, dst_h: u32) -> RgbaImage {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 || dst_w == 0 || dst_h == 0 {
        return RgbaImage::new(dst_w, dst_h);
    }

    let sx_ratio = sw as f32 / dst_w as f32;
    let sy_ratio = sh as f32 / dst_h as f32;

    let mut out = RgbaImage::new(dst_w, dst_h);
    let dst_raw: &mut [u8] = &mut out;
    dst_raw
        .par_chunks_mut(dst_w as usize * 4)
        .enumerate()
        .for_each(|(y, row_out)| {
            let fy = (y as f32 + 0.5) * sy_ratio - 0.5;
            for x in 0..dst_w as usize {
                let fx = (x as f32 + 0.5) * sx_ratio - 0.5;
                let p = sample_bilinear(src, fx, fy);
                for c in 0..4 {
                    row_out[x * 4 + c] = p[c].round().clamp(0.0, 255.0) as u8;
                }
            }
        });
    out
}
