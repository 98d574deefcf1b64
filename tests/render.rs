//! End-to-end behaviour of `grainy::render` through the public API.

use grainy::ops::compositor::noise_buffer;
use grainy::ops::mask::{MASK_FLOOR, mask_multiplier};
use grainy::ops::rng::Mulberry32;
use grainy::{GrainSettings, TextureType, render};

fn small(width: u32, height: u32) -> GrainSettings {
    GrainSettings { width, height, ..Default::default() }
}

#[test]
fn same_settings_same_bytes() {
    for texture in TextureType::ALL {
        let s = GrainSettings { texture, randomness: 0.7, roughness: 0.3, monochrome: false, ..small(120, 80) };
        assert_eq!(render(&s), render(&s), "{} not deterministic", texture.label());
    }
}

#[test]
fn different_seed_different_bytes() {
    let a = GrainSettings { seed: 1, ..small(64, 64) };
    let b = GrainSettings { seed: 2, ..small(64, 64) };
    assert_ne!(render(&a), render(&b));
}

#[test]
fn flat_uniform_scenario() {
    let s = GrainSettings {
        intensity: 1.0,
        scale: 1.0,
        roughness: 0.0,
        opacity: 1.0,
        randomness: 0.0,
        seed: 1,
        bg_color: "#FFFFFF".into(),
        grain_color: "#000000".into(),
        texture: TextureType::Uniform,
        monochrome: true,
        ..small(100, 100)
    };
    let img = render(&s);
    assert_eq!(img.dimensions(), (100, 100));

    // One draw per pixel, row-major; black over white at alpha round(v*255).
    let mut rng = Mulberry32::new(1);
    for (i, px) in img.pixels().enumerate() {
        let alpha = (rng.next_f64() * 255.0).round();
        let expected = (255.0 * (1.0 - alpha / 255.0)).round() as u8;
        assert_eq!(px.0, [expected, expected, expected, 255], "pixel {}", i);
    }
}

#[test]
fn uniform_alpha_scales_linearly_with_intensity() {
    let quarter = noise_buffer(&GrainSettings { intensity: 0.25, ..small(50, 50) });
    let half = noise_buffer(&GrainSettings { intensity: 0.5, ..small(50, 50) });
    for (q, h) in quarter.pixels().zip(half.pixels()) {
        let diff = h[3] as i32 - 2 * q[3] as i32;
        assert!(diff.abs() <= 1, "alpha {} vs {}", q[3], h[3]);
    }
}

#[test]
fn clumping_never_drops_below_floor() {
    for r in [0.06, 0.3, 0.7, 1.0] {
        for v in 0..=255u32 {
            let m = mask_multiplier(v as f64 / 255.0, r);
            assert!((MASK_FLOOR..=1.0).contains(&m), "r={} v={} m={}", r, v, m);
        }
    }
}

#[test]
fn randomness_below_threshold_is_a_no_op() {
    let off = GrainSettings { randomness: 0.0, ..small(90, 60) };
    let tiny = GrainSettings { randomness: 0.03, ..small(90, 60) };
    assert_eq!(render(&off), render(&tiny));
}

#[test]
fn clumping_changes_the_image() {
    let off = GrainSettings { randomness: 0.0, ..small(90, 60) };
    let on = GrainSettings { randomness: 0.8, ..small(90, 60) };
    assert_ne!(render(&off), render(&on));
}

#[test]
fn huge_dimensions_are_clamped() {
    let s = small(999_999, 999_999);
    assert_eq!(s.output_dimensions(), (5000, 5000));
    assert_eq!(s.noise_dimensions(), (5000, 5000));
    let s = GrainSettings { scale: 20.0, ..s };
    assert_eq!(s.noise_dimensions(), (250, 250));

    let img = render(&s);
    assert_eq!(img.dimensions(), (5000, 5000));
}

#[test]
fn scaled_cells_are_uniform_blocks() {
    let s = GrainSettings { scale: 10.0, intensity: 1.0, ..small(100, 100) };
    assert_eq!(s.noise_dimensions(), (10, 10));
    let img = render(&s);
    for by in 0..10 {
        for bx in 0..10 {
            let first = *img.get_pixel(bx * 10, by * 10);
            for y in by * 10..by * 10 + 10 {
                for x in bx * 10..bx * 10 + 10 {
                    assert_eq!(*img.get_pixel(x, y), first, "block ({}, {})", bx, by);
                }
            }
        }
    }
}

#[test]
fn zero_intensity_is_flat_background() {
    let s = GrainSettings { intensity: 0.0, bg_color: "#336699".into(), ..small(40, 40) };
    assert!(render(&s).pixels().all(|p| p.0 == [0x33, 0x66, 0x99, 255]));
}

#[test]
fn zero_opacity_is_flat_background() {
    let s = GrainSettings { opacity: 0.0, intensity: 1.0, bg_color: "#000000".into(), ..small(40, 40) };
    assert!(render(&s).pixels().all(|p| p.0 == [0, 0, 0, 255]));
}

#[test]
fn roughness_softens_the_grain() {
    let sharp = GrainSettings { intensity: 1.0, ..small(80, 80) };
    let soft = GrainSettings { roughness: 0.5, ..sharp.clone() };
    let a = render(&sharp);
    let b = render(&soft);
    assert_ne!(a, b);

    let spread = |img: &image::RgbaImage| {
        let vals: Vec<f64> = img.pixels().map(|p| p[0] as f64).collect();
        let mean = vals.iter().sum::<f64>() / vals.len() as f64;
        vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / vals.len() as f64
    };
    assert!(spread(&b) < spread(&a));
}

#[test]
fn colour_mode_produces_tinted_grain() {
    let s = GrainSettings { monochrome: false, intensity: 1.0, bg_color: "#000000".into(), ..small(60, 60) };
    let img = render(&s);
    assert!(img.pixels().any(|p| p[0] != p[1] || p[1] != p[2]));
}
