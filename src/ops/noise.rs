// ============================================================================
// NOISE MODEL — one scalar per grain cell, per texture family
// ============================================================================

use std::f64::consts::PI;

use crate::ops::rng::Mulberry32;
use crate::settings::TextureType;

/// Spread assumed by the Gaussian rescale: `(raw + 3σ) / 6σ`.
const GAUSSIAN_SIGMA_SPAN: f64 = 3.0;
/// Fraction of `intensity` that becomes the speckle hit probability.
const SPECKLE_DENSITY: f64 = 0.8;
/// Value used for cells that are not speckles.
const SPECKLE_FLAT: f64 = 0.5;

/// Draw one noise value for `texture`.
///
/// Roughly in `[0, 1]`.  GAUSSIAN is a fixed linear rescale of a Box-Muller
/// sample and can leave that range; it is deliberately not clamped here, the
/// alpha byte conversion clamps later.  `intensity` only matters for SPECKLE,
/// where it sets how often a cell becomes a speckle.
pub fn sample(texture: TextureType, rng: &mut Mulberry32, intensity: f64) -> f64 {
    match texture {
        TextureType::Uniform => rng.next_f64(),
        TextureType::Gaussian => {
            // 1 - rng() keeps u out of ln(0).
            let u = 1.0 - rng.next_f64();
            let v = 1.0 - rng.next_f64();
            let raw = (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos();
            (raw + GAUSSIAN_SIGMA_SPAN) / (2.0 * GAUSSIAN_SIGMA_SPAN)
        }
        TextureType::Speckle => {
            let r1 = rng.next_f64();
            if r1 > 1.0 - intensity * SPECKLE_DENSITY {
                rng.next_f64()
            } else {
                SPECKLE_FLAT
            }
        }
        TextureType::Film => (rng.next_f64() + rng.next_f64() + rng.next_f64()) / 3.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws_consumed(texture: TextureType, intensity: f64, seed: i32) -> u32 {
        let mut rng = Mulberry32::new(seed);
        sample(texture, &mut rng, intensity);
        let mut probe = Mulberry32::new(seed);
        let mut n = 0;
        while probe.state() != rng.state() {
            probe.next_f64();
            n += 1;
        }
        n
    }

    #[test]
    fn uniform_is_the_raw_draw() {
        let mut a = Mulberry32::new(1);
        let mut b = Mulberry32::new(1);
        assert_eq!(sample(TextureType::Uniform, &mut a, 1.0), b.next_f64());
    }

    #[test]
    fn draw_counts_per_family() {
        assert_eq!(draws_consumed(TextureType::Uniform, 1.0, 5), 1);
        assert_eq!(draws_consumed(TextureType::Gaussian, 1.0, 5), 2);
        assert_eq!(draws_consumed(TextureType::Film, 1.0, 5), 3);
        // Zero intensity: never a speckle, one draw only.
        assert_eq!(draws_consumed(TextureType::Speckle, 0.0, 5), 1);
    }

    #[test]
    fn speckle_without_intensity_is_flat() {
        let mut rng = Mulberry32::new(11);
        for _ in 0..1000 {
            assert_eq!(sample(TextureType::Speckle, &mut rng, 0.0), 0.5);
        }
    }

    #[test]
    fn speckle_at_full_intensity_hits_about_eighty_percent() {
        let mut rng = Mulberry32::new(21);
        let n = 20_000;
        let mut hits = 0;
        for _ in 0..n {
            let before = rng.state();
            sample(TextureType::Speckle, &mut rng, 1.0);
            let mut probe = Mulberry32::new(before as i32);
            probe.next_f64();
            if probe.state() != rng.state() {
                hits += 1;
            }
        }
        let ratio = hits as f64 / n as f64;
        assert!((ratio - 0.8).abs() < 0.02, "ratio {ratio}");
    }

    #[test]
    fn gaussian_centres_on_half() {
        let mut rng = Mulberry32::new(99);
        let n = 50_000;
        let mean: f64 = (0..n)
            .map(|_| sample(TextureType::Gaussian, &mut rng, 1.0))
            .sum::<f64>()
            / n as f64;
        assert!((mean - 0.5).abs() < 0.01, "mean {mean}");
    }

    #[test]
    fn film_stays_in_unit_range_and_is_tighter_than_uniform() {
        let mut rng = Mulberry32::new(4);
        let n = 20_000;
        let film: Vec<f64> = (0..n).map(|_| sample(TextureType::Film, &mut rng, 1.0)).collect();
        assert!(film.iter().all(|v| (0.0..1.0).contains(v)));
        let mean = film.iter().sum::<f64>() / n as f64;
        let var = film.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        // Uniform variance is 1/12; the three-draw mean has 1/36.
        assert!(var < 1.0 / 24.0, "variance {var}");
    }
}
