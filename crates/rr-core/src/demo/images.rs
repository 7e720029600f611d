//! Synthetic images for the demo report.

use image::{DynamicImage, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DUMMY_WIDTH: u32 = 300;
pub const DUMMY_HEIGHT: u32 = 200;

const BACKGROUND: Rgb<u8> = Rgb([220, 220, 220]);
const BORDER: Rgb<u8> = Rgb([180, 180, 180]);
const BORDER_INSET: u32 = 10;

pub const HISTOGRAM_WIDTH: u32 = 600;
pub const HISTOGRAM_HEIGHT: u32 = 420;
pub const HISTOGRAM_SEED: u64 = 42;
pub const HISTOGRAM_SAMPLES: usize = 200;
pub const HISTOGRAM_BINS: usize = 25;

const STEELBLUE: Rgb<u8> = Rgb([70, 130, 180]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const MARGIN: u32 = 30;

/// A light gray placeholder with an inset border and a colored band
/// identifying `label`.
///
/// The band color is a hash of the label, so two dummies with different
/// labels are visually distinct and a given label always looks the same.
pub fn dummy_image(label: &str) -> DynamicImage {
    let mut img = RgbImage::from_pixel(DUMMY_WIDTH, DUMMY_HEIGHT, BACKGROUND);

    let (left, top) = (BORDER_INSET, BORDER_INSET);
    let (right, bottom) = (DUMMY_WIDTH - BORDER_INSET - 1, DUMMY_HEIGHT - BORDER_INSET - 1);
    for x in left..=right {
        img.put_pixel(x, top, BORDER);
        img.put_pixel(x, bottom, BORDER);
    }
    for y in top..=bottom {
        img.put_pixel(left, y, BORDER);
        img.put_pixel(right, y, BORDER);
    }

    let band = label_color(label);
    let band_top = DUMMY_HEIGHT / 2 - 12;
    for y in band_top..band_top + 24 {
        for x in left + 20..=right - 20 {
            img.put_pixel(x, y, band);
        }
    }

    DynamicImage::ImageRgb8(img)
}

fn label_color(label: &str) -> Rgb<u8> {
    // FNV-1a
    let hash = label.bytes().fold(0x811c_9dc5_u32, |h, b| {
        (h ^ u32::from(b)).wrapping_mul(0x0100_0193)
    });
    let [r, g, b, _] = hash.to_le_bytes();
    // Keep the band darker than the background.
    Rgb([r / 2 + 40, g / 2 + 40, b / 2 + 40])
}

/// Draw `HISTOGRAM_SAMPLES` normal(100, 15) samples from a fixed seed.
pub fn histogram_samples() -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(HISTOGRAM_SEED);
    (0..HISTOGRAM_SAMPLES)
        .map(|_| 100.0 + 15.0 * standard_normal(&mut rng))
        .collect()
}

/// Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Bin `samples` into `bins` equal-width buckets spanning their range.
pub fn bin_counts(samples: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if samples.is_empty() || bins == 0 {
        return counts;
    }
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;
    for &s in samples {
        let idx = if width > 0.0 {
            (((s - min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }
    counts
}

/// A bar chart of [`histogram_samples`] on a white canvas.
pub fn fake_histogram() -> DynamicImage {
    let counts = bin_counts(&histogram_samples(), HISTOGRAM_BINS);
    let mut img = RgbImage::from_pixel(HISTOGRAM_WIDTH, HISTOGRAM_HEIGHT, WHITE);

    let plot_w = HISTOGRAM_WIDTH - 2 * MARGIN;
    let plot_h = HISTOGRAM_HEIGHT - 2 * MARGIN;
    let baseline = HISTOGRAM_HEIGHT - MARGIN;
    let peak = counts.iter().copied().max().unwrap_or(0).max(1);
    let bar_w = plot_w / HISTOGRAM_BINS as u32;

    for (i, &count) in counts.iter().enumerate() {
        let bar_h = (count as u64 * plot_h as u64 / peak as u64) as u32;
        let x0 = MARGIN + i as u32 * bar_w;
        // One pixel gap between bars.
        for x in x0..x0 + bar_w.saturating_sub(1) {
            for y in baseline - bar_h..baseline {
                img.put_pixel(x, y, STEELBLUE);
            }
        }
    }

    for x in MARGIN..HISTOGRAM_WIDTH - MARGIN {
        img.put_pixel(x, baseline, AXIS);
    }
    for y in MARGIN..=baseline {
        img.put_pixel(MARGIN, y, AXIS);
    }

    DynamicImage::ImageRgb8(img)
}
