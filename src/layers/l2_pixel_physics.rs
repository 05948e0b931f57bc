//! Layer 2 — pixel physics: error level analysis, noise uniformity,
//! color statistics, block artifacts, and skewness, all computed on the
//! grayscale plane (and per-channel RGB where noted).

use crate::config::{ELA_DEFAULT, ELA_JPEG_QUALITY};
use crate::decode::{encode_jpeg_in_memory, DecodedImage};
use crate::numeric::{finite_or_zero, histogram256, mean, shannon_entropy, skewness, std_dev};
use crate::result::{LayerBuilder, LayerReport};

const NAME: &str = "pixel_physics";
const CONFIDENCE_CEILING: f64 = 0.95;
const CONFIDENCE_BASE: f64 = 0.65;
const CONFIDENCE_SCALE: f64 = 200.0;

fn error_level_analysis(image: &DecodedImage) -> f64 {
    let encoded = match encode_jpeg_in_memory(&image.rgb, image.width, image.height, ELA_JPEG_QUALITY) {
        Ok(bytes) => bytes,
        Err(_) => return ELA_DEFAULT,
    };
    let decoded = match image::load_from_memory(&encoded) {
        Ok(img) => img.to_rgb8(),
        Err(_) => return ELA_DEFAULT,
    };
    if decoded.width() != image.width || decoded.height() != image.height {
        return ELA_DEFAULT;
    }
    let diffs: Vec<f64> = image
        .rgb
        .iter()
        .zip(decoded.as_raw().iter())
        .map(|(a, b)| (*a as f64 - *b as f64).abs())
        .collect();
    std_dev(&diffs)
}

/// Disjoint 8x8 patches spaced 16 apart (so alternate tile positions in
/// an 8-stride grid are skipped), variance kept only for mid-brightness
/// patches.
fn noise_uniformity(gray: &[f64], width: usize, height: usize) -> f64 {
    let mut variances = Vec::new();
    let mut y = 0;
    while y + 8 <= height {
        let mut x = 0;
        while x + 8 <= width {
            let mut patch = Vec::with_capacity(64);
            for dy in 0..8 {
                for dx in 0..8 {
                    patch.push(gray[(y + dy) * width + (x + dx)]);
                }
            }
            let m = mean(&patch);
            if m > 40.0 && m < 215.0 {
                variances.push(crate::numeric::variance(&patch));
            }
            x += 16;
        }
        y += 16;
    }
    if variances.len() < 10 {
        return 0.5;
    }
    (std_dev(&variances) / (mean(&variances) + 1.0)).min(1.0)
}

fn color_statistics(rgb: &[u8]) -> (f64, f64) {
    let mut r = Vec::with_capacity(rgb.len() / 3);
    let mut g = Vec::with_capacity(rgb.len() / 3);
    let mut b = Vec::with_capacity(rgb.len() / 3);
    let mut sat_samples = Vec::with_capacity(rgb.len() / 3);
    for px in rgb.chunks_exact(3) {
        r.push(px[0]);
        g.push(px[1]);
        b.push(px[2]);
        let hi = px[0].max(px[1]).max(px[2]);
        let lo = px[0].min(px[1]).min(px[2]);
        sat_samples.push((hi - lo) as f64);
    }
    let entropies: Vec<f64> = [r, g, b]
        .iter()
        .map(|channel| shannon_entropy(&histogram256(channel)))
        .collect();
    let color_entropy = mean(&entropies);
    let sat_std = std_dev(&sat_samples);
    (color_entropy, sat_std)
}

fn block_artifacts(gray: &[f64], width: usize, height: usize) -> f64 {
    let mut ratios = Vec::new();
    let mut i = 8usize;
    while i < height.min(200) {
        let row = |idx: usize| &gray[idx * width..(idx + 1) * width];
        let boundary = mean(
            &row(i)
                .iter()
                .zip(row(i - 1).iter())
                .map(|(a, b)| (a - b).abs())
                .collect::<Vec<_>>(),
        );
        let interior = mean(
            &row(i - 1)
                .iter()
                .zip(row(i - 2).iter())
                .map(|(a, b)| (a - b).abs())
                .collect::<Vec<_>>(),
        );
        if interior > 0.0 {
            ratios.push(boundary / (interior + 1.0));
        }
        i += 8;
    }
    if ratios.is_empty() {
        0.5
    } else {
        mean(&ratios)
    }
}

pub fn analyze(image: &DecodedImage) -> LayerReport {
    let mut layer = LayerBuilder::new(NAME);
    let gray = image.grayscale_f64();
    let width = image.width as usize;
    let height = image.height as usize;

    let ela = error_level_analysis(image);
    let ela = finite_or_zero(ela);
    layer.detail("ela", ela);
    if ela < 5.0 {
        layer.penalize(40, "Error level analysis uniformity indicates AI-typical compression");
    } else if ela < 15.0 {
        layer.penalize(25, "Error level analysis shows low compression variance");
    } else if ela < 30.0 {
        layer.penalize(10, "Error level analysis slightly below natural-photo range");
    }

    let noise = finite_or_zero(noise_uniformity(&gray, width, height));
    layer.detail("noise_uniformity", noise);
    if noise < 0.15 {
        layer.penalize(35, "Sensor noise is unnaturally uniform across patches");
    } else if noise < 0.25 {
        layer.penalize(25, "Sensor noise variation is below natural levels");
    } else if noise < 0.40 {
        layer.penalize(15, "Sensor noise variation is somewhat low");
    }

    let (color_entropy, sat_std) = color_statistics(&image.rgb);
    let color_entropy = finite_or_zero(color_entropy);
    let sat_std = finite_or_zero(sat_std);
    layer.detail("color_entropy", color_entropy);
    layer.detail("sat_std", sat_std);
    if color_entropy < 5.5 {
        layer.penalize(20, "Color channel entropy is low");
    }
    if sat_std < 30.0 {
        layer.penalize(15, "Saturation variance is low");
    }

    let block = finite_or_zero(block_artifacts(&gray, width, height));
    layer.detail("block_artifact_ratio", block);
    if block < 0.5 {
        layer.penalize(15, "Block boundary discontinuities are unusually smooth");
    }

    let skew = finite_or_zero(skewness(&gray));
    layer.detail("skewness", skew);
    if skew.abs() < 0.1 {
        layer.penalize(15, "Pixel intensity distribution is unnaturally symmetric");
    }

    if layer.current_score() == 0 {
        layer.note("Pixel analysis inconclusive");
    }

    layer.finish(CONFIDENCE_CEILING, CONFIDENCE_BASE, CONFIDENCE_SCALE)
}
