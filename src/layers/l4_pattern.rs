//! Layer 4 — pattern/semantic: texture patch statistics, 2-D
//! frequency-domain analysis, RGB channel correlation, histogram
//! smoothness, and compressibility. The most numerically involved layer;
//! every sub-signal is gated on a minimum-dimension requirement per the
//! table below.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::config::COMPRESSIBILITY_DEFAULT;
use crate::decode::DecodedImage;
use crate::numeric::{
    fft2d_log_magnitude, finite_or_zero, hann_window, histogram256, mean, pearson, std_dev, variance,
};
use crate::result::{LayerBuilder, LayerReport};

const NAME: &str = "semantic_analysis";
const CONFIDENCE_CEILING: f64 = 0.95;
const CONFIDENCE_BASE: f64 = 0.55;
const CONFIDENCE_SCALE: f64 = 180.0;
const MIN_DIMENSION_FOR_TEXTURE_AND_FREQUENCY: u32 = 64;

fn texture_patches(gray: &[f64], width: usize, height: usize) -> (f64, f64) {
    let mut block_means = Vec::new();
    let mut block_stds = Vec::new();
    let mut y = 0;
    while y + 32 <= height {
        let mut x = 0;
        while x + 32 <= width {
            let mut block = Vec::with_capacity(32 * 32);
            for dy in 0..32 {
                for dx in 0..32 {
                    block.push(gray[(y + dy) * width + (x + dx)]);
                }
            }
            block_means.push(mean(&block));
            block_stds.push(std_dev(&block));
            x += 32;
        }
        y += 32;
    }
    if block_means.len() < 4 {
        return (0.5, 100.0);
    }
    let similarity = (1.0 - std_dev(&block_stds) / (mean(&block_stds) + 1.0)).clamp(0.0, 1.0);
    let block_variance = variance(&block_means);
    (similarity, block_variance)
}

fn frequency_domain(gray: &[f64], width: usize, height: usize) -> (f64, f64) {
    let side = width.min(height).min(256);
    let top = (height - side) / 2;
    let left = (width - side) / 2;
    let window = hann_window(side);

    let mut patch = Vec::with_capacity(side * side);
    for y in 0..side {
        for x in 0..side {
            let value = gray[(top + y) * width + (left + x)];
            patch.push(value * window[y] * window[x]);
        }
    }

    let spectrum = fft2d_log_magnitude(&patch, side);
    let total: f64 = spectrum.iter().sum();
    let center = side as f64 / 2.0;
    let radius_cutoff = 0.35 * side as f64;

    let mut high_freq_sum = 0.0;
    for y in 0..side {
        for x in 0..side {
            let dx = x as f64 - center;
            let dy = y as f64 - center;
            if (dx * dx + dy * dy).sqrt() > radius_cutoff {
                high_freq_sum += spectrum[y * side + x];
            }
        }
    }
    let high_freq = high_freq_sum / (total + 1.0);

    let positive: Vec<f64> = spectrum.iter().copied().filter(|&m| m > 0.0).collect();
    let flatness = if positive.is_empty() {
        0.0
    } else {
        let log_mean = mean(&positive.iter().map(|v| (v + 1e-10).ln()).collect::<Vec<_>>());
        let geometric_mean = log_mean.exp();
        let arithmetic_mean = mean(&positive);
        (geometric_mean / (arithmetic_mean + 1e-10)).min(1.0)
    };

    (high_freq, flatness)
}

fn subsample_channel(rgb: &[u8], width: usize, height: usize, channel: usize, stride: usize) -> Vec<f64> {
    let mut samples = Vec::new();
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            samples.push(rgb[(y * width + x) * 3 + channel] as f64);
            x += stride;
        }
        y += stride;
    }
    samples
}

fn correlated(xs: &[f64], ys: &[f64]) -> f64 {
    if std_dev(xs) < 0.01 || std_dev(ys) < 0.01 {
        return 0.95;
    }
    let r = pearson(xs, ys);
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

fn channel_correlation(rgb: &[u8], width: usize, height: usize) -> f64 {
    let stride = (width.min(height) / 100).max(1);
    let r = subsample_channel(rgb, width, height, 0, stride);
    let g = subsample_channel(rgb, width, height, 1, stride);
    let b = subsample_channel(rgb, width, height, 2, stride);

    let rg = correlated(&r, &g).abs();
    let rb = correlated(&r, &b).abs();
    let gb = correlated(&g, &b).abs();
    (rg + rb + gb) / 3.0
}

fn histogram_smoothness(gray: &[f64]) -> (f64, usize) {
    let discretized: Vec<u8> = gray.iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect();
    let hist = histogram256(&discretized);
    let hist_f: Vec<f64> = hist.iter().map(|&c| c as f64).collect();
    let diffs: Vec<f64> = hist_f.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let smoothness = (1.0 - mean(&diffs) / (mean(&hist_f) + 1.0)).clamp(0.0, 1.0);
    let unique_count = hist.iter().filter(|&&c| c > 0).count();
    (smoothness, unique_count)
}

fn compressibility(rgb: &[u8], width: usize, height: usize) -> f64 {
    let mut downsampled = Vec::new();
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let idx = (y * width + x) * 3;
            downsampled.extend_from_slice(&rgb[idx..idx + 3]);
            x += 4;
        }
        y += 4;
    }
    if downsampled.is_empty() {
        return COMPRESSIBILITY_DEFAULT;
    }
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
    if encoder.write_all(&downsampled).is_err() {
        return COMPRESSIBILITY_DEFAULT;
    }
    match encoder.finish() {
        Ok(compressed) => 1.0 - compressed.len() as f64 / downsampled.len() as f64,
        Err(_) => COMPRESSIBILITY_DEFAULT,
    }
}

pub fn analyze(image: &DecodedImage) -> LayerReport {
    let mut layer = LayerBuilder::new(NAME);
    let gray = image.grayscale_f64();
    let width = image.width as usize;
    let height = image.height as usize;
    let large_enough =
        image.width >= MIN_DIMENSION_FOR_TEXTURE_AND_FREQUENCY && image.height >= MIN_DIMENSION_FOR_TEXTURE_AND_FREQUENCY;

    if large_enough {
        let (similarity, block_variance) = texture_patches(&gray, width, height);
        let similarity = finite_or_zero(similarity);
        let block_variance = finite_or_zero(block_variance);
        layer.detail("texture_similarity", similarity);
        layer.detail("texture_variance", block_variance);
        if similarity > 0.85 {
            layer.penalize(30, "Texture patches are highly self-similar");
        } else if similarity > 0.70 {
            layer.penalize(15, "Texture patches show elevated self-similarity");
        }
        if block_variance < 100.0 {
            layer.penalize(20, "Texture block means vary too little");
        }

        let (high_freq, flatness) = frequency_domain(&gray, width, height);
        let high_freq = finite_or_zero(high_freq);
        let flatness = finite_or_zero(flatness);
        layer.detail("high_freq_ratio", high_freq);
        layer.detail("spectral_flatness", flatness);
        if high_freq < 0.02 {
            layer.penalize(30, "High-frequency spectral energy is depleted");
        } else if high_freq < 0.05 {
            layer.penalize(15, "High-frequency spectral energy is low");
        }
        if flatness > 0.7 {
            layer.penalize(25, "Spectral flatness is unnaturally high");
        } else if flatness > 0.5 {
            layer.penalize(10, "Spectral flatness is elevated");
        }
    }

    let avg_corr = finite_or_zero(channel_correlation(&image.rgb, width, height));
    layer.detail("channel_correlation", avg_corr);
    if avg_corr > 0.92 {
        layer.penalize(25, "RGB channels are highly correlated");
    } else if avg_corr > 0.85 {
        layer.penalize(15, "RGB channels are moderately correlated");
    }

    let (smoothness, unique_count) = histogram_smoothness(&gray);
    let smoothness = finite_or_zero(smoothness);
    layer.detail("histogram_smoothness", smoothness);
    layer.detail("histogram_unique_count", unique_count as i64);
    if smoothness > 0.9 {
        layer.penalize(20, "Tonal histogram is unnaturally smooth");
    }
    if unique_count < 200 {
        layer.penalize(15, "Tonal histogram uses few distinct levels");
    }

    let ratio = finite_or_zero(compressibility(&image.rgb, width, height));
    layer.detail("compressibility", ratio);
    if ratio > 0.85 {
        layer.penalize(15, "Downsampled image compresses unusually well");
    }

    if layer.current_score() == 0 {
        layer.note("Pattern analysis appears natural");
    }

    layer.finish(CONFIDENCE_CEILING, CONFIDENCE_BASE, CONFIDENCE_SCALE)
}
