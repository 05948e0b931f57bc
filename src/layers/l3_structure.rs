//! Layer 3 — structure: edge statistics, dynamic range, gradient
//! consistency, symmetry, and local contrast, all on the grayscale plane.

use crate::decode::DecodedImage;
use crate::numeric::{finite_or_zero, mean, percentile, std_dev};
use crate::result::{LayerBuilder, LayerReport};

const NAME: &str = "lighting_geometry";
const CONFIDENCE_CEILING: f64 = 0.93;
const CONFIDENCE_BASE: f64 = 0.6;
const CONFIDENCE_SCALE: f64 = 200.0;

/// Gradient magnitude over the `(H-1) x (W-1)` cropped first-difference
/// grid, plus the two source difference components.
fn gradient_magnitude(gray: &[f64], width: usize, height: usize) -> Vec<f64> {
    let mut mag = Vec::with_capacity((height - 1) * (width - 1));
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let dx = gray[y * width + x + 1] - gray[y * width + x];
            let dy = gray[(y + 1) * width + x] - gray[y * width + x];
            mag.push((dx * dx + dy * dy).sqrt());
        }
    }
    mag
}

fn region_mean(gray: &[f64], width: usize, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> f64 {
    let mut samples = Vec::new();
    for y in rows {
        for x in cols.clone() {
            samples.push(gray[y * width + x]);
        }
    }
    mean(&samples)
}

fn local_contrast(gray: &[f64], width: usize, height: usize) -> f64 {
    let mut block_stds = Vec::new();
    let mut y = 0;
    while y + 16 <= height {
        let mut x = 0;
        while x + 16 <= width {
            let mut block = Vec::with_capacity(256);
            for dy in 0..16 {
                for dx in 0..16 {
                    block.push(gray[(y + dy) * width + (x + dx)]);
                }
            }
            block_stds.push(std_dev(&block));
            x += 16;
        }
        y += 16;
    }
    if block_stds.is_empty() {
        30.0
    } else {
        mean(&block_stds)
    }
}

pub fn analyze(image: &DecodedImage) -> LayerReport {
    let mut layer = LayerBuilder::new(NAME);
    let gray = image.grayscale_f64();
    let width = image.width as usize;
    let height = image.height as usize;

    let mag = if width >= 2 && height >= 2 {
        Some(gradient_magnitude(&gray, width, height))
    } else {
        None
    };

    if let Some(mag) = &mag {
        let edge_density = mag.iter().filter(|&&m| m > 30.0).count() as f64 / mag.len() as f64;
        let edge_uniformity = std_dev(mag) / (mean(mag) + 1.0);
        let edge_density = finite_or_zero(edge_density);
        let edge_uniformity = finite_or_zero(edge_uniformity);
        layer.detail("edge_density", edge_density);
        layer.detail("edge_uniformity", edge_uniformity);

        if edge_density < 0.05 {
            layer.penalize(25, "Edge density is very low for a natural photograph");
        } else if edge_density < 0.10 {
            layer.penalize(15, "Edge density is below typical natural range");
        }
        if edge_uniformity < 1.5 {
            layer.penalize(20, "Edge magnitudes are unnaturally uniform");
        }
    }

    let dynamic_range = finite_or_zero(percentile(&gray, 99.0) - percentile(&gray, 1.0));
    layer.detail("dynamic_range", dynamic_range);
    if dynamic_range < 100.0 {
        layer.penalize(20, "Dynamic range is narrow");
    } else if dynamic_range < 150.0 {
        layer.penalize(10, "Dynamic range is somewhat narrow");
    }

    if let Some(mag) = &mag {
        let gradient_consistency = finite_or_zero(std_dev(mag) / (mean(mag) + 1.0));
        layer.detail("gradient_consistency", gradient_consistency);
        if gradient_consistency < 2.0 {
            layer.penalize(20, "Gradient consistency is unnaturally tight");
        } else if gradient_consistency < 3.0 {
            layer.penalize(10, "Gradient consistency is somewhat tight");
        }
    }

    if width > 100 && height > 100 {
        let quarter_w = width / 4;
        let quarter_h = height / 4;
        let h_symmetry = finite_or_zero(
            1.0 - (region_mean(&gray, width, 0..height, 0..quarter_w)
                - region_mean(&gray, width, 0..height, width - quarter_w..width))
            .abs()
                / 255.0,
        );
        let v_symmetry = finite_or_zero(
            1.0 - (region_mean(&gray, width, 0..quarter_h, 0..width)
                - region_mean(&gray, width, height - quarter_h..height, 0..width))
            .abs()
                / 255.0,
        );
        layer.detail("h_symmetry", h_symmetry);
        layer.detail("v_symmetry", v_symmetry);
        if h_symmetry > 0.95 && v_symmetry > 0.95 {
            layer.penalize(15, "Image is unnaturally symmetric");
        }
    }

    let contrast = finite_or_zero(local_contrast(&gray, width, height));
    layer.detail("local_contrast", contrast);
    if contrast < 20.0 {
        layer.penalize(20, "Local contrast is low across blocks");
    } else if contrast < 35.0 {
        layer.penalize(10, "Local contrast is somewhat low");
    }

    if layer.current_score() == 0 {
        layer.note("Structural analysis appears natural");
    }

    layer.finish(CONFIDENCE_CEILING, CONFIDENCE_BASE, CONFIDENCE_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ImageFormat;

    fn image_from(width: u32, height: u32, rgb: Vec<u8>) -> DecodedImage {
        DecodedImage {
            rgb,
            width,
            height,
            format: ImageFormat::Png,
            color_mode: "Rgb8".to_string(),
            exif_entry_count: 10,
            file_size_bytes: 100,
            declared_format: Some(ImageFormat::Png),
        }
    }

    #[test]
    fn one_pixel_image_skips_symmetry_and_edges_without_panicking() {
        let img = image_from(1, 1, vec![0, 0, 0]);
        let report = analyze(&img);
        assert!((0..=100).contains(&report.score));
    }

    #[test]
    fn flat_image_triggers_low_contrast_and_dynamic_range_penalties() {
        let img = image_from(200, 200, vec![128; 200 * 200 * 3]);
        let report = analyze(&img);
        assert!(report.score > 0);
    }

    #[test]
    fn small_square_skips_symmetry_check() {
        let img = image_from(64, 64, vec![64; 64 * 64 * 3]);
        let report = analyze(&img);
        assert!(!report.details.contains_key("h_symmetry"));
    }

    #[test]
    fn findings_follow_spec_order_edges_range_gradient_symmetry_contrast() {
        // Flat 200x200 image: zero gradients everywhere, so every
        // penalty group in the table fires and findings accumulate in
        // the order edges -> dynamic range -> gradient consistency ->
        // symmetry -> local contrast.
        let img = image_from(200, 200, vec![128; 200 * 200 * 3]);
        let report = analyze(&img);

        let pos = |needle: &str| {
            report
                .findings
                .iter()
                .position(|f| f.contains(needle))
                .unwrap_or_else(|| panic!("expected a finding containing '{needle}', got {:?}", report.findings))
        };

        let edge_idx = pos("Edge density");
        let range_idx = pos("Dynamic range");
        let gradient_idx = pos("Gradient consistency");
        let symmetry_idx = pos("unnaturally symmetric");
        let contrast_idx = pos("Local contrast");

        assert!(edge_idx < range_idx);
        assert!(range_idx < gradient_idx);
        assert!(gradient_idx < symmetry_idx);
        assert!(symmetry_idx < contrast_idx);
    }
}
