//! Layer 1 — digital footprint: metadata, filename, and container-format
//! heuristics. No pixel data is touched here.

use crate::config::{AI_KEYWORDS, AI_RESOLUTIONS};
use crate::decode::{DecodedImage, ImageFormat};
use crate::result::{LayerBuilder, LayerReport};

const NAME: &str = "digital_footprint";
const CONFIDENCE_CEILING: f64 = 0.95;
const CONFIDENCE_BASE: f64 = 0.6;
const CONFIDENCE_SCALE: f64 = 200.0;

/// A 1x1 image is trivially "square" and its single pixel dimension is
/// trivially a power of two; neither is the AI-training signal those
/// penalties are meant to catch, so both require a dimension above this
/// floor to fire.
const MIN_DIMENSION_FOR_GEOMETRY_PENALTIES: u32 = 1;

fn is_power_of_two(x: u32) -> bool {
    x > MIN_DIMENSION_FOR_GEOMETRY_PENALTIES && (x & (x - 1)) == 0
}

fn maximal_digit_run_count(s: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for c in s.chars() {
        if c.is_ascii_digit() {
            if !in_run {
                runs += 1;
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }
    runs
}

pub fn analyze(image: &DecodedImage, filename: &str) -> LayerReport {
    let mut layer = LayerBuilder::new(NAME);
    let exif_count = image.exif_entry_count;

    if exif_count == 0 {
        layer.penalize(35, "No EXIF metadata (strong AI indicator)");
    } else if exif_count < 10 {
        layer.penalize(20, format!("Minimal EXIF ({exif_count} entries)"));
    } else if exif_count < 20 {
        layer.penalize(10, format!("Limited EXIF ({exif_count} entries)"));
    } else {
        layer.note(format!("Rich EXIF data ({exif_count} entries)"));
    }
    layer.detail("exif_entry_count", exif_count as i64);

    let (w, h) = (image.width, image.height);
    if AI_RESOLUTIONS.contains(&w) || AI_RESOLUTIONS.contains(&h) {
        layer.penalize(20, format!("AI-typical dimension detected ({w}x{h})"));
    }
    if is_power_of_two(w) || is_power_of_two(h) {
        layer.penalize(15, "Power-of-2 dimension (AI training artifact)");
    }
    if w == h && w > MIN_DIMENSION_FOR_GEOMETRY_PENALTIES {
        layer.penalize(15, "Perfect 1:1 aspect ratio");
    }

    let lower_name = filename.to_ascii_lowercase();
    if let Some(keyword) = AI_KEYWORDS.iter().find(|kw| lower_name.contains(*kw)) {
        layer.penalize(40, format!("AI keyword in filename: '{keyword}'"));
    }

    let digit_runs = maximal_digit_run_count(filename);
    let underscores = filename.matches('_').count();
    if digit_runs >= 2 || underscores >= 2 {
        layer.penalize(10, "Generated filename pattern");
    }

    match image.format {
        ImageFormat::Png => layer.penalize(10, "PNG format (common for AI outputs)"),
        ImageFormat::Webp => layer.penalize(15, "WebP format (AI platform common)"),
        _ => {}
    }

    if let Some(declared) = image.declared_format {
        if declared != image.format {
            layer.detail(
                "filename_format_mismatch",
                format!("filename implies {} but content decoded as {}", declared.as_str(), image.format.as_str()),
            );
        }
    }

    if layer_is_clean(&layer) {
        layer.note("Metadata appears authentic");
    }

    layer.finish(CONFIDENCE_CEILING, CONFIDENCE_BASE, CONFIDENCE_SCALE)
}

fn layer_is_clean(layer: &LayerBuilder) -> bool {
    layer.current_score() == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ImageFormat;

    fn image(width: u32, height: u32, format: ImageFormat, exif: u32) -> DecodedImage {
        DecodedImage {
            rgb: vec![0u8; (width * height * 3) as usize],
            width,
            height,
            format,
            color_mode: "Rgb8".to_string(),
            exif_entry_count: exif,
            file_size_bytes: 100,
            declared_format: Some(format),
        }
    }

    #[test]
    fn one_pixel_black_png_matches_boundary_scenario_one() {
        let img = image(1, 1, ImageFormat::Png, 0);
        let report = analyze(&img, "x.png");
        assert_eq!(report.score, 45);
        assert!(report.findings.contains(&"No EXIF metadata (strong AI indicator)".to_string()));
        assert!(report.findings.contains(&"PNG format (common for AI outputs)".to_string()));
    }

    #[test]
    fn midjourney_filename_clamps_to_one_hundred() {
        let img = image(1024, 1024, ImageFormat::Png, 0);
        let report = analyze(&img, "midjourney_01.png");
        assert_eq!(report.score, 100);
        assert!(report
            .findings
            .contains(&"Power-of-2 dimension (AI training artifact)".to_string()));
        assert!(report.findings.contains(&"Perfect 1:1 aspect ratio".to_string()));
    }

    #[test]
    fn one_by_one_image_does_not_trigger_geometry_penalties() {
        let img = image(1, 1, ImageFormat::Jpeg, 20);
        let report = analyze(&img, "x.jpg");
        assert!(!report
            .findings
            .iter()
            .any(|f| f.contains("Power-of-2") || f.contains("1:1 aspect")));
    }

    #[test]
    fn rich_exif_square_jpeg_scores_fifty() {
        let img = image(512, 512, ImageFormat::Jpeg, 42);
        let report = analyze(&img, "photo.jpg");
        assert_eq!(report.score, 50);
    }

    #[test]
    fn power_of_two_flag_fires_once_regardless_of_dimension_count() {
        let img = image(512, 300, ImageFormat::Jpeg, 42);
        let report = analyze(&img, "photo.jpg");
        assert!(report
            .findings
            .iter()
            .filter(|f| f.contains("Power-of-2"))
            .count()
            <= 1);
    }

    #[test]
    fn confidence_never_exceeds_layer_ceiling() {
        let img = image(1024, 1024, ImageFormat::Webp, 0);
        let report = analyze(&img, "ai_generated_dream_1234_5678.webp");
        assert!(report.confidence <= CONFIDENCE_CEILING);
    }
}
