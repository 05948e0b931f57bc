//! Four-layer forensic scoring engine for still-image authenticity
//! analysis: digital footprint, pixel physics, structure, and
//! pattern/semantic layers feed a consensus-tempered fusion stage.

pub mod config;
pub mod decode;
pub mod fusion;
pub mod layers;
pub mod numeric;
pub mod result;

use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use config::ENGINE_VERSION;
use decode::DecodedImage;
use result::{AnalysisResult, FileInfo, LayerReports, Metadata};

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("decode failure: {0}")]
    DecodeFailure(String),

    #[error("internal numeric error: {0}")]
    InternalNumeric(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Run the full pipeline — decode, run the four layers, fuse, and
/// assemble — on `bytes` with `filename` used as an extension hint.
pub fn analyze(bytes: &[u8], filename: &str) -> Result<AnalysisResult> {
    let started = Instant::now();
    tracing::debug!(filename, byte_len = bytes.len(), "starting analysis");

    let image = decode::decode(bytes, filename)?;

    let ((l1, l2), (l3, l4)) = rayon::join(
        || rayon::join(|| run_l1(&image, filename), || run_l2(&image)),
        || rayon::join(|| run_l3(&image), || run_l4(&image)),
    );

    let fused = fusion::fuse(l1.score, l2.score, l3.score, l4.score);

    let file_info = FileInfo {
        filename: filename.to_string(),
        declared_format: image.declared_format.map(|f| f.as_str().to_string()),
        format: image.format.as_str().to_string(),
        width: image.width,
        height: image.height,
        file_size_bytes: image.file_size_bytes,
    };

    let result = AnalysisResult {
        id: Uuid::new_v4(),
        verdict: fused.verdict,
        confidence: fused.confidence,
        overall_score: fused.overall_score,
        processing_time_seconds: started.elapsed().as_secs_f64(),
        created_at: chrono::Utc::now(),
        layers: LayerReports {
            digital_footprint: l1,
            pixel_physics: l2,
            lighting_geometry: l3,
            semantic_analysis: l4,
        },
        metadata: Metadata {
            file_info,
            analysis_timestamp: chrono::Utc::now(),
            engine_version: ENGINE_VERSION,
        },
    };

    tracing::info!(
        verdict = ?result.verdict,
        overall_score = result.overall_score,
        elapsed_seconds = result.processing_time_seconds,
        "analysis complete"
    );

    Ok(result)
}

fn run_l1(image: &DecodedImage, filename: &str) -> result::LayerReport {
    let report = layers::l1_footprint::analyze(image, filename);
    tracing::trace!(layer = "digital_footprint", score = report.score, "layer complete");
    report
}

fn run_l2(image: &DecodedImage) -> result::LayerReport {
    let report = layers::l2_pixel_physics::analyze(image);
    tracing::trace!(layer = "pixel_physics", score = report.score, "layer complete");
    report
}

fn run_l3(image: &DecodedImage) -> result::LayerReport {
    let report = layers::l3_structure::analyze(image);
    tracing::trace!(layer = "lighting_geometry", score = report.score, "layer complete");
    report
}

fn run_l4(image: &DecodedImage) -> result::LayerReport {
    let report = layers::l4_pattern::analyze(image);
    tracing::trace!(layer = "semantic_analysis", score = report.score, "layer complete");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32, value: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([value, value, value]));
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn analyze_produces_result_within_invariants() {
        let bytes = encode_png(200, 200, 128);
        let result = analyze(&bytes, "photo.png").unwrap();
        assert!((0.0..=100.0).contains(&result.overall_score));
        assert!((0..=100).contains(&result.layers.digital_footprint.score));
        assert!((0..=100).contains(&result.layers.pixel_physics.score));
        assert!((0..=100).contains(&result.layers.lighting_geometry.score));
        assert!((0..=100).contains(&result.layers.semantic_analysis.score));
        assert!(result.confidence >= 0.0 && result.confidence <= 1.0);
        assert!(!result.layers.digital_footprint.findings.is_empty());
    }

    #[test]
    fn determinism_same_bytes_same_scores() {
        let bytes = encode_png(128, 128, 77);
        let a = analyze(&bytes, "a.png").unwrap();
        let b = analyze(&bytes, "a.png").unwrap();
        assert_eq!(a.overall_score, b.overall_score);
        assert_eq!(a.verdict, b.verdict);
        assert_eq!(a.layers.digital_footprint.score, b.layers.digital_footprint.score);
    }

    #[test]
    fn filename_independence_only_affects_l1() {
        let bytes = encode_png(128, 128, 77);
        let a = analyze(&bytes, "photo.png").unwrap();
        let b = analyze(&bytes, "midjourney_ai_generated.png").unwrap();
        assert_eq!(a.layers.pixel_physics.score, b.layers.pixel_physics.score);
        assert_eq!(a.layers.lighting_geometry.score, b.layers.lighting_geometry.score);
        assert_eq!(a.layers.semantic_analysis.score, b.layers.semantic_analysis.score);
    }

    #[test]
    fn empty_bytes_is_invalid_input() {
        let err = analyze(&[], "x.png").unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidInput(_)));
    }
}
