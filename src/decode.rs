//! Byte-stream decoding: turns raw file bytes plus an advisory filename
//! into a [`DecodedImage`], always normalized to 8-bit RGB.

use std::io::Cursor;

use image::{GenericImageView, ImageEncoder};

use crate::AnalyzerError;

/// Image container format, as detected from the decoded byte stream
/// (not from the filename extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Other,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Webp => "WEBP",
            ImageFormat::Other => "OTHER",
        }
    }

    fn from_image_crate(fmt: image::ImageFormat) -> Self {
        match fmt {
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            image::ImageFormat::Png => ImageFormat::Png,
            image::ImageFormat::WebP => ImageFormat::Webp,
            _ => ImageFormat::Other,
        }
    }

    /// Format implied by a filename's extension, for the informational
    /// extension/content mismatch check. `None` when no extension maps
    /// to a known format.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }
}

/// A fully decoded image: RGB8 pixel buffer plus the metadata the
/// analyzer layers need.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub color_mode: String,
    pub exif_entry_count: u32,
    pub file_size_bytes: u64,
    pub declared_format: Option<ImageFormat>,
}

impl DecodedImage {
    /// Row-major grayscale plane: the per-pixel mean of the three
    /// channels, as `f64` for downstream numeric work.
    pub fn grayscale_f64(&self) -> Vec<f64> {
        self.rgb
            .chunks_exact(3)
            .map(|px| (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0)
            .collect()
    }
}

/// Decode `bytes` (with `filename` used only as an extension hint) into
/// a [`DecodedImage`]. Always normalizes to RGB8.
pub fn decode(bytes: &[u8], filename: &str) -> Result<DecodedImage, AnalyzerError> {
    if bytes.is_empty() {
        return Err(AnalyzerError::InvalidInput("empty byte stream".to_string()));
    }

    let guessed_format = image::guess_format(bytes)
        .map_err(|e| AnalyzerError::DecodeFailure(format!("unrecognized image format: {e}")))?;

    let dynamic = image::load_from_memory_with_format(bytes, guessed_format)
        .map_err(|e| AnalyzerError::DecodeFailure(format!("codec rejected input: {e}")))?;

    let (width, height) = dynamic.dimensions();
    if width == 0 || height == 0 {
        return Err(AnalyzerError::DecodeFailure(
            "decoded image has a zero dimension".to_string(),
        ));
    }

    let color_mode = format!("{:?}", dynamic.color());
    let rgb_image = dynamic.to_rgb8();
    let rgb = rgb_image.into_raw();

    let exif_entry_count = count_exif_entries(bytes);

    Ok(DecodedImage {
        rgb,
        width,
        height,
        format: ImageFormat::from_image_crate(guessed_format),
        color_mode,
        exif_entry_count,
        file_size_bytes: bytes.len() as u64,
        declared_format: ImageFormat::from_filename(filename),
    })
}

/// Count top-level EXIF/TIFF IFD entries. Any parse failure (no EXIF
/// segment present, corrupt data, or a format that carries no EXIF at
/// all) reduces to 0 — never propagated as an error.
fn count_exif_entries(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let exif_reader = exif::Reader::new();
    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif_data) => exif_data.fields().count() as u32,
        Err(_) => 0,
    }
}

/// Re-encode `image` as JPEG at `quality`, entirely in memory.
pub fn encode_jpeg_in_memory(rgb: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder.write_image(rgb, width, height, image::ExtendedColorType::Rgb8)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_pixel_black_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0]));
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_one_pixel_png_to_rgb8() {
        let bytes = one_pixel_black_png();
        let decoded = decode(&bytes, "x.png").unwrap();
        assert_eq!(decoded.width, 1);
        assert_eq!(decoded.height, 1);
        assert_eq!(decoded.rgb, vec![0, 0, 0]);
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(decoded.exif_entry_count, 0);
    }

    #[test]
    fn empty_bytes_are_invalid_input() {
        let err = decode(&[], "x.png").unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidInput(_)));
    }

    #[test]
    fn garbage_bytes_are_decode_failure() {
        let err = decode(&[0u8, 1, 2, 3, 4, 5, 6, 7], "x.png").unwrap_err();
        assert!(matches!(err, AnalyzerError::DecodeFailure(_)));
    }

    #[test]
    fn filename_format_hint_is_case_insensitive() {
        assert_eq!(ImageFormat::from_filename("a.JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_filename("a.webp"), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::from_filename("a.txt"), None);
    }
}
