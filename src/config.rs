//! Fixed configuration tables for the scoring engine.
//!
//! Everything here is a compile-time constant: no `lazy_static`, no
//! `OnceCell`, nothing that needs initializing or locking. Thresholds are
//! design constants, not runtime-tunable (see spec Non-goals).

/// Substring keywords (already lowercase) that mark a filename as
/// AI-platform-generated. First match only contributes a penalty.
pub const AI_KEYWORDS: &[&str] = &[
    "midjourney",
    "dalle",
    "dall-e",
    "stable",
    "diffusion",
    "ai",
    "generated",
    "prompt",
    "sd_",
    "mj_",
    "openai",
    "flux",
    "runway",
    "pika",
    "ideogram",
    "leonardo",
    "firefly",
    "imagen",
    "kandinsky",
    "deepai",
    "craiyon",
    "nightcafe",
    "artbreeder",
    "dream",
    "neural",
    "synthetic",
];

/// Width/height values that diffusion/GAN training pipelines favor.
pub const AI_RESOLUTIONS: &[u32] = &[
    256, 512, 768, 1024, 1080, 1152, 1344, 1536, 2048, 4096,
];

/// JPEG quality used to re-encode for Error Level Analysis.
pub const ELA_JPEG_QUALITY: u8 = 85;

/// Neutral ELA standard deviation used when re-encode/decode fails.
pub const ELA_DEFAULT: f64 = 15.0;

/// Neutral compressibility ratio used when deflate fails.
pub const COMPRESSIBILITY_DEFAULT: f64 = 0.5;

/// Engine version string embedded in every result's metadata.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
