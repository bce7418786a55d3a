//! Output normalization for downstream editing consumers
//!
//! Downloaded images are re-encoded into one of two canonical forms:
//!
//! - `Flattened`: opaque lossy JPEG. Any transparency (palette and
//!   grayscale-with-alpha layouts included) is promoted to full alpha and
//!   composited onto an opaque white canvas.
//! - `Archival`: lossless RGBA8 PNG, never indexed, with all ancillary
//!   metadata blocks dropped. Indexed-color and metadata-bearing files are
//!   known to confuse at least one downstream editor.
//!
//! A failed lossy encode falls back to the archival form instead of failing
//! the asset.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use muse_core::{MuseError, Result};
use tracing::warn;

const JPEG_QUALITY: u8 = 92;

/// Target representation for a persisted image artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeTarget {
    /// Opaque lossy JPEG, transparency flattened onto white
    Flattened,
    /// Canonical RGBA8 PNG with metadata stripped
    Archival,
}

impl NormalizeTarget {
    /// Parse a target name from config or request params
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "flattened" | "jpg" | "jpeg" => Some(NormalizeTarget::Flattened),
            "archival" | "png" | "lossless" => Some(NormalizeTarget::Archival),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            NormalizeTarget::Flattened => "jpg",
            NormalizeTarget::Archival => "png",
        }
    }
}

/// Normalize raw image bytes into the target form.
///
/// Returns the re-encoded bytes together with the extension they should be
/// persisted under. The extension may differ from the requested target when
/// the lossy encode fails and the archival fallback kicks in.
pub fn normalize_image(bytes: &[u8], target: NormalizeTarget) -> Result<(Vec<u8>, &'static str)> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| MuseError::NormalizationError(format!("Failed to decode image: {}", e)))?;
    // Promote every source layout (palette, grayscale, gray+alpha) to RGBA8
    let rgba = decoded.to_rgba8();

    match target {
        NormalizeTarget::Archival => Ok((encode_archival(&rgba)?, "png")),
        NormalizeTarget::Flattened => match encode_flattened(&rgba) {
            Ok(out) => Ok((out, "jpg")),
            Err(e) => {
                warn!("lossy encode failed, keeping lossless form: {}", e);
                Ok((encode_archival(&rgba)?, "png"))
            }
        },
    }
}

/// Composite onto an opaque white canvas and encode as JPEG
fn encode_flattened(rgba: &image::RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = rgba.dimensions();
    let mut flat = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let a = pixel[3] as u32;
        let mut out = [0u8; 3];
        for c in 0..3 {
            out[c] = (((pixel[c] as u32) * a + 255 * (255 - a) + 127) / 255) as u8;
        }
        flat.put_pixel(x, y, image::Rgb(out));
    }

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder
        .encode_image(&flat)
        .map_err(|e| MuseError::NormalizationError(format!("JPEG encode failed: {}", e)))?;
    Ok(bytes)
}

/// Encode as RGBA8 PNG; re-encoding drops palette layout and every
/// ancillary text/EXIF/XMP chunk from the source
fn encode_archival(rgba: &image::RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = rgba.dimensions();
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| MuseError::NormalizationError(format!("PNG encode failed: {}", e)))?;
    Ok(bytes)
}
