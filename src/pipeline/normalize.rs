//! Size normalization for encoder alignment requirements.
//!
//! The external encoder requires both image dimensions to be multiples of an
//! alignment modulus for some target formats. When an image falls short, a
//! padded copy is composed with the original pixels at the origin and the
//! remainder transparent, and written to a fresh temporary file that the
//! caller owns and must delete after use.

use crate::pipeline::job::JobError;
use image::{DynamicImage, GenericImageView, RgbaImage};
use std::path::{Path, PathBuf};

/// Pad an image's dimensions up to the next multiples of `modulus`.
///
/// Returns `None` when no padding is needed: modulus 0 disables
/// normalization, and an already-aligned image passes through untouched with
/// no temp file created. Otherwise returns the path of a padded temporary
/// copy written with the source's original extension and encoding.
pub fn normalize(image_path: &Path, modulus: u32) -> Result<Option<PathBuf>, JobError> {
    if modulus == 0 {
        return Ok(None);
    }

    let img = image::open(image_path)?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(JobError::EmptyImage(image_path.to_path_buf()));
    }
    if width % modulus == 0 && height % modulus == 0 {
        return Ok(None);
    }

    let padded_w = width.div_ceil(modulus) * modulus;
    let padded_h = height.div_ceil(modulus) * modulus;

    // Transparent/zero-filled canvas with the original pasted at the origin
    let mut canvas = RgbaImage::new(padded_w, padded_h);
    image::imageops::replace(&mut canvas, &img.to_rgba8(), 0, 0);

    let ext = image_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();

    // JPEG carries no alpha channel, so the padded copy flattens to RGB
    let padded = if ext == "jpg" || ext == "jpeg" {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    } else {
        DynamicImage::ImageRgba8(canvas)
    };

    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("padded");
    let dir = image_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let temp = tempfile::Builder::new()
        .prefix(&format!(".{}-pad-", stem))
        .suffix(&format!(".{}", ext))
        .tempfile_in(dir)
        .map_err(JobError::Io)?;
    let (_, temp_path) = temp.keep().map_err(|e| JobError::Io(e.error))?;

    padded.save(&temp_path)?;
    Ok(Some(temp_path))
}
