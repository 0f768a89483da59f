//! Job classification and per-job failure taxonomy.
//!
//! Each manifest entry becomes one job. The file kind is computed once from
//! the path's extension and drives dispatch: atlas descriptors go through the
//! external packer, raster images go straight to the encode path, and
//! anything else fails without spawning a process.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

/// Extension of atlas descriptor sources.
pub const ATLAS_EXTENSION: &str = "tps";

/// Extensions of raster image sources accepted by the encode path.
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg"];

/// Extension of encoded texture artifacts.
pub const ENCODED_EXTENSION: &str = "ktx";

/// What kind of source a job processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Descriptor consumed by the external atlas packer
    AtlasDescriptor,
    /// Plain raster image, encoded directly
    RasterImage,
    /// Anything else - fails without spawning a process
    Unsupported,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::AtlasDescriptor => write!(f, "atlas descriptor"),
            JobKind::RasterImage => write!(f, "raster image"),
            JobKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Classify a source path by its extension.
pub fn classify(path: &Path) -> JobKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some(e) if e == ATLAS_EXTENSION => JobKind::AtlasDescriptor,
        Some(e) if RASTER_EXTENSIONS.contains(&e) => JobKind::RasterImage,
        _ => JobKind::Unsupported,
    }
}

/// Output directory for a source, mirroring its relative parent under the
/// output root.
///
/// Entries with an absolute path mirror only the file name (they land in the
/// output root itself).
pub fn mirrored_out_dir(source: &Path, out_root: &Path) -> PathBuf {
    let parent = source.parent().unwrap_or_else(|| Path::new(""));
    if parent.as_os_str().is_empty() || source.is_absolute() {
        out_root.to_path_buf()
    } else {
        out_root.join(parent)
    }
}

/// Encoded output path for an image: `<dest_dir>/<stem>.ktx`.
pub fn encoded_output(dest_dir: &Path, image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    dest_dir.join(format!("{}.{}", stem, ENCODED_EXTENSION))
}

/// Failure of a single job. Never propagates past the batch loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JobError {
    /// Listed source file does not exist
    #[error("source file does not exist: {0}")]
    MissingInput(PathBuf),
    /// Unrecognized file extension; no process was spawned
    #[error("unsupported source type: {0}")]
    UnsupportedKind(PathBuf),
    /// Image decoded to zero pixels
    #[error("image has no pixels: {0}")]
    EmptyImage(PathBuf),
    /// External tool could not be launched at all
    #[error("failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    /// External tool ran but reported failure
    #[error("{tool} failed with {status}")]
    ToolStatus { tool: String, status: ExitStatus },
    /// Atlas descriptor document could not be parsed
    #[error("atlas descriptor error: {0}")]
    Descriptor(#[from] serde_json::Error),
    /// Image decode or encode error during normalization
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// File could not be read, written, or deleted
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
