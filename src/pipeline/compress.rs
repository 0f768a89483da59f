//! Final artifact compression.
//!
//! Every successfully encoded output is LZ4 block-compressed with the
//! uncompressed length prepended, so the runtime loader can allocate the
//! decode buffer once. The encoded original is deleted and replaced by
//! `<path>.lz4`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension appended to compressed artifacts.
pub const COMPRESSED_EXTENSION: &str = "lz4";

/// A compressed artifact and its size accounting.
#[derive(Debug, Clone)]
pub struct CompressedArtifact {
    /// Path of the compressed file (`<original>.lz4`)
    pub path: PathBuf,
    /// Size of the uncompressed input in bytes
    pub raw_len: usize,
    /// Size of the compressed output in bytes
    pub compressed_len: usize,
}

/// Compress a file in place: read it fully, LZ4-compress with the
/// uncompressed size stored up front, delete the original, and write the
/// compressed bytes to `<path>.lz4`.
pub fn compress_artifact(path: &Path) -> io::Result<CompressedArtifact> {
    let raw = fs::read(path)?;
    let compressed = lz4_flex::compress_prepend_size(&raw);

    fs::remove_file(path)?;

    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(COMPRESSED_EXTENSION);
    let out_path = PathBuf::from(name);

    fs::write(&out_path, &compressed)?;

    Ok(CompressedArtifact {
        path: out_path,
        raw_len: raw.len(),
        compressed_len: compressed.len(),
    })
}
