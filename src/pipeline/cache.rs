//! Change cache for skipping unchanged inputs across runs.
//!
//! The cache is a sidecar file next to the manifest mapping each source path
//! to a SHA-256 digest of its content at last successful processing. It is
//! loaded once at batch start and rewritten once at batch end; a crash
//! mid-batch leaves the on-disk sidecar exactly as it was.
//!
//! # Sidecar Format
//!
//! The sidecar is stored as JSON in `<manifest>.cache.json`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": {
//!     "sprites/player.png": "a3f2...",
//!     "ui/hud.tps": "99c1..."
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Current sidecar format version.
const CACHE_VERSION: u32 = 1;

/// Suffix appended to the manifest path to name the sidecar.
pub const CACHE_SUFFIX: &str = "cache.json";

/// Error during change cache operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Version mismatch
    #[error("Cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// On-disk sidecar document.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// In-memory mapping from source path to content digest.
#[derive(Debug, Clone, Default)]
pub struct ChangeCache {
    entries: BTreeMap<String, String>,
}

impl ChangeCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sidecar path for a manifest: `<manifest>.cache.json`.
    pub fn sidecar_path(manifest: &Path) -> PathBuf {
        let mut name = manifest.as_os_str().to_os_string();
        name.push(".");
        name.push(CACHE_SUFFIX);
        PathBuf::from(name)
    }

    /// Load a cache from a sidecar file.
    ///
    /// A missing sidecar yields an empty cache, not an error - the first run
    /// has no cache. An unreadable or corrupt sidecar is an error; callers
    /// typically degrade it to an empty cache and re-encode everything.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let file: CacheFile = serde_json::from_str(&content)?;

        if file.version != CACHE_VERSION {
            return Err(CacheError::VersionMismatch {
                expected: CACHE_VERSION,
                found: file.version,
            });
        }

        Ok(Self {
            entries: file.entries,
        })
    }

    /// Check whether a source is unchanged: a prior entry exists and its
    /// digest matches the current one.
    pub fn is_unchanged(&self, source: &Path, digest: &str) -> bool {
        self.entries
            .get(&cache_key(source))
            .is_some_and(|prior| prior.as_str() == digest)
    }

    /// Upsert the in-memory entry for a source. Does not touch the disk.
    pub fn record(&mut self, source: &Path, digest: String) {
        self.entries.insert(cache_key(source), digest);
    }

    /// Serialize the full mapping, replacing any prior sidecar content.
    ///
    /// This is the only disk-mutating operation. The document is written to a
    /// temporary file in the sidecar's directory and renamed into place, so a
    /// crash during persist cannot truncate an existing sidecar.
    pub fn persist(&self, path: &Path) -> Result<(), CacheError> {
        let file = CacheFile {
            version: CACHE_VERSION,
            entries: self.entries.clone(),
        };

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        let json = serde_json::to_string_pretty(&file)?;
        temp.write_all(json.as_bytes())?;
        temp.persist(path).map_err(|e| CacheError::Io(e.error))?;

        Ok(())
    }

    /// Number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(source: &Path) -> String {
    source.to_string_lossy().into_owned()
}

/// Compute the SHA-256 digest of a file's raw bytes as lowercase hex.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
