//! Atlas expansion through the external packer.
//!
//! An atlas descriptor source is handed to the external packer, which emits a
//! JSON data file describing the packed sheet. The `meta.image` field names
//! the composite image the packer produced, relative to the data file's own
//! directory. The composite is a build byproduct: it is forwarded into the
//! encode path by the batch driver and deleted afterwards, while the data
//! file is kept as a final artifact.

use crate::pipeline::job::JobError;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The subset of the packer's data file the pipeline reads.
#[derive(Debug, Deserialize)]
pub struct AtlasDescriptor {
    /// Metadata section
    pub meta: AtlasMeta,
}

/// Metadata section of the packer's data file.
#[derive(Debug, Deserialize)]
pub struct AtlasMeta {
    /// Relative filename of the composite image the packer produced
    pub image: String,
}

/// Build the argument list for the external atlas packer.
pub fn packer_args(data_file: &Path, source: &Path) -> Vec<OsString> {
    vec!["--data".into(), data_file.into(), source.into()]
}

/// Run the packer on a descriptor source and resolve the composite image it
/// produced.
///
/// A nonzero packer exit short-circuits with no further steps; there is no
/// composite to clean up in that case.
pub fn expand(packer: &Path, source: &Path, data_file: &Path) -> Result<PathBuf, JobError> {
    let status = Command::new(packer)
        .args(packer_args(data_file, source))
        .status()
        .map_err(|err| JobError::ToolLaunch {
            tool: packer.display().to_string(),
            source: err,
        })?;

    if !status.success() {
        return Err(JobError::ToolStatus {
            tool: packer.display().to_string(),
            status,
        });
    }

    let content = fs::read_to_string(data_file)?;
    let descriptor: AtlasDescriptor = serde_json::from_str(&content)?;

    let data_dir = data_file.parent().unwrap_or_else(|| Path::new(""));
    let composite = data_dir.join(&descriptor.meta.image);
    if !composite.exists() {
        return Err(JobError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!(
                "packer data file names a missing composite image: {}",
                composite.display()
            ),
        )));
    }

    Ok(composite)
}
