//! External ETC2 encoder invocation.
//!
//! The encoder is a black-box process with a fixed argument shape: input
//! path, parallelism hint, pixel format token, quality effort, a fixed
//! perceptual error metric, and the output path. Success is defined solely by
//! exit status 0; a failed encode is never retried and any partially written
//! output is left in place for inspection.

use crate::config::{PixelFormat, Quality};
use crate::pipeline::job::JobError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Per-batch encode configuration resolved from CLI-level settings.
#[derive(Debug, Clone, Copy)]
pub struct EncodeSettings {
    /// Target pixel format
    pub format: PixelFormat,
    /// Quality tier
    pub quality: Quality,
}

/// Build the fixed-shape argument list for the external encoder.
pub fn encoder_args(input: &Path, output: &Path, settings: &EncodeSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(10);
    args.push(input.into());
    args.push("-j".into());
    args.push("4".into());
    args.push("-format".into());
    args.push(settings.format.format_token().into());
    args.push("-effort".into());
    args.push(settings.quality.effort().into());
    args.push("-errormetric".into());
    args.push("rec709".into());
    args.push("-output".into());
    args.push(output.into());
    args
}

/// Run the external encoder synchronously.
///
/// Success iff the process exits with status 0.
pub fn encode(
    tool: &Path,
    input: &Path,
    output: &Path,
    settings: &EncodeSettings,
) -> Result<(), JobError> {
    let status = Command::new(tool)
        .args(encoder_args(input, output, settings))
        .status()
        .map_err(|source| JobError::ToolLaunch {
            tool: tool.display().to_string(),
            source,
        })?;

    if !status.success() {
        return Err(JobError::ToolStatus {
            tool: tool.display().to_string(),
            status,
        });
    }

    Ok(())
}
