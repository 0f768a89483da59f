//! Configuration loading and discovery for `texbake.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{BakeConfig, PixelFormat, Quality};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "texbake.toml";

/// Configuration error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse texbake.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Output directory is missing or not a directory
    #[error("Output directory does not exist: {0}")]
    OutputDir(PathBuf),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the ETC2 encoder executable
    pub etc_tool: Option<PathBuf>,
    /// Override the atlas packer executable
    pub packer: Option<PathBuf>,
    /// Override target pixel format
    pub encoder: Option<PixelFormat>,
    /// Override quality tier
    pub quality: Option<Quality>,
    /// Override alignment modulus
    pub alignment: Option<u32>,
    /// Override number of parallel jobs
    pub jobs: Option<usize>,
}

/// Find texbake.toml by walking up from the current working directory.
///
/// # Returns
/// - `Some(path)` if a texbake.toml file is found
/// - `None` if no config file is found
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find texbake.toml by walking up from a specific directory.
///
/// This is the internal implementation that allows specifying the start
/// directory, useful for testing.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from the given path, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<BakeConfig, ConfigError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let config = toml::from_str(&content)?;
            Ok(config)
        }
        None => Ok(default_config()),
    }
}

/// Built-in default configuration.
pub fn default_config() -> BakeConfig {
    BakeConfig::default()
}

/// Apply CLI overrides on top of a loaded configuration.
pub fn merge_cli_overrides(config: &mut BakeConfig, overrides: &CliOverrides) {
    if let Some(etc_tool) = &overrides.etc_tool {
        config.tools.etc_tool = etc_tool.clone();
    }
    if let Some(packer) = &overrides.packer {
        config.tools.packer = packer.clone();
    }
    if let Some(encoder) = overrides.encoder {
        config.defaults.encoder = encoder;
    }
    if let Some(quality) = overrides.quality {
        config.defaults.quality = quality;
    }
    if let Some(alignment) = overrides.alignment {
        config.defaults.alignment = alignment;
    }
    if let Some(jobs) = overrides.jobs {
        config.defaults.jobs = jobs.max(1);
    }
}
