//! Configuration schema types for `texbake.toml`
//!
//! Defines the structure and defaults for texbake project configuration.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Target pixel format for the external encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Opaque RGB, no alpha channel
    Etc2,
    /// RGBA with alpha channel
    #[default]
    Etc2Alpha,
}

impl PixelFormat {
    /// The format token passed to the external encoder.
    pub fn format_token(self) -> &'static str {
        match self {
            PixelFormat::Etc2 => "RGB8",
            PixelFormat::Etc2Alpha => "RGBA8",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Etc2 => write!(f, "etc2"),
            PixelFormat::Etc2Alpha => write!(f, "etc2_alpha"),
        }
    }
}

/// Encoding quality tier.
///
/// Maps to a fixed effort value for the external encoder; the numeric
/// mapping is not user-tunable beyond choosing a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Minimal effort, fastest encode
    Low,
    /// Medium effort
    #[default]
    Normal,
    /// Maximal effort, best quality
    High,
}

impl Quality {
    /// The effort value passed to the external encoder.
    pub fn effort(self) -> &'static str {
        match self {
            Quality::Low => "30",
            Quality::Normal => "60",
            Quality::High => "100",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Low => write!(f, "low"),
            Quality::Normal => write!(f, "normal"),
            Quality::High => write!(f, "high"),
        }
    }
}

/// External tool locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// ETC2 encoder executable
    #[serde(default = "default_etc_tool")]
    pub etc_tool: PathBuf,
    /// Atlas packer executable
    #[serde(default = "default_packer")]
    pub packer: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            etc_tool: default_etc_tool(),
            packer: default_packer(),
        }
    }
}

fn default_etc_tool() -> PathBuf {
    PathBuf::from("EtcTool")
}

fn default_packer() -> PathBuf {
    PathBuf::from("TexturePacker")
}

/// Default settings applied when the CLI does not override them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Target pixel format
    #[serde(default)]
    pub encoder: PixelFormat,
    /// Encoding quality tier
    #[serde(default)]
    pub quality: Quality,
    /// Dimension alignment modulus (0 = no normalization)
    #[serde(default)]
    pub alignment: u32,
    /// Number of parallel jobs
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            encoder: PixelFormat::default(),
            quality: Quality::default(),
            alignment: 0,
            jobs: default_jobs(),
        }
    }
}

fn default_jobs() -> usize {
    1
}

/// Root configuration loaded from `texbake.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BakeConfig {
    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Default pipeline settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}
