//! Command-line interface implementation

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{
    find_config, load_config, merge_cli_overrides, CliOverrides, ConfigError, PixelFormat, Quality,
};
use crate::pipeline::{BatchOptions, BatchPipeline, EncodeSettings};

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// texbake - Bake source images and atlas descriptors into compressed ETC2 textures
#[derive(Parser)]
#[command(name = "texbake")]
#[command(about = "Bake source images and atlas descriptors into compressed ETC2 textures")]
#[command(version)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "listfile"])))]
pub struct Cli {
    /// Input image or atlas descriptor file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Text file listing input files, one per line; enables the change cache
    #[arg(long)]
    pub listfile: Option<PathBuf>,

    /// Output directory (must exist)
    #[arg(long, default_value = ".")]
    pub outdir: PathBuf,

    /// Target pixel format
    #[arg(long, value_enum)]
    pub enc: Option<PixelFormat>,

    /// Encoding quality tier
    #[arg(long, value_enum)]
    pub quality: Option<Quality>,

    /// Pad image dimensions up to the next multiple of N (0 disables)
    #[arg(long)]
    pub align: Option<u32>,

    /// Number of parallel jobs
    #[arg(long)]
    pub jobs: Option<usize>,

    /// ETC2 encoder executable
    #[arg(long)]
    pub etc_tool: Option<PathBuf>,

    /// Atlas packer executable
    #[arg(long)]
    pub packer: Option<PathBuf>,

    /// Print per-stage detail
    #[arg(long)]
    pub verbose: bool,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Find and load texbake.toml, then apply CLI overrides
    let config_path = find_config();
    if cli.verbose {
        match &config_path {
            Some(path) => println!("Using config: {}", path.display()),
            None => println!("No texbake.toml found, using defaults"),
        }
    }

    let mut config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let overrides = CliOverrides {
        etc_tool: cli.etc_tool.clone(),
        packer: cli.packer.clone(),
        encoder: cli.enc,
        quality: cli.quality,
        alignment: cli.align,
        jobs: cli.jobs,
    };
    merge_cli_overrides(&mut config, &overrides);

    // Fatal before any processing: the output root must already exist
    if !cli.outdir.is_dir() {
        let err = ConfigError::OutputDir(cli.outdir.clone());
        eprintln!("Error: {}", err);
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let pipeline = BatchPipeline::new(BatchOptions {
        out_root: cli.outdir.clone(),
        encode: EncodeSettings {
            format: config.defaults.encoder,
            quality: config.defaults.quality,
        },
        alignment: config.defaults.alignment,
        etc_tool: config.tools.etc_tool.clone(),
        packer: config.tools.packer.clone(),
        jobs: config.defaults.jobs,
        verbose: cli.verbose,
    });

    let report = if let Some(listfile) = &cli.listfile {
        match pipeline.run_manifest(listfile) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Error: Cannot read list file '{}': {}", listfile.display(), e);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        }
    } else if let Some(file) = &cli.file {
        pipeline.run_single(file)
    } else {
        // clap's input group guarantees one of the two is present
        unreachable!("argument parsing enforces an input selection");
    };

    if report.is_success() {
        println!("{}", report.summary());
        ExitCode::from(EXIT_SUCCESS)
    } else {
        eprintln!("{}", report.summary());
        ExitCode::from(EXIT_ERROR)
    }
}
