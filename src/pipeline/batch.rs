//! Batch orchestration.
//!
//! Drives the full pipeline over a manifest of source paths: loads the change
//! cache once, processes every entry to a terminal state (encoded, skipped,
//! or failed), then persists the cache exactly once. A job failure never
//! aborts the batch; it is logged, tallied, and the loop moves on.
//!
//! Entries are processed sequentially by default. With `jobs > 1` they run on
//! a bounded worker pool: every job owns its own temp files and output paths,
//! each returns the digest to record, and the cache is updated and persisted
//! only after the pool has joined.

use crate::pipeline::atlas;
use crate::pipeline::cache::{hash_file, ChangeCache};
use crate::pipeline::compress::compress_artifact;
use crate::pipeline::encoder::{encode, EncodeSettings};
use crate::pipeline::job::{classify, encoded_output, mirrored_out_dir, JobError, JobKind};
use crate::pipeline::normalize::normalize;
use crate::pipeline::result::{BatchReport, JobResult, JobStatus};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Per-batch settings resolved once from configuration and CLI flags.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Root directory for output artifacts (must pre-exist)
    pub out_root: PathBuf,
    /// Encoder format and quality
    pub encode: EncodeSettings,
    /// Dimension alignment modulus (0 = no normalization)
    pub alignment: u32,
    /// External ETC2 encoder executable
    pub etc_tool: PathBuf,
    /// External atlas packer executable
    pub packer: PathBuf,
    /// Number of worker threads (1 = sequential)
    pub jobs: usize,
    /// Print per-stage detail
    pub verbose: bool,
}

/// Pipeline driver for one batch invocation.
///
/// All state is explicit: the change cache and counters live here and in the
/// returned [`BatchReport`], never in globals.
pub struct BatchPipeline {
    options: BatchOptions,
}

impl BatchPipeline {
    /// Create a pipeline with the given options.
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    /// Get the batch options.
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Process every entry of a manifest file.
    ///
    /// The change cache sidecar (`<manifest>.cache.json`) is loaded before
    /// the first job and rewritten after the last one; an interrupted batch
    /// leaves the sidecar on disk untouched. An unreadable manifest is the
    /// only fatal error here.
    pub fn run_manifest(&self, manifest: &Path) -> io::Result<BatchReport> {
        let start = Instant::now();
        let entries = read_manifest(manifest)?;

        let sidecar = ChangeCache::sidecar_path(manifest);
        let mut cache = match ChangeCache::load(&sidecar) {
            Ok(cache) => cache,
            Err(err) => {
                eprintln!(
                    "Warning: ignoring unreadable change cache {}: {}",
                    sidecar.display(),
                    err
                );
                ChangeCache::new()
            }
        };

        let results = self.process_entries(&entries, Some(&cache));

        let mut report = BatchReport::new();
        for result in results {
            if matches!(result.status, JobStatus::Encoded) {
                if let Some(digest) = &result.digest {
                    cache.record(&result.source, digest.clone());
                }
            }
            report.add_result(result);
        }

        if let Err(err) = cache.persist(&sidecar) {
            eprintln!(
                "Warning: failed to write change cache {}: {}",
                sidecar.display(),
                err
            );
        }

        report.total_duration = start.elapsed();
        Ok(report)
    }

    /// Process one source file without any change cache.
    pub fn run_single(&self, source: &Path) -> BatchReport {
        let start = Instant::now();
        let mut report = BatchReport::new();
        report.add_result(self.process_entry(source, None));
        report.total_duration = start.elapsed();
        report
    }

    /// Map entries to job results, on a worker pool when requested.
    fn process_entries(&self, entries: &[PathBuf], cache: Option<&ChangeCache>) -> Vec<JobResult> {
        if self.options.jobs > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.jobs)
                .build()
            {
                Ok(pool) => {
                    return pool.install(|| {
                        entries
                            .par_iter()
                            .map(|entry| self.process_entry(entry, cache))
                            .collect()
                    });
                }
                Err(err) => {
                    eprintln!("Warning: falling back to sequential processing: {}", err);
                }
            }
        }

        entries
            .iter()
            .map(|entry| self.process_entry(entry, cache))
            .collect()
    }

    /// Run one source path to a terminal state.
    fn process_entry(&self, source: &Path, cache: Option<&ChangeCache>) -> JobResult {
        let start = Instant::now();

        if !source.exists() {
            return self.fail(source, JobError::MissingInput(source.to_path_buf()), start);
        }

        // Change check applies only in manifest mode; single-file invocations
        // always dispatch.
        let digest = match cache {
            Some(_) => match hash_file(source) {
                Ok(digest) => Some(digest),
                Err(err) => return self.fail(source, JobError::Io(err), start),
            },
            None => None,
        };

        if let (Some(cache), Some(digest)) = (cache, digest.as_deref()) {
            if cache.is_unchanged(source, digest) {
                if self.options.verbose {
                    println!("Skipping {} (unchanged)", source.display());
                }
                return JobResult::skipped(source.to_path_buf());
            }
        }

        let outcome = match classify(source) {
            JobKind::Unsupported => Err(JobError::UnsupportedKind(source.to_path_buf())),
            JobKind::RasterImage => {
                let dest_dir = mirrored_out_dir(source, &self.options.out_root);
                self.encode_image(source, &dest_dir)
            }
            JobKind::AtlasDescriptor => self.expand_atlas(source),
        };

        match outcome {
            Ok(artifact) => {
                println!(
                    "{} -> {}",
                    source.display(),
                    artifact
                        .strip_prefix(&self.options.out_root)
                        .unwrap_or(&artifact)
                        .display()
                );
                JobResult::encoded(source.to_path_buf(), digest, start.elapsed())
            }
            Err(err) => self.fail(source, err, start),
        }
    }

    fn fail(&self, source: &Path, err: JobError, start: Instant) -> JobResult {
        eprintln!("Failed {}: {}", source.display(), err);
        JobResult::failed(source.to_path_buf(), err.to_string(), start.elapsed())
    }

    /// Single-image path: normalize, encode, compress.
    ///
    /// Returns the path of the final compressed artifact.
    fn encode_image(&self, image: &Path, dest_dir: &Path) -> Result<PathBuf, JobError> {
        fs::create_dir_all(dest_dir)?;

        let temp = normalize(image, self.options.alignment)?;
        let effective = temp.as_deref().unwrap_or(image);
        let output = encoded_output(dest_dir, image);

        let result = encode(
            &self.options.etc_tool,
            effective,
            &output,
            &self.options.encode,
        )
        .and_then(|()| compress_artifact(&output).map_err(JobError::Io));

        // The padded temp copy belongs to this job alone; drop it however the
        // encode went. A failed encode may leave a partial output file in
        // place, which is intentional.
        if let Some(temp) = temp {
            let _ = fs::remove_file(temp);
        }

        let artifact = result?;
        if self.options.verbose {
            println!(
                "  lz4: {}kb -> {}kb",
                artifact.raw_len / 1024,
                artifact.compressed_len / 1024
            );
        }
        Ok(artifact.path)
    }

    /// Atlas path: pack, then feed the composite sheet through the
    /// single-image path.
    fn expand_atlas(&self, source: &Path) -> Result<PathBuf, JobError> {
        let dest_dir = mirrored_out_dir(source, &self.options.out_root);
        fs::create_dir_all(&dest_dir)?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "atlas".to_string());
        let data_file = dest_dir.join(format!("{}.json", stem));

        let composite = atlas::expand(&self.options.packer, source, &data_file)?;

        // The composite sheet is a build byproduct: encode it next to the
        // retained data file, then delete it whether or not the encode
        // succeeded.
        let encoded = self.encode_image(&composite, &dest_dir);
        let _ = fs::remove_file(&composite);
        encoded
    }
}

/// Read a manifest: one source path per line, trimmed, blank lines skipped.
pub fn read_manifest(path: &Path) -> io::Result<Vec<PathBuf>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}
