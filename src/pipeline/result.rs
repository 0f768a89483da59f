//! Batch result types.
//!
//! Contains types for representing the outcome of a batch run.

use std::path::PathBuf;
use std::time::Duration;

/// Terminal status of a single job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Source was encoded and compressed to a final artifact
    Encoded,
    /// Source was unchanged since the previous run and skipped
    Skipped,
    /// Job failed with an error
    Failed(String),
}

impl JobStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Encoded | JobStatus::Skipped)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Failed(_))
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Encoded => write!(f, "encoded"),
            JobStatus::Skipped => write!(f, "skipped"),
            JobStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of processing a single manifest entry.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Source path as listed in the manifest
    pub source: PathBuf,
    /// Terminal status
    pub status: JobStatus,
    /// Content digest of the source, when one was computed for the change
    /// cache
    pub digest: Option<String>,
    /// Processing duration
    pub duration: Duration,
}

impl JobResult {
    /// Create a result for an encoded source.
    pub fn encoded(source: PathBuf, digest: Option<String>, duration: Duration) -> Self {
        Self {
            source,
            status: JobStatus::Encoded,
            digest,
            duration,
        }
    }

    /// Create a result for a skipped (unchanged) source.
    pub fn skipped(source: PathBuf) -> Self {
        Self {
            source,
            status: JobStatus::Skipped,
            digest: None,
            duration: Duration::ZERO,
        }
    }

    /// Create a result for a failed source.
    pub fn failed(source: PathBuf, error: String, duration: Duration) -> Self {
        Self {
            source,
            status: JobStatus::Failed(error),
            digest: None,
            duration,
        }
    }

    /// Check if this job succeeded.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Results for each manifest entry, in processing order
    pub jobs: Vec<JobResult>,
    /// Total batch duration
    pub total_duration: Duration,
}

impl BatchReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job result.
    pub fn add_result(&mut self, result: JobResult) {
        self.jobs.push(result);
    }

    /// Number of encoded jobs.
    pub fn encoded_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|r| matches!(r.status, JobStatus::Encoded))
            .count()
    }

    /// Number of skipped (unchanged) jobs.
    pub fn skipped_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|r| matches!(r.status, JobStatus::Skipped))
            .count()
    }

    /// Number of failed jobs.
    pub fn failed_count(&self) -> usize {
        self.jobs.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Check if the whole batch succeeded (no failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Failed job results.
    pub fn failures(&self) -> Vec<&JobResult> {
        self.jobs.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Format a summary of the batch.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let encoded = self.encoded_count();
        let skipped = self.skipped_count();
        let failed = self.failed_count();
        let total = self.jobs.len();
        let secs = self.total_duration.as_secs_f64();

        if failed > 0 {
            lines.push(format!(
                "Batch finished with {} failures: {} encoded, {} skipped ({} total) in {:.3}s",
                failed, encoded, skipped, total, secs
            ));
            for job in self.failures() {
                lines.push(format!("  - {}: {}", job.source.display(), job.status));
            }
        } else {
            lines.push(format!(
                "Batch complete: {} encoded, {} skipped ({} total) in {:.3}s",
                encoded, skipped, total, secs
            ));
        }

        lines.join("\n")
    }
}
