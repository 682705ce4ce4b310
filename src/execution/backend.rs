//! Training backend seam

use crate::core::JobSpec;
use async_trait::async_trait;
use thiserror::Error;

/// Terminal result of one training job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    /// Failed with the reason surfaced by the entry point
    Failed(String),
}

/// Errors raised by a backend before or around a job
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to prepare job {job}: {source}")]
    Staging {
        job: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch entry point '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deliver model for job {job}: {source}")]
    Delivery {
        job: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for training job execution - allows for different implementations
#[async_trait]
pub trait TrainingBackend: Send + Sync {
    /// Run one job to completion and report its outcome
    async fn run_job(&self, job: &JobSpec) -> Result<JobOutcome, BackendError>;
}
