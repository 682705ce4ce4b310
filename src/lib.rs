//! training-pipeline - A conditional model-training pipeline and its training entry point

pub mod cli;
pub mod core;
pub mod entrypoint;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use crate::core::{Branch, Condition, JobSpec, Pipeline, PipelineError, PipelineRun, RunStatus};
pub use crate::entrypoint::{run_entry_point, EntryPointConfig, TrainingError};
pub use crate::execution::{ExecutionEngine, ExecutionEvent, JobOutcome, TrainingBackend};
pub use crate::execution::{LocalBackendConfig, LocalProcessBackend};
