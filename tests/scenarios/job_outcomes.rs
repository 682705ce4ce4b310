//! Test: Job Outcomes - the training job's result becomes the run's result

use crate::helpers::*;
use training_pipeline::core::{BranchTaken, RunStatus};

/// A failed job surfaces the entry point's reason verbatim
#[tokio::test]
async fn test_job_failure_reason_is_surfaced() {
    let reason = "Exception during training: No input files found in channel 'train'";
    let pipeline = bundled_pipeline();
    let result = submit_with(&pipeline, MockBackend::new(Scripted::Fail(reason.to_string())), &[]).await;

    assert_eq!(result.run.status, RunStatus::Failed);
    assert_eq!(result.run.branch, Some(BranchTaken::Train));
    assert_eq!(result.run.failure_reason.as_deref(), Some(reason));
    assert_eq!(result.jobs.len(), 1);
    assert!(result.run.completed_at.is_some());
}

/// A backend that cannot launch the job fails the run, it does not abort it
#[tokio::test]
async fn test_backend_error_fails_run() {
    let pipeline = bundled_pipeline();
    let result = submit_with(&pipeline, MockBackend::new(Scripted::LaunchError), &[]).await;

    assert_eq!(result.run.status, RunStatus::Failed);
    let reason = result.run.failure_reason.unwrap();
    assert!(reason.contains("Failed to launch entry point 'train'"), "{}", reason);
    assert_eq!(result.jobs.len(), 1, "the job is attempted exactly once");
}

#[tokio::test]
async fn test_successful_run_has_timestamps() {
    let pipeline = bundled_pipeline();
    let result = submit_with(&pipeline, MockBackend::succeeding(), &[]).await;

    let started = result.run.started_at.expect("run should record its start");
    let completed = result.run.completed_at.expect("run should record its end");
    assert!(completed >= started);
    assert!(result.run.status.is_terminal());
}

/// Runs submitted without history still produce a queryable summary
#[tokio::test]
async fn test_summary_kept_in_memory() {
    use training_pipeline::persistence::{create_summary, InMemoryPersistence, PersistenceBackend};

    let pipeline = bundled_pipeline();
    let result = submit_with(&pipeline, MockBackend::succeeding(), &[("volume_size", "49")]).await;

    let store = InMemoryPersistence::new();
    store.save_run(&create_summary(&result.run)).await.unwrap();

    let loaded = store.load_run(result.run.run_id).await.unwrap().unwrap();
    assert_eq!(loaded.status, RunStatus::Failed);
    assert_eq!(loaded.branch, Some(BranchTaken::Fail));
    assert_eq!(loaded.failure_reason.as_deref(), Some(FAIL_MESSAGE));
    assert!(loaded.job_name.is_none());
}
