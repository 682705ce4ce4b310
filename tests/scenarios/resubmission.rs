//! Test: Resubmission - runs are independent of each other

use crate::helpers::*;
use std::collections::HashSet;
use training_pipeline::core::RunStatus;
use training_pipeline::execution::ExecutionEngine;

/// Submitting the same pipeline twice gives two runs with distinct jobs
#[tokio::test]
async fn test_resubmission_creates_new_run() {
    let pipeline = bundled_pipeline();
    let backend = MockBackend::succeeding();
    let engine = ExecutionEngine::new(backend.clone());

    let first = engine.submit(&pipeline, &[]).await.unwrap();
    let second = engine.submit(&pipeline, &[]).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    let names: HashSet<_> = backend.jobs().into_iter().map(|j| j.job_name).collect();
    assert_eq!(names.len(), 2);
}

/// A failed submission does not affect the next one
#[tokio::test]
async fn test_failed_run_then_corrected_run() {
    let pipeline = bundled_pipeline();
    let backend = MockBackend::succeeding();
    let engine = ExecutionEngine::new(backend.clone());

    let rejected = engine
        .submit(&pipeline, &overrides(&[("volume_size", "20")]))
        .await
        .unwrap();
    assert_eq!(rejected.status, RunStatus::Failed);
    assert!(backend.jobs().is_empty());

    let accepted = engine
        .submit(&pipeline, &overrides(&[("volume_size", "80")]))
        .await
        .unwrap();
    assert_eq!(accepted.status, RunStatus::Succeeded);
    assert!(accepted.failure_reason.is_none());
    assert_eq!(backend.jobs().len(), 1);
    assert_eq!(backend.jobs()[0].volume_size_gb, 80);
}

/// Overrides apply to one run only
#[tokio::test]
async fn test_overrides_do_not_leak_between_runs() {
    let pipeline = bundled_pipeline();

    let custom = submit_with(&pipeline, MockBackend::succeeding(), &[("training_image", "custom:1")]).await;
    let default = submit_with(&pipeline, MockBackend::succeeding(), &[]).await;

    assert_eq!(custom.jobs[0].image, "custom:1");
    assert_eq!(default.jobs[0].image, "training-image:latest");
}
