//! Test: Volume Validation - the condition selects exactly one branch

use crate::helpers::*;
use training_pipeline::core::{BranchTaken, PipelineError, RunStatus};
use training_pipeline::execution::ExecutionEngine;

/// The default volume sits on the boundary and trains
#[tokio::test]
async fn test_default_parameters_train() {
    let pipeline = bundled_pipeline();
    let result = submit_with(&pipeline, MockBackend::succeeding(), &[]).await;

    assert_eq!(result.run.status, RunStatus::Succeeded);
    assert_eq!(result.run.branch, Some(BranchTaken::Train));
    assert!(result.run.failure_reason.is_none());
    assert_eq!(result.jobs.len(), 1);

    let job = &result.jobs[0];
    assert_eq!(job.volume_size_gb, 50);
    assert_eq!(job.max_runtime_secs, 86400);
    assert_eq!(job.input_data, "file:///opt/ml/datasets/train");
    assert_eq!(job.output_path, "file:///opt/ml/models");
    assert_eq!(job.image, "training-image:latest");
    assert_eq!(job.instance_type, "ml.m5.xlarge");
    assert!(job.job_name.starts_with("trainingpipeline-"));
}

/// One gigabyte short of the boundary stops the run with the fixed message
#[tokio::test]
async fn test_volume_below_boundary_fails_without_job() {
    let pipeline = bundled_pipeline();
    let backend = MockBackend::succeeding();
    let result = submit_with(&pipeline, backend, &[("volume_size", "49")]).await;

    assert_eq!(result.run.status, RunStatus::Failed);
    assert_eq!(result.run.branch, Some(BranchTaken::Fail));
    assert_eq!(result.run.failure_reason.as_deref(), Some(FAIL_MESSAGE));
    assert!(result.run.job.is_none());
    assert!(result.jobs.is_empty(), "no training job may be created");
}

#[tokio::test]
async fn test_zero_and_negative_volumes_fail() {
    let pipeline = bundled_pipeline();

    for volume in ["0", "-10"] {
        let result = submit_with(&pipeline, MockBackend::succeeding(), &[("volume_size", volume)]).await;
        assert_eq!(result.run.status, RunStatus::Failed, "volume {}", volume);
        assert_eq!(result.run.failure_reason.as_deref(), Some(FAIL_MESSAGE));
        assert!(result.jobs.is_empty());
    }
}

/// Large volumes are passed through to the job unchanged
#[tokio::test]
async fn test_large_volume_is_carried_into_job() {
    let pipeline = bundled_pipeline();
    let result = submit_with(
        &pipeline,
        MockBackend::succeeding(),
        &[("volume_size", "500"), ("instance_type", "ml.p3.2xlarge")],
    )
    .await;

    assert_eq!(result.run.status, RunStatus::Succeeded);
    assert_eq!(result.jobs[0].volume_size_gb, 500);
    assert_eq!(result.jobs[0].instance_type, "ml.p3.2xlarge");
    assert_eq!(result.run.job.as_ref(), Some(&result.jobs[0]));
}

/// A volume too large for the job field fails the run instead of training
#[tokio::test]
async fn test_unrepresentable_volume_fails_run() {
    let pipeline = bundled_pipeline();
    let result = submit_with(
        &pipeline,
        MockBackend::succeeding(),
        &[("volume_size", "99999999999")],
    )
    .await;

    assert_eq!(result.run.status, RunStatus::Failed);
    assert!(result.jobs.is_empty());
    assert!(result.run.failure_reason.is_some());
}

/// Binding errors are rejected before any run exists
#[tokio::test]
async fn test_invalid_overrides_are_rejected() {
    let pipeline = bundled_pipeline();
    let backend = MockBackend::succeeding();
    let engine = ExecutionEngine::new(backend.clone());

    let err = engine
        .submit(&pipeline, &overrides(&[("volume_size", "fifty")]))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInteger { .. }));

    let err = engine
        .submit(&pipeline, &overrides(&[("disk_size", "50")]))
        .await
        .unwrap_err();
    assert_eq!(err, PipelineError::UnknownParameter("disk_size".to_string()));

    assert!(backend.jobs().is_empty());
}

/// Other comparison operators are honoured
#[tokio::test]
async fn test_custom_operator_pipeline() {
    let yaml = r#"
name: "Small Jobs"
parameters:
  - name: volume_size
    type: Integer
    default: 10
steps:
  condition:
    name: "CheckSmall"
    parameter: volume_size
    operator: "<"
    value: 20
  train:
    name: "Train"
    input_data: "/data"
    output_path: "/models"
    image: "img"
    instance_type: "local"
    volume_size_gb: "{{ volume_size }}"
    max_runtime_secs: "60"
  fail:
    name: "TooBig"
    error_message: "volume must be below 20"
"#;
    let pipeline = pipeline_from_yaml(yaml);

    let small = submit_with(&pipeline, MockBackend::succeeding(), &[]).await;
    assert_eq!(small.run.status, RunStatus::Succeeded);
    assert_eq!(small.jobs[0].volume_size_gb, 10);
    assert!(small.jobs[0].job_name.starts_with("small-jobs-"));

    let big = submit_with(&pipeline, MockBackend::succeeding(), &[("volume_size", "20")]).await;
    assert_eq!(big.run.failure_reason.as_deref(), Some("volume must be below 20"));
    assert!(big.jobs.is_empty());
}
