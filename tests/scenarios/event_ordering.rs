//! Test: Event Ordering - handlers see the run unfold step by step

use crate::helpers::*;
use training_pipeline::core::RunStatus;
use training_pipeline::execution::ExecutionEvent;

fn event_names(events: &[ExecutionEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|e| match e {
            ExecutionEvent::RunStarted { .. } => "run_started",
            ExecutionEvent::ConditionEvaluated { .. } => "condition_evaluated",
            ExecutionEvent::JobSubmitted { .. } => "job_submitted",
            ExecutionEvent::JobCompleted { .. } => "job_completed",
            ExecutionEvent::RunCompleted { .. } => "run_completed",
        })
        .collect()
}

#[tokio::test]
async fn test_train_branch_events() {
    let pipeline = bundled_pipeline();
    let result = submit_with(&pipeline, MockBackend::succeeding(), &[]).await;

    assert_eq!(
        event_names(&result.events),
        [
            "run_started",
            "condition_evaluated",
            "job_submitted",
            "job_completed",
            "run_completed"
        ]
    );

    match &result.events[1] {
        ExecutionEvent::ConditionEvaluated {
            step,
            condition,
            satisfied,
        } => {
            assert_eq!(step, "CheckVolumeSize");
            assert_eq!(condition, "volume_size >= 50");
            assert!(*satisfied);
        }
        other => panic!("unexpected event {:?}", other),
    }

    match &result.events[2] {
        ExecutionEvent::JobSubmitted { step, job_name } => {
            assert_eq!(step, "TrainModel");
            assert_eq!(job_name, &result.jobs[0].job_name);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_fail_branch_events() {
    let pipeline = bundled_pipeline();
    let result = submit_with(&pipeline, MockBackend::succeeding(), &[("volume_size", "49")]).await;

    assert_eq!(
        event_names(&result.events),
        ["run_started", "condition_evaluated", "run_completed"]
    );

    match result.events.last() {
        Some(ExecutionEvent::RunCompleted {
            run_id,
            status,
            failure_reason,
        }) => {
            assert_eq!(*run_id, result.run.run_id);
            assert_eq!(*status, RunStatus::Failed);
            assert_eq!(failure_reason.as_deref(), Some(FAIL_MESSAGE));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_job_failure_reported_in_events() {
    let pipeline = bundled_pipeline();
    let result = submit_with(&pipeline, MockBackend::new(Scripted::Fail("boom".to_string())), &[]).await;

    assert!(result.events.iter().any(|e| matches!(
        e,
        ExecutionEvent::JobCompleted { succeeded: false, .. }
    )));
}
