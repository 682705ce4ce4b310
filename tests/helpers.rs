//! Test utility functions for training-pipeline
#![allow(dead_code)]

use training_pipeline::core::config::PipelineConfig;
use training_pipeline::core::{JobSpec, Pipeline, PipelineRun};
use training_pipeline::execution::{
    BackendError, ExecutionEngine, ExecutionEvent, JobOutcome, TrainingBackend,
};

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

pub const FAIL_MESSAGE: &str = "Input parameter validation failed, the training can not continue. Make sure the volume size is at least 50GB.";

/// What the mock backend answers for every job
#[derive(Debug, Clone)]
pub enum Scripted {
    Succeed,
    Fail(String),
    LaunchError,
}

/// Mock backend that records submitted jobs and returns a scripted outcome
#[derive(Clone)]
pub struct MockBackend {
    scripted: Scripted,
    jobs: Arc<Mutex<Vec<JobSpec>>>,
}

impl MockBackend {
    pub fn new(scripted: Scripted) -> Self {
        Self {
            scripted,
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Scripted::Succeed)
    }

    /// Jobs submitted so far, in order
    pub fn jobs(&self) -> Vec<JobSpec> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrainingBackend for MockBackend {
    async fn run_job(&self, job: &JobSpec) -> Result<JobOutcome, BackendError> {
        self.jobs.lock().unwrap().push(job.clone());

        match &self.scripted {
            Scripted::Succeed => Ok(JobOutcome::Succeeded),
            Scripted::Fail(reason) => Ok(JobOutcome::Failed(reason.clone())),
            Scripted::LaunchError => Err(BackendError::Launch {
                program: "train".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }
}

/// Result of a submission through the engine
pub struct SubmissionResult {
    pub run: PipelineRun,
    pub events: Vec<ExecutionEvent>,
    pub jobs: Vec<JobSpec>,
}

/// The pipeline shipped with the binary
pub fn bundled_pipeline() -> Pipeline {
    PipelineConfig::bundled().unwrap().to_pipeline()
}

pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    PipelineConfig::from_yaml(yaml).unwrap().to_pipeline()
}

pub fn overrides(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Submit `pipeline` with `pairs` as overrides, collecting events and jobs
pub async fn submit_with(
    pipeline: &Pipeline,
    backend: MockBackend,
    pairs: &[(&str, &str)],
) -> SubmissionResult {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let mut engine = ExecutionEngine::new(backend.clone());
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    let run = engine
        .submit(pipeline, &overrides(pairs))
        .await
        .expect("submission should bind");

    let events = events.lock().unwrap().clone();
    SubmissionResult {
        run,
        events,
        jobs: backend.jobs(),
    }
}
