//! Main execution engine - runs a pipeline submission end to end

use crate::{
    core::{Branch, Pipeline, PipelineError, PipelineRun, RunStatus},
    execution::backend::{JobOutcome, TrainingBackend},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        pipeline_name: String,
    },
    ConditionEvaluated {
        step: String,
        condition: String,
        satisfied: bool,
    },
    JobSubmitted {
        step: String,
        job_name: String,
    },
    JobCompleted {
        job_name: String,
        succeeded: bool,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
        failure_reason: Option<String>,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Pipeline execution engine
pub struct ExecutionEngine<B> {
    backend: B,
    event_handlers: Vec<EventHandler>,
}

impl<B: TrainingBackend> ExecutionEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Submit a pipeline with `name=value` parameter overrides.
    ///
    /// Binding errors are returned before a run exists. Once a run is
    /// created every outcome, including backend errors, is recorded on it.
    /// Nothing is retried.
    pub async fn submit(
        &self,
        pipeline: &Pipeline,
        overrides: &[(String, String)],
    ) -> Result<PipelineRun, PipelineError> {
        let params = pipeline.bind(overrides)?;
        let mut run = PipelineRun::new(&pipeline.name, params);

        info!("Starting pipeline run: {} ({})", pipeline.name, run.run_id);
        run.start();
        self.emit_event(ExecutionEvent::RunStarted {
            run_id: run.run_id,
            pipeline_name: pipeline.name.clone(),
        });

        self.execute(pipeline, &mut run).await;

        info!(
            "Pipeline run finished: {} ({}) - {}",
            pipeline.name, run.run_id, run.status
        );
        self.emit_event(ExecutionEvent::RunCompleted {
            run_id: run.run_id,
            status: run.status,
            failure_reason: run.failure_reason.clone(),
        });

        Ok(run)
    }

    /// Evaluate the condition and carry out exactly one branch
    async fn execute(&self, pipeline: &Pipeline, run: &mut PipelineRun) {
        let branch = match pipeline.evaluate(&run.parameters, run.run_id) {
            Ok(branch) => branch,
            Err(e) => {
                error!("Failed to evaluate pipeline {}: {}", pipeline.name, e);
                run.fail(e.to_string());
                return;
            }
        };

        run.record_branch(&branch);
        self.emit_event(ExecutionEvent::ConditionEvaluated {
            step: pipeline.condition.name.clone(),
            condition: pipeline.condition.to_string(),
            satisfied: branch.is_train(),
        });

        match branch {
            Branch::Fail(message) => {
                warn!("Condition {} not met: {}", pipeline.condition, message);
                run.fail(message);
            }
            Branch::Train(job) => {
                self.emit_event(ExecutionEvent::JobSubmitted {
                    step: pipeline.train.name.clone(),
                    job_name: job.job_name.clone(),
                });

                let outcome = self.backend.run_job(&job).await;
                self.emit_event(ExecutionEvent::JobCompleted {
                    job_name: job.job_name.clone(),
                    succeeded: matches!(outcome, Ok(JobOutcome::Succeeded)),
                });

                match outcome {
                    Ok(JobOutcome::Succeeded) => run.succeed(),
                    Ok(JobOutcome::Failed(reason)) => run.fail(reason),
                    Err(e) => {
                        error!("Backend error for job {}: {}", job.job_name, e);
                        run.fail(e.to_string());
                    }
                }
            }
        }
    }
}
