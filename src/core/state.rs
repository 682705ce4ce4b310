//! Run state models

use crate::core::{job::JobSpec, parameter::BoundParameters, pipeline::Branch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has been created but not started
    Pending,
    /// Condition evaluated, job in progress
    Executing,
    /// Training job succeeded
    Succeeded,
    /// Validation failed, input was missing, or training failed
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Which branch a run took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchTaken {
    Train,
    Fail,
}

/// One execution of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique run ID
    pub run_id: Uuid,

    pub pipeline_name: String,

    /// Parameters bound at submission
    pub parameters: BoundParameters,

    pub status: RunStatus,

    /// Set once the condition has been evaluated
    pub branch: Option<BranchTaken>,

    /// Only present on the train branch
    pub job: Option<JobSpec>,

    pub started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Human-readable reason attached to a failed run
    pub failure_reason: Option<String>,
}

impl PipelineRun {
    /// Create a new pending run
    pub fn new(pipeline_name: &str, parameters: BoundParameters) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline_name: pipeline_name.to_string(),
            parameters,
            status: RunStatus::Pending,
            branch: None,
            job: None,
            started_at: None,
            completed_at: None,
            failure_reason: None,
        }
    }

    /// Mark run as started
    pub fn start(&mut self) {
        self.status = RunStatus::Executing;
        self.started_at = Some(Utc::now());
    }

    /// Record the evaluated branch
    pub fn record_branch(&mut self, branch: &Branch) {
        match branch {
            Branch::Train(job) => {
                self.branch = Some(BranchTaken::Train);
                self.job = Some(job.clone());
            }
            Branch::Fail(_) => {
                self.branch = Some(BranchTaken::Fail);
            }
        }
    }

    /// Mark run as succeeded
    pub fn succeed(&mut self) {
        self.status = RunStatus::Succeeded;
        self.completed_at = Some(Utc::now());
    }

    /// Mark run as failed with a reason
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.completed_at = Some(Utc::now());
    }
}
