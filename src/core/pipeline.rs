//! Pipeline domain model and branch evaluation

use crate::core::{
    condition::Condition,
    config::PipelineConfig,
    error::PipelineError,
    job::{JobSpec, JobTemplate},
    parameter::{BoundParameters, ParameterDef},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job name prefix when the pipeline name has nothing usable
const FALLBACK_JOB_PREFIX: &str = "training";

/// Terminal step taken when the condition does not hold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailStep {
    pub name: String,

    /// Reported verbatim as the run's failure reason
    pub error_message: String,
}

/// Outcome of evaluating the pipeline condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    /// Condition held: launch this job
    Train(JobSpec),
    /// Condition failed: stop with this message
    Fail(String),
}

impl Branch {
    pub fn is_train(&self) -> bool {
        matches!(self, Branch::Train(_))
    }
}

/// A pipeline definition
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    pub description: Option<String>,

    /// Declared parameters with their defaults
    pub parameters: Vec<ParameterDef>,

    pub condition: Condition,

    pub train: JobTemplate,

    pub fail: FailStep,

    /// Declared ceiling on parallel steps
    pub max_parallel_steps: usize,
}

impl Pipeline {
    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Pipeline {
            name: config.name.clone(),
            description: config.description.clone(),
            parameters: config.parameters.clone(),
            condition: config.steps.condition.clone(),
            train: config.steps.train.clone(),
            fail: config.steps.fail.clone(),
            max_parallel_steps: config.parallelism.max_parallel_execution_steps,
        }
    }

    /// Bind submission overrides against the declared parameters
    pub fn bind(&self, overrides: &[(String, String)]) -> Result<BoundParameters, PipelineError> {
        BoundParameters::bind(&self.parameters, overrides)
    }

    /// Job name for a run: the lowercased pipeline name plus a short run id
    pub fn job_name(&self, run_id: Uuid) -> String {
        let slug: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = match slug.trim_matches('-') {
            "" => FALLBACK_JOB_PREFIX,
            trimmed => trimmed,
        };
        let short_id = run_id.simple().to_string();
        format!("{}-{}", slug, &short_id[..8])
    }

    /// Evaluate the condition and select exactly one branch.
    ///
    /// The fail branch carries the configured message and no job is built.
    pub fn evaluate(&self, params: &BoundParameters, run_id: Uuid) -> Result<Branch, PipelineError> {
        if !self.condition.evaluate(params)? {
            return Ok(Branch::Fail(self.fail.error_message.clone()));
        }

        let job = self.train.render(&self.job_name(run_id), &params.as_string_map())?;
        Ok(Branch::Train(job))
    }
}
