//! Pipeline definition loaded from YAML

use crate::core::{
    condition::Condition,
    job::{placeholders, JobTemplate},
    parameter::ParameterDef,
    pipeline::FailStep,
    Pipeline,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Definition shipped with the binary
const BUNDLED_PIPELINE: &str = include_str!("../../pipelines/training.yaml");

/// Top-level pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Pipeline version (optional)
    #[serde(default)]
    pub version: Option<String>,

    /// Parameters bound at submission time
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,

    #[serde(default)]
    pub parallelism: ParallelismConfig,

    pub steps: StepsConfig,
}

/// Ceiling on concurrently executing steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelismConfig {
    #[serde(default = "default_max_parallel_steps")]
    pub max_parallel_execution_steps: usize,
}

fn default_max_parallel_steps() -> usize {
    1
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self {
            max_parallel_execution_steps: default_max_parallel_steps(),
        }
    }
}

/// The condition and its two branches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepsConfig {
    pub condition: Condition,

    /// Taken when the condition holds
    pub train: JobTemplate,

    /// Taken when the condition does not hold
    pub fail: FailStep,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// The bundled volume-checked training pipeline
    pub fn bundled() -> Result<Self> {
        Self::from_yaml(BUNDLED_PIPELINE).context("Bundled pipeline definition is invalid")
    }

    /// Load from a file when given, otherwise the bundled definition
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.parallelism.max_parallel_execution_steps == 0 {
            anyhow::bail!("max_parallel_execution_steps must be at least 1");
        }

        let mut seen = HashSet::new();
        for param in &self.parameters {
            if !is_identifier(&param.name) {
                anyhow::bail!("Invalid parameter name: '{}'", param.name);
            }
            if !seen.insert(param.name.as_str()) {
                anyhow::bail!("Duplicate parameter: {}", param.name);
            }
            if param.default.param_type() != param.param_type {
                anyhow::bail!(
                    "Parameter '{}' is declared {} but its default is {}",
                    param.name,
                    param.param_type,
                    param.default.param_type()
                );
            }
        }

        let condition = &self.steps.condition;
        match self.parameters.iter().find(|p| p.name == condition.parameter) {
            None => anyhow::bail!(
                "Condition '{}' references non-existent parameter '{}'",
                condition.name,
                condition.parameter
            ),
            Some(param) if param.param_type != condition.value.param_type() => anyhow::bail!(
                "Condition '{}' compares {} parameter '{}' with a {} literal",
                condition.name,
                param.param_type,
                param.name,
                condition.value.param_type()
            ),
            Some(_) => {}
        }

        for (field, template) in self.steps.train.fields() {
            for name in placeholders(template) {
                if !seen.contains(name.as_str()) {
                    anyhow::bail!(
                        "Step '{}' field '{}' references non-existent parameter '{}'",
                        self.steps.train.name,
                        field,
                        name
                    );
                }
            }
        }

        if self.steps.fail.error_message.trim().is_empty() {
            anyhow::bail!("Step '{}' has an empty error_message", self.steps.fail.name);
        }

        Ok(())
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::from_config(self)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
