//! Training job template and the fully-resolved job specification

use crate::core::error::PipelineError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Names referenced as `{{ name }}` in a template string
pub fn placeholders(template: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

/// Substitute every placeholder, failing on the first one without a value
fn render(field: &str, template: &str, vars: &HashMap<String, String>) -> Result<String, PipelineError> {
    if let Some(name) = placeholders(template).into_iter().find(|n| !vars.contains_key(n)) {
        return Err(PipelineError::UnresolvedPlaceholder {
            field: field.to_string(),
            name,
        });
    }

    Ok(placeholder_regex()
        .replace_all(template, |caps: &regex::Captures| vars[&caps[1]].clone())
        .into_owned())
}

fn render_number<T: std::str::FromStr>(
    field: &str,
    template: &str,
    vars: &HashMap<String, String>,
) -> Result<T, PipelineError> {
    let rendered = render(field, template, vars)?;
    rendered
        .trim()
        .parse::<T>()
        .map_err(|_| PipelineError::InvalidJobField {
            field: field.to_string(),
            value: rendered,
        })
}

/// Training step as declared in the pipeline definition.
///
/// Every field may contain `{{ parameter }}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTemplate {
    /// Step name shown in events and history
    pub name: String,

    pub input_data: String,

    pub output_path: String,

    /// Container image reference
    pub image: String,

    pub instance_type: String,

    pub volume_size_gb: String,

    pub max_runtime_secs: String,
}

impl JobTemplate {
    /// All template fields with their names, in declaration order
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("input_data", &self.input_data),
            ("output_path", &self.output_path),
            ("image", &self.image),
            ("instance_type", &self.instance_type),
            ("volume_size_gb", &self.volume_size_gb),
            ("max_runtime_secs", &self.max_runtime_secs),
        ]
    }

    /// Resolve the template into a job specification
    pub fn render(&self, job_name: &str, vars: &HashMap<String, String>) -> Result<JobSpec, PipelineError> {
        Ok(JobSpec {
            job_name: job_name.to_string(),
            input_data: render("input_data", &self.input_data, vars)?,
            output_path: render("output_path", &self.output_path, vars)?,
            image: render("image", &self.image, vars)?,
            instance_type: render("instance_type", &self.instance_type, vars)?,
            volume_size_gb: render_number("volume_size_gb", &self.volume_size_gb, vars)?,
            max_runtime_secs: render_number("max_runtime_secs", &self.max_runtime_secs, vars)?,
        })
    }
}

/// Fully-resolved parameters for one training job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub job_name: String,

    /// Input dataset location (local path or `file://` URI for the local backend)
    pub input_data: String,

    /// Where trained model artifacts are delivered
    pub output_path: String,

    pub image: String,

    pub instance_type: String,

    pub volume_size_gb: u32,

    /// Runtime ceiling enforced by the backend, not the entry point
    pub max_runtime_secs: u64,
}
