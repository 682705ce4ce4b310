//! Core domain models for the training pipeline
//!
//! This module defines the pipeline definition, its parameters, the branch
//! condition, the training job specification and run state.

pub mod condition;
pub mod config;
pub mod error;
pub mod job;
pub mod parameter;
pub mod pipeline;
pub mod state;

pub use condition::{ComparisonOperator, Condition};
pub use error::PipelineError;
pub use job::{JobSpec, JobTemplate};
pub use parameter::{BoundParameters, ParameterDef, ParameterType, ParameterValue};
pub use pipeline::*;
pub use state::*;
