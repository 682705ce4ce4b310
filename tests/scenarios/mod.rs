//! Scenario-based tests for training-pipeline

mod event_ordering;
mod job_outcomes;
mod resubmission;
mod volume_validation;
