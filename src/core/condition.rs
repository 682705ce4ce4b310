//! Branch condition model

use crate::core::{
    error::PipelineError,
    parameter::{BoundParameters, ParameterValue},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "==", alias = "Equals")]
    Equal,
    #[serde(rename = "!=", alias = "NotEquals")]
    NotEqual,
    #[serde(rename = ">", alias = "GreaterThan")]
    GreaterThan,
    #[serde(rename = ">=", alias = "GreaterThanOrEqualTo")]
    GreaterThanOrEqual,
    #[serde(rename = "<", alias = "LessThan")]
    LessThan,
    #[serde(rename = "<=", alias = "LessThanOrEqualTo")]
    LessThanOrEqual,
}

impl ComparisonOperator {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOperator::Equal => ordering == Ordering::Equal,
            ComparisonOperator::NotEqual => ordering != Ordering::Equal,
            ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
            ComparisonOperator::GreaterThanOrEqual => ordering != Ordering::Less,
            ComparisonOperator::LessThan => ordering == Ordering::Less,
            ComparisonOperator::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
        };
        write!(f, "{}", symbol)
    }
}

/// A single comparison between a parameter and a literal.
///
/// Evaluated once per run; the result selects the train or fail branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Step name shown in events and history
    pub name: String,

    /// Left operand: the referenced parameter
    pub parameter: String,

    pub operator: ComparisonOperator,

    /// Right operand: a literal of the parameter's type
    pub value: ParameterValue,
}

impl Condition {
    /// Evaluate against bound parameters
    pub fn evaluate(&self, params: &BoundParameters) -> Result<bool, PipelineError> {
        let left = params
            .get(&self.parameter)
            .ok_or_else(|| PipelineError::UnknownParameter(self.parameter.clone()))?;

        let ordering = match (left, &self.value) {
            (ParameterValue::Integer(l), ParameterValue::Integer(r)) => l.cmp(r),
            (ParameterValue::String(l), ParameterValue::String(r)) => l.cmp(r),
            (l, r) => {
                return Err(PipelineError::TypeMismatch {
                    name: self.parameter.clone(),
                    expected: r.param_type().to_string(),
                    actual: l.param_type().to_string(),
                })
            }
        };

        Ok(self.operator.accepts(ordering))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.parameter, self.operator, self.value)
    }
}
