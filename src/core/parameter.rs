//! Pipeline parameters and their binding at submission time

use crate::core::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Declared type of a pipeline parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    String,
    Integer,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::String => write!(f, "String"),
            ParameterType::Integer => write!(f, "Integer"),
        }
    }
}

/// A concrete parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Integer(i64),
    String(String),
}

impl ParameterValue {
    /// The type this value belongs to
    pub fn param_type(&self) -> ParameterType {
        match self {
            ParameterValue::Integer(_) => ParameterType::Integer,
            ParameterValue::String(_) => ParameterType::String,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParameterValue::Integer(n) => Some(*n),
            ParameterValue::String(_) => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Integer(n) => write!(f, "{}", n),
            ParameterValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// A named, typed parameter with a default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Parameter name, referenced as `{{ name }}` in job templates
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub param_type: ParameterType,

    /// Value used when the submission does not override it
    pub default: ParameterValue,

    /// Optional human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

impl ParameterDef {
    /// Parse a raw override string according to the declared type
    pub fn parse(&self, raw: &str) -> Result<ParameterValue, PipelineError> {
        match self.param_type {
            ParameterType::String => Ok(ParameterValue::String(raw.to_string())),
            ParameterType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(ParameterValue::Integer)
                .map_err(|_| PipelineError::InvalidInteger {
                    name: self.name.clone(),
                    value: raw.to_string(),
                }),
        }
    }
}

/// Parameter values fixed for the lifetime of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundParameters {
    values: BTreeMap<String, ParameterValue>,
}

impl BoundParameters {
    /// Bind declared parameters, applying `name=value` overrides on top of the defaults
    pub fn bind(
        definitions: &[ParameterDef],
        overrides: &[(String, String)],
    ) -> Result<Self, PipelineError> {
        let mut values: BTreeMap<String, ParameterValue> = definitions
            .iter()
            .map(|def| (def.name.clone(), def.default.clone()))
            .collect();

        for (name, raw) in overrides {
            let def = definitions
                .iter()
                .find(|d| &d.name == name)
                .ok_or_else(|| PipelineError::UnknownParameter(name.clone()))?;
            values.insert(name.clone(), def.parse(raw)?);
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values rendered as strings, for placeholder substitution
    pub fn as_string_map(&self) -> HashMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}
