//! Entry point configuration
//!
//! The `train` binary takes no flags. Its layout is fixed by the training
//! environment and can be redirected through `TRAINING_*` variables.

use std::path::PathBuf;

pub const ENV_INPUT_ROOT: &str = "TRAINING_INPUT_ROOT";
pub const ENV_OUTPUT_ROOT: &str = "TRAINING_OUTPUT_ROOT";
pub const ENV_CHANNEL: &str = "TRAINING_CHANNEL";
pub const ENV_CONFIG_FILE: &str = "TRAINING_CONFIG_FILE";
pub const ENV_PROGRAM: &str = "TRAINING_PROGRAM";
pub const ENV_PROGRAM_ARGS: &str = "TRAINING_PROGRAM_ARGS";

/// Name of the file written under the output root when training fails
pub const FAILURE_FILE: &str = "failure";

/// Configuration for the training entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointConfig {
    /// Directory holding one subdirectory per input channel
    pub input_root: PathBuf,

    /// Directory receiving the failure file
    pub output_root: PathBuf,

    /// Input channel name
    pub channel: String,

    /// Training configuration file name, inside the channel directory
    pub config_file: String,

    /// External training program
    pub program: String,

    /// Arguments placed before the config path
    pub program_args: Vec<String>,
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("/opt/ml/input/data"),
            output_root: PathBuf::from("/opt/ml/output"),
            channel: "train".to_string(),
            config_file: "config.yaml".to_string(),
            program: "train-model".to_string(),
            program_args: Vec::new(),
        }
    }
}

impl EntryPointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TRAINING_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            input_root: value(ENV_INPUT_ROOT).map(PathBuf::from).unwrap_or(defaults.input_root),
            output_root: value(ENV_OUTPUT_ROOT).map(PathBuf::from).unwrap_or(defaults.output_root),
            channel: value(ENV_CHANNEL).unwrap_or(defaults.channel),
            config_file: value(ENV_CONFIG_FILE).unwrap_or(defaults.config_file),
            program: value(ENV_PROGRAM).unwrap_or(defaults.program),
            program_args: value(ENV_PROGRAM_ARGS)
                .map(|args| args.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.program_args),
        }
    }

    pub fn with_input_root(mut self, input_root: impl Into<PathBuf>) -> Self {
        self.input_root = input_root.into();
        self
    }

    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_program_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// `<input_root>/<channel>`
    pub fn channel_dir(&self) -> PathBuf {
        self.input_root.join(&self.channel)
    }

    /// `<input_root>/<channel>/<config_file>`
    pub fn config_path(&self) -> PathBuf {
        self.channel_dir().join(&self.config_file)
    }

    /// `<output_root>/failure`
    pub fn failure_path(&self) -> PathBuf {
        self.output_root.join(FAILURE_FILE)
    }
}
