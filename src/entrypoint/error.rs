//! Entry point error types

use std::path::PathBuf;
use thiserror::Error;

/// Error types for a training attempt
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(
        "No input files found in channel '{channel}' at {}. Check that the channel name is configured correctly, that the source data location is correct, and that the job has permission to read the data.",
        .path.display()
    )]
    MissingInput { channel: String, path: PathBuf },

    #[error("Failed to read input channel {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start training program '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Training program '{program}' {}", describe_exit(.code))]
    ProgramFailed { program: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}
