//! Training supervisor - runs the external training program once

use crate::entrypoint::{EntryPointConfig, TrainingError};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Supervises a single training attempt.
///
/// States: start, then enumerate the channel, then either fail on an empty
/// channel or run the program and map its exit status. There is no retry
/// and no timeout here; the enclosing job owns the runtime ceiling.
#[derive(Debug, Clone)]
pub struct TrainingSupervisor {
    config: EntryPointConfig,
}

impl TrainingSupervisor {
    pub fn new(config: EntryPointConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EntryPointConfig {
        &self.config
    }

    /// Entries of the channel directory, sorted.
    ///
    /// A missing or unreadable channel counts as empty: all three causes
    /// share one diagnostic.
    pub fn list_input_files(&self) -> Result<Vec<PathBuf>, TrainingError> {
        let channel_dir = self.config.channel_dir();

        let entries = match std::fs::read_dir(&channel_dir) {
            Ok(entries) => entries,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                debug!("Channel directory {} not readable: {}", channel_dir.display(), e);
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(TrainingError::Io {
                    path: channel_dir,
                    source,
                })
            }
        };

        let mut files = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TrainingError::Io {
                path: channel_dir.clone(),
                source,
            })?;
        files.sort();
        Ok(files)
    }

    /// Run one training attempt
    ///
    /// # Errors
    /// Returns `TrainingError` if:
    /// - the input channel is empty
    /// - the training program cannot be spawned
    /// - the training program exits with a non-zero status
    pub async fn run(&self) -> Result<(), TrainingError> {
        let files = self.list_input_files()?;
        if files.is_empty() {
            return Err(TrainingError::MissingInput {
                channel: self.config.channel.clone(),
                path: self.config.channel_dir(),
            });
        }

        info!(
            "Found {} input file(s) in channel '{}'",
            files.len(),
            self.config.channel
        );
        for file in &files {
            debug!("  {}", file.display());
        }

        let config_path = self.config.config_path();
        if !config_path.exists() {
            warn!(
                "Training configuration {} not found; passing the path through",
                config_path.display()
            );
        }

        info!(
            "Starting training program: {} {}",
            self.config.program,
            config_path.display()
        );

        let status = Command::new(&self.config.program)
            .args(&self.config.program_args)
            .arg(&config_path)
            .status()
            .await
            .map_err(|source| TrainingError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !status.success() {
            warn!("Training program exited with {}", status);
            return Err(TrainingError::ProgramFailed {
                program: self.config.program.clone(),
                code: status.code(),
            });
        }

        info!("Training program finished successfully");
        Ok(())
    }
}
