//! Training entry point
//!
//! Runs inside the training environment, supervises the external training
//! program and translates its outcome into the job contract: exit code `0`
//! on success, or a failure file plus exit code `255` on any error.

pub mod config;
pub mod error;
pub mod supervisor;

pub use config::{EntryPointConfig, FAILURE_FILE};
pub use error::TrainingError;
pub use supervisor::TrainingSupervisor;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info};

/// Exit code signalling success
pub const SUCCESS_EXIT_CODE: i32 = 0;

/// Exit code signalling failure
pub const FAILURE_EXIT_CODE: i32 = 255;

/// Run one training attempt and map the outcome to an exit code.
///
/// This is the single place where errors become the failure file.
pub async fn run_entry_point(config: &EntryPointConfig) -> i32 {
    match supervise(config).await {
        Ok(()) => {
            info!("Training complete");
            SUCCESS_EXIT_CODE
        }
        Err(err) => {
            let report = format_failure(&err);
            eprintln!("{}", report);
            if let Err(write_err) = write_failure(&config.output_root, &report) {
                error!("Could not write failure file: {:#}", write_err);
            }
            FAILURE_EXIT_CODE
        }
    }
}

async fn supervise(config: &EntryPointConfig) -> Result<()> {
    clear_stale_failure(&config.output_root)?;
    TrainingSupervisor::new(config.clone()).run().await?;
    Ok(())
}

/// Message, cause chain and backtrace, as surfaced for a failed job
pub fn format_failure(err: &anyhow::Error) -> String {
    format!("Exception during training: {}\n{:?}", err, err)
}

/// Write the failure report to `<output_root>/failure`
pub fn write_failure(output_root: &Path, report: &str) -> Result<()> {
    std::fs::create_dir_all(output_root)
        .with_context(|| format!("Failed to create {}", output_root.display()))?;
    let path = output_root.join(FAILURE_FILE);
    std::fs::write(&path, report).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Remove a failure file left behind by an earlier attempt
fn clear_stale_failure(output_root: &Path) -> Result<()> {
    let path = output_root.join(FAILURE_FILE);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            info!("Removed stale failure file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_with_script(root: &Path, body: &str) -> EntryPointConfig {
        let script = root.join("trainer.sh");
        std::fs::write(&script, format!("{}\n", body)).unwrap();
        EntryPointConfig::new()
            .with_input_root(root.join("input"))
            .with_output_root(root.join("output"))
            .with_program("sh")
            .with_program_args([script.to_string_lossy().into_owned()])
    }

    fn populate_channel(config: &EntryPointConfig) {
        std::fs::create_dir_all(config.channel_dir()).unwrap();
        std::fs::write(config.config_path(), "epochs: 1\n").unwrap();
        std::fs::write(config.channel_dir().join("data.csv"), "x,y\n1,2\n").unwrap();
    }

    #[tokio::test]
    async fn test_empty_channel_exits_255() {
        let root = tempdir().unwrap();
        let marker = root.path().join("invoked");
        let config = config_with_script(root.path(), &format!("touch {}", marker.display()));
        std::fs::create_dir_all(config.channel_dir()).unwrap();

        assert_eq!(run_entry_point(&config).await, FAILURE_EXIT_CODE);
        assert!(!marker.exists());

        let report = std::fs::read_to_string(config.failure_path()).unwrap();
        assert!(report.starts_with("Exception during training: No input files found"));
    }

    #[tokio::test]
    async fn test_success_exits_0_without_failure_file() {
        let root = tempdir().unwrap();
        let config = config_with_script(root.path(), "exit 0");
        populate_channel(&config);

        assert_eq!(run_entry_point(&config).await, SUCCESS_EXIT_CODE);
        assert!(!config.failure_path().exists());
    }

    #[tokio::test]
    async fn test_program_failure_writes_report() {
        let root = tempdir().unwrap();
        let config = config_with_script(root.path(), "echo boom >&2; exit 7");
        populate_channel(&config);

        assert_eq!(run_entry_point(&config).await, FAILURE_EXIT_CODE);

        let report = std::fs::read_to_string(config.failure_path()).unwrap();
        assert!(!report.is_empty());
        assert!(report.contains("Training program 'sh' exited with code 7"));
    }

    #[tokio::test]
    async fn test_stale_failure_is_cleared_on_success() {
        let root = tempdir().unwrap();
        let config = config_with_script(root.path(), "exit 0");
        populate_channel(&config);
        write_failure(&config.output_root, "old failure").unwrap();

        assert_eq!(run_entry_point(&config).await, SUCCESS_EXIT_CODE);
        assert!(!config.failure_path().exists());
    }

    #[test]
    fn test_format_failure_includes_causes() {
        let err = anyhow::Error::new(TrainingError::Spawn {
            program: "trainer".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
        let report = format_failure(&err);
        assert!(report.starts_with("Exception during training: Failed to start training program 'trainer'"));
        assert!(report.contains("Caused by:"));
        assert!(report.contains("no such file"));
    }
}
