//! Local process backend - runs the training entry point as a child process

use crate::core::JobSpec;
use crate::entrypoint::config::{
    ENV_CHANNEL, ENV_INPUT_ROOT, ENV_OUTPUT_ROOT, FAILURE_FILE,
};
use crate::execution::backend::{BackendError, JobOutcome, TrainingBackend};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const ENV_MODEL_DIR: &str = "TRAINING_MODEL_DIR";
pub const ENV_IMAGE: &str = "TRAINING_IMAGE";
pub const ENV_INSTANCE_TYPE: &str = "TRAINING_INSTANCE_TYPE";
pub const ENV_VOLUME_SIZE_GB: &str = "TRAINING_VOLUME_SIZE_GB";

/// Time between SIGTERM and SIGKILL when a job is stopped
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Receives each line the entry point writes to stdout or stderr
pub type OutputHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration for the local backend
#[derive(Clone)]
pub struct LocalBackendConfig {
    /// Parent of the per-job run directories
    pub runs_dir: PathBuf,

    /// Entry point executable (the `train` binary)
    pub entry_point: String,

    /// Arguments passed to the entry point
    pub entry_point_args: Vec<String>,

    /// Channel the job input is staged into
    pub channel: String,

    /// Where entry point output goes; inherited from this process when unset
    pub output_handler: Option<OutputHandler>,
}

impl fmt::Debug for LocalBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBackendConfig")
            .field("runs_dir", &self.runs_dir)
            .field("entry_point", &self.entry_point)
            .field("entry_point_args", &self.entry_point_args)
            .field("channel", &self.channel)
            .field("output_handler", &self.output_handler.is_some())
            .finish()
    }
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            runs_dir: data_dir.join("training-pipeline").join("runs"),
            entry_point: "train".to_string(),
            entry_point_args: Vec::new(),
            channel: "train".to_string(),
            output_handler: None,
        }
    }
}

impl LocalBackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runs_dir(mut self, runs_dir: impl Into<PathBuf>) -> Self {
        self.runs_dir = runs_dir.into();
        self
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn with_entry_point_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_point_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.output_handler = Some(Arc::new(handler));
        self
    }
}

/// Directory layout of one job
#[derive(Debug, Clone)]
pub struct RunDirectory {
    pub root: PathBuf,
    pub input_root: PathBuf,
    pub channel_dir: PathBuf,
    pub output_root: PathBuf,
    pub model_dir: PathBuf,
}

impl RunDirectory {
    fn new(runs_dir: &Path, job_name: &str, channel: &str) -> Self {
        let root = runs_dir.join(job_name);
        let input_root = root.join("input").join("data");
        Self {
            channel_dir: input_root.join(channel),
            input_root,
            output_root: root.join("output"),
            model_dir: root.join("model"),
            root,
        }
    }

    /// Create the layout from scratch
    fn create(&self) -> io::Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        std::fs::create_dir_all(&self.channel_dir)?;
        std::fs::create_dir_all(&self.output_root)?;
        std::fs::create_dir_all(&self.model_dir)?;
        Ok(())
    }
}

/// Local filesystem path of a location, if it has one
pub fn local_path(location: &str) -> Option<PathBuf> {
    if let Some(path) = location.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if location.contains("://") {
        return None;
    }
    Some(PathBuf::from(location))
}

/// Copy a file or directory tree into `dest`, returning the number of files copied
fn copy_tree(src: &Path, dest: &Path) -> io::Result<usize> {
    if src.is_file() {
        let name = src.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "source has no file name")
        })?;
        std::fs::copy(src, dest.join(name))?;
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Forward each line of `reader` to `handler`
fn forward_lines<R>(reader: R, handler: OutputHandler) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            handler(&line);
        }
    })
}

/// Stop the entry point and everything it started.
///
/// The entry point leads its own process group: the group gets SIGTERM,
/// then SIGKILL once the grace period is over, then the child is reaped.
#[cfg(unix)]
async fn terminate_process_group(child: &mut Child, grace: Duration) {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let group = Pid::from_raw(-(pid as i32));

    match kill(group, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!("SIGTERM to process group {} failed: {}", pid, e),
    }

    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        if child.try_wait().ok().flatten().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // The group can outlive its leader
    match kill(group, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!("SIGKILL to process group {} failed: {}", pid, e),
    }

    let _ = child.wait().await;
}

#[cfg(not(unix))]
async fn terminate_process_group(child: &mut Child, _grace: Duration) {
    let _ = child.kill().await;
    let _ = child.wait().await;
}

/// Runs jobs on this machine.
///
/// Each job gets a fresh run directory laid out like the training
/// environment; the entry point is pointed at it through `TRAINING_*`
/// variables and killed once the job's maximum runtime elapses.
#[derive(Debug, Clone)]
pub struct LocalProcessBackend {
    config: LocalBackendConfig,
}

impl LocalProcessBackend {
    pub fn new(config: LocalBackendConfig) -> Self {
        Self { config }
    }

    pub fn run_directory(&self, job: &JobSpec) -> RunDirectory {
        RunDirectory::new(&self.config.runs_dir, &job.job_name, &self.config.channel)
    }

    /// Stage the job input into the channel.
    ///
    /// Sources that are not local or do not exist leave the channel empty;
    /// the entry point reports that as missing input.
    fn stage_input(&self, job: &JobSpec, dirs: &RunDirectory) -> io::Result<usize> {
        let Some(source) = local_path(&job.input_data) else {
            warn!("Input location {} is not a local path; channel left empty", job.input_data);
            return Ok(0);
        };
        if !source.exists() {
            warn!("Input location {} does not exist; channel left empty", source.display());
            return Ok(0);
        }
        copy_tree(&source, &dirs.channel_dir)
    }

    /// Copy model artifacts to `<output_path>/<job_name>`
    fn deliver_model(&self, job: &JobSpec, dirs: &RunDirectory) -> io::Result<Option<PathBuf>> {
        let Some(output) = local_path(&job.output_path) else {
            warn!("Output location {} is not a local path; model not delivered", job.output_path);
            return Ok(None);
        };
        let dest = output.join(&job.job_name);
        std::fs::create_dir_all(&dest)?;
        let copied = copy_tree(&dirs.model_dir, &dest)?;
        debug!("Delivered {} model file(s) to {}", copied, dest.display());
        Ok(Some(dest))
    }

    /// Entry point invocation for `job`, leading its own process group on unix
    fn entry_point_command(&self, job: &JobSpec, dirs: &RunDirectory) -> Command {
        let mut std_command = std::process::Command::new(&self.config.entry_point);
        std_command
            .args(&self.config.entry_point_args)
            .env(ENV_INPUT_ROOT, &dirs.input_root)
            .env(ENV_OUTPUT_ROOT, &dirs.output_root)
            .env(ENV_CHANNEL, &self.config.channel)
            .env(ENV_MODEL_DIR, &dirs.model_dir)
            .env(ENV_IMAGE, &job.image)
            .env(ENV_INSTANCE_TYPE, &job.instance_type)
            .env(ENV_VOLUME_SIZE_GB, job.volume_size_gb.to_string());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_command.process_group(0);
        }

        if self.config.output_handler.is_some() {
            std_command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut command = Command::from(std_command);
        command.kill_on_drop(true);
        command
    }

    fn failure_reason(dirs: &RunDirectory, code: Option<i32>) -> String {
        let reported = std::fs::read_to_string(dirs.output_root.join(FAILURE_FILE))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        reported.unwrap_or_else(|| match code {
            Some(code) => format!("Entry point exited with code {}", code),
            None => "Entry point was terminated by a signal".to_string(),
        })
    }
}

#[async_trait]
impl TrainingBackend for LocalProcessBackend {
    async fn run_job(&self, job: &JobSpec) -> Result<JobOutcome, BackendError> {
        let dirs = self.run_directory(job);
        let staging_error = |source| BackendError::Staging {
            job: job.job_name.clone(),
            source,
        };

        dirs.create().map_err(staging_error)?;
        let staged = self.stage_input(job, &dirs).map_err(staging_error)?;
        info!(
            "Staged {} input file(s) for job {} in {}",
            staged,
            job.job_name,
            dirs.root.display()
        );

        let mut child = self
            .entry_point_command(job, &dirs)
            .spawn()
            .map_err(|source| BackendError::Launch {
                program: self.config.entry_point.clone(),
                source,
            })?;

        let mut forwarders = Vec::new();
        if let Some(handler) = &self.config.output_handler {
            if let Some(stdout) = child.stdout.take() {
                forwarders.push(forward_lines(stdout, handler.clone()));
            }
            if let Some(stderr) = child.stderr.take() {
                forwarders.push(forward_lines(stderr, handler.clone()));
            }
        }

        let ceiling = Duration::from_secs(job.max_runtime_secs);
        let waited = timeout(ceiling, child.wait()).await;
        if waited.is_err() {
            warn!(
                "Job {} exceeded its maximum runtime of {}s; stopping it",
                job.job_name, job.max_runtime_secs
            );
            terminate_process_group(&mut child, STOP_GRACE_PERIOD).await;
        }
        for forwarder in forwarders {
            let _ = forwarder.await;
        }

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                return Err(BackendError::Launch {
                    program: self.config.entry_point.clone(),
                    source,
                })
            }
            Err(_) => {
                return Ok(JobOutcome::Failed(format!(
                    "Training job exceeded the maximum runtime of {} seconds",
                    job.max_runtime_secs
                )));
            }
        };

        if !status.success() {
            let reason = Self::failure_reason(&dirs, status.code());
            warn!("Job {} failed: {}", job.job_name, reason.lines().next().unwrap_or(""));
            return Ok(JobOutcome::Failed(reason));
        }

        if let Some(dest) = self.deliver_model(job, &dirs).map_err(|source| BackendError::Delivery {
            job: job.job_name.clone(),
            source,
        })? {
            info!("Model for job {} delivered to {}", job.job_name, dest.display());
        }

        Ok(JobOutcome::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("file:///data/train"), Some(PathBuf::from("/data/train")));
        assert_eq!(local_path("/data/train"), Some(PathBuf::from("/data/train")));
        assert_eq!(local_path("relative/dir"), Some(PathBuf::from("relative/dir")));
        assert_eq!(local_path("s3://bucket/train"), None);
    }

    #[test]
    fn test_copy_tree_nested() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("shard")).unwrap();
        std::fs::write(src.path().join("a.csv"), "1").unwrap();
        std::fs::write(src.path().join("shard").join("b.csv"), "2").unwrap();

        let copied = copy_tree(src.path(), dest.path()).unwrap();
        assert_eq!(copied, 2);
        assert!(dest.path().join("a.csv").is_file());
        assert!(dest.path().join("shard").join("b.csv").is_file());
    }

    #[test]
    fn test_copy_single_file() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let file = src.path().join("train.csv");
        std::fs::write(&file, "x").unwrap();

        assert_eq!(copy_tree(&file, dest.path()).unwrap(), 1);
        assert!(dest.path().join("train.csv").is_file());
    }

    #[test]
    fn test_run_directory_is_recreated() {
        let runs = tempdir().unwrap();
        let dirs = RunDirectory::new(runs.path(), "job-1", "train");
        dirs.create().unwrap();
        std::fs::write(dirs.output_root.join(FAILURE_FILE), "old").unwrap();

        dirs.create().unwrap();
        assert!(dirs.channel_dir.is_dir());
        assert!(!dirs.output_root.join(FAILURE_FILE).exists());
    }

    #[test]
    fn test_failure_reason_fallback() {
        let runs = tempdir().unwrap();
        let dirs = RunDirectory::new(runs.path(), "job-1", "train");
        dirs.create().unwrap();

        assert_eq!(
            LocalProcessBackend::failure_reason(&dirs, Some(255)),
            "Entry point exited with code 255"
        );

        std::fs::write(dirs.output_root.join(FAILURE_FILE), "Exception during training: boom\n").unwrap();
        assert_eq!(
            LocalProcessBackend::failure_reason(&dirs, Some(255)),
            "Exception during training: boom"
        );
    }
}
