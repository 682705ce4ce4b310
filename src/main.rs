use anyhow::{Context, Result};
use training_pipeline::cli::commands::{HistoryCommand, ListCommand, SubmitCommand, ValidateCommand};
use training_pipeline::cli::output::*;
use training_pipeline::cli::{Cli, Command};
use training_pipeline::core::config::PipelineConfig;
use training_pipeline::core::{Branch, Pipeline, RunStatus};
use training_pipeline::execution::{
    ExecutionEngine, ExecutionEvent, LocalBackendConfig, LocalProcessBackend,
};
use training_pipeline::persistence::{
    create_summary, InMemoryPersistence, PersistenceBackend, RunSummary, SqliteRunStore,
};
use std::sync::{Arc, Mutex};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Submit(cmd) => submit_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::List(cmd) => list_pipelines(cmd).await?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

async fn submit_pipeline(cmd: &SubmitCommand) -> Result<()> {
    let config = PipelineConfig::load(cmd.file.as_deref())
        .context("Failed to load pipeline definition")?;
    let pipeline = config.to_pipeline();

    println!("{} Loaded pipeline: {}", INFO, style(&pipeline.name).bold());

    for (key, value) in &cmd.params {
        println!(
            "{} Parameter override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    if cmd.dry_run {
        return dry_run(&pipeline, &cmd.params);
    }

    // Spinner lives between job submission and completion
    let spinner: Arc<Mutex<Option<indicatif::ProgressBar>>> = Arc::new(Mutex::new(None));

    // Entry point output is printed above the spinner
    let output_spinner = spinner.clone();
    let mut backend_config = LocalBackendConfig::new().with_output_handler(move |line| {
        match output_spinner.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(bar) => bar.println(format!("  {}", style(line).dim())),
            None => eprintln!("  {}", line),
        }
    });
    if let Some(runs_dir) = &cmd.runs_dir {
        backend_config = backend_config.with_runs_dir(runs_dir);
    }
    if let Some(entry_point) = &cmd.entry_point {
        backend_config = backend_config.with_entry_point(entry_point);
    }

    let store: Arc<dyn PersistenceBackend> = if cmd.no_history {
        Arc::new(InMemoryPersistence::new())
    } else {
        Arc::new(SqliteRunStore::with_default_path().await?)
    };

    let mut engine = ExecutionEngine::new(LocalProcessBackend::new(backend_config));

    let handler_spinner = spinner.clone();
    engine.add_event_handler(move |event| {
        let Ok(mut slot) = handler_spinner.lock() else {
            return;
        };
        if let Some(bar) = slot.take() {
            bar.finish_and_clear();
        }
        println!("{}", format_execution_event(event));
        if let ExecutionEvent::JobSubmitted { job_name, .. } = event {
            *slot = Some(create_spinner(format!("Training job {} running", job_name)));
        }
    });

    println!();
    let run = engine
        .submit(&pipeline, &cmd.params)
        .await
        .context("Failed to submit pipeline")?;

    let summary = create_summary(&run);
    store.save_run(&summary).await?;
    if !cmd.no_history {
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&summary.run_id.to_string()[..8]).dim()
        );
    }

    // Print final status
    if run.status == RunStatus::Succeeded {
        println!(
            "\n{} {} completed {}",
            CHECK,
            style(&pipeline.name).bold(),
            style("successfully").green()
        );
        Ok(())
    } else {
        println!(
            "\n{} {} {}",
            CROSS,
            style(&pipeline.name).bold(),
            style("failed").red()
        );
        if let Some(reason) = &run.failure_reason {
            println!("{}", format_failure_reason(reason, 20));
            error!("{}", reason.lines().next().unwrap_or_default());
        }
        std::process::exit(1);
    }
}

fn dry_run(pipeline: &Pipeline, overrides: &[(String, String)]) -> Result<()> {
    let params = pipeline.bind(overrides)?;
    println!("{} Bound parameters:\n{}", INFO, format_parameters(&params));

    match pipeline.evaluate(&params, uuid::Uuid::new_v4())? {
        Branch::Train(job) => {
            println!(
                "{} {} holds; {} would launch:",
                CHECK,
                style(&pipeline.condition).cyan(),
                style(&pipeline.train.name).bold()
            );
            println!("{}", serde_json::to_string_pretty(&job)?);
            Ok(())
        }
        Branch::Fail(message) => {
            println!(
                "{} {} does not hold; {} would stop the run:",
                CROSS,
                style(&pipeline.condition).cyan(),
                style(&pipeline.fail.name).bold()
            );
            println!("  {}", style(message).red());
            std::process::exit(1);
        }
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::load(cmd.file.as_deref()) {
        Ok(config) => {
            println!("{} Pipeline definition is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Condition: {}", style(&config.steps.condition).cyan());
            println!(
                "  Max parallel steps: {}",
                style(config.parallelism.max_parallel_execution_steps).cyan()
            );
            println!("  Parameters:\n{}", format_parameter_defs(&config.parameters));

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

async fn list_pipelines(cmd: &ListCommand) -> Result<()> {
    let store = SqliteRunStore::with_default_path().await?;
    let pipelines = store.list_pipelines().await?;

    if pipelines.is_empty() {
        println!("{} No pipelines found in history", INFO);
        return Ok(());
    }

    println!("{} Pipelines in history:", INFO);

    let mut json_data = Vec::new();
    for pipeline_name in &pipelines {
        let runs = store.list_runs(pipeline_name).await?;
        let succeeded = runs.iter().filter(|r| r.status == RunStatus::Succeeded).count();
        let failed = runs.iter().filter(|r| r.status == RunStatus::Failed).count();

        if cmd.with_counts {
            println!(
                "  {} ({} runs: {} succeeded, {} failed)",
                style(pipeline_name).bold(),
                style(runs.len()).cyan(),
                style(succeeded).green(),
                style(failed).red()
            );
        } else {
            println!("  {}", style(pipeline_name).bold());
        }

        json_data.push(serde_json::json!({
            "name": pipeline_name,
            "run_count": runs.len(),
            "succeeded": succeeded,
            "failed": failed,
        }));
    }

    if cmd.json {
        let data = serde_json::json!({ "pipelines": json_data });
        println!("\n{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = SqliteRunStore::with_default_path().await?;

    // If specific run ID is requested
    if let Some(run_id) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id).context("Invalid run ID format")?;
        match store.load_run(run_id).await? {
            Some(summary) => print_run_details(&summary, cmd.details, cmd.json)?,
            None => println!("{} Run not found", WARN),
        }
        return Ok(());
    }

    // List runs for pipeline or all
    let mut runs = if let Some(pipeline_name) = &cmd.pipeline {
        store.list_runs(pipeline_name).await?
    } else {
        let mut all_runs = Vec::new();
        for pipeline in store.list_pipelines().await? {
            all_runs.extend(store.list_runs(&pipeline).await?);
        }
        all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_runs
    };
    runs.truncate(cmd.limit);

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{} Run history (showing latest {}):", INFO, runs.len());
        for summary in &runs {
            println!("  {}", format_run_summary(summary));
        }
    }

    Ok(())
}

fn print_run_details(summary: &RunSummary, details: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.run_id).cyan());
    println!("  Pipeline: {}", style(&summary.pipeline_name).bold());
    println!("  Status: {}", format_status(summary.status));
    if let Some(branch) = summary.branch {
        println!("  Branch: {}", style(format!("{:?}", branch)).cyan());
    }
    if let Some(job_name) = &summary.job_name {
        println!("  Job: {}", style(job_name).dim());
    }
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!("  Parameters:\n{}", format_parameters(&summary.parameters));

    if let Some(reason) = &summary.failure_reason {
        println!("  Failure reason:");
        println!("{}", separator());
        let max_lines = if details { usize::MAX } else { 10 };
        println!("{}", format_failure_reason(reason, max_lines));
        println!("{}", separator());
    }

    Ok(())
}
