//! CLI output formatting

use crate::{
    core::{BoundParameters, ParameterDef, RunStatus},
    execution::ExecutionEvent,
    persistence::RunSummary,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while a training job runs
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Horizontal rule as wide as the terminal
pub fn separator() -> String {
    // Get terminal width, default to 80 if unavailable
    let width = term_size::dimensions_stdout()
        .map(|(w, _)| w)
        .unwrap_or(80);
    "─".repeat(width.min(120))
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Executing => style("EXECUTING").yellow().to_string(),
        RunStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format run summary for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        RunStatus::Succeeded => CHECK,
        RunStatus::Failed => CROSS,
        RunStatus::Executing => SPINNER,
        RunStatus::Pending => INFO,
    };

    let mut line = format!(
        "{} {} - {} - {} - {}",
        status_icon,
        style(&summary.run_id.to_string()[..8]).dim(),
        style(&summary.pipeline_name).bold(),
        format_status(summary.status),
        style(summary.started_at.format("%Y-%m-%d %H:%M:%S")).dim()
    );

    if let Some(reason) = &summary.failure_reason {
        let first_line = reason.lines().next().unwrap_or_default();
        line.push_str(&format!(" - {}", style(first_line).red()));
    }

    line
}

/// Format declared parameters with their defaults
pub fn format_parameter_defs(params: &[ParameterDef]) -> String {
    params
        .iter()
        .map(|p| {
            let mut line = format!(
                "  {} ({}) = {}",
                style(&p.name).cyan(),
                p.param_type,
                style(&p.default).dim()
            );
            if let Some(description) = &p.description {
                line.push_str(&format!("  {}", style(description).dim()));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format bound parameter values
pub fn format_parameters(params: &BoundParameters) -> String {
    params
        .iter()
        .map(|(name, value)| format!("  {} = {}", style(name).cyan(), value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            pipeline_name,
        } => format!(
            "{} Starting pipeline {} ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::ConditionEvaluated {
            step,
            condition,
            satisfied,
        } => {
            if *satisfied {
                format!("{} {}: {}", CHECK, style(step).green(), style(condition).dim())
            } else {
                format!("{} {}: {} not met", CROSS, style(step).red(), style(condition).dim())
            }
        }
        ExecutionEvent::JobSubmitted { step, job_name } => format!(
            "{} {} → job {}",
            SPINNER,
            style(step).cyan(),
            style(job_name).dim()
        ),
        ExecutionEvent::JobCompleted {
            job_name,
            succeeded,
        } => {
            if *succeeded {
                format!("{} job {}", CHECK, style(job_name).green())
            } else {
                format!("{} job {}", CROSS, style(job_name).red())
            }
        }
        ExecutionEvent::RunCompleted {
            run_id,
            status,
            ..
        } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format a failure reason with truncation
pub fn format_failure_reason(reason: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = reason.lines().collect();

    if lines.len() <= max_lines {
        reason.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

/// Human-readable duration
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
