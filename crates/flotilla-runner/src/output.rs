//! Run summary output on stdout.

use std::io::{self, Write};

use flotilla_core::{RunSummary, TaskOutcome, TaskResult};

use crate::config::OutputFormat;

/// Write the summary to stdout in the requested format.
pub fn emit(summary: &RunSummary, format: OutputFormat) -> io::Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(summary),
        OutputFormat::Json => render_json(summary)?,
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered)?;
    stdout.flush()
}

/// One line per task, then the tally.
pub fn render_text(summary: &RunSummary) -> String {
    let mut lines: Vec<String> = summary.outcomes.iter().map(task_line).collect();

    lines.push(if summary.failed == 0 {
        format!("all {} tasks succeeded", summary.total)
    } else {
        format!("{} of {} tasks failed", summary.failed, summary.total)
    });

    lines.join("\n")
}

/// The summary as pretty-printed JSON.
pub fn render_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

fn task_line(outcome: &TaskOutcome) -> String {
    let elapsed = format!("{:.1}s", outcome.duration_ms() as f64 / 1000.0);

    match &outcome.result {
        TaskResult::Succeeded if outcome.removed => {
            format!("completed task - {} ({}, removed)", outcome.task_name, elapsed)
        }
        TaskResult::Succeeded => format!("completed task - {} ({})", outcome.task_name, elapsed),
        TaskResult::ExitNonZero { code } => {
            format!("failed task - {} (exit code {}, {})", outcome.task_name, code, elapsed)
        }
        TaskResult::Failed { kind, message } => {
            format!("failed task - {} ({} error: {})", outcome.task_name, kind, message)
        }
    }
}
