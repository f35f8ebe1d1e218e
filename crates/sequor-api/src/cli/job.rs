//! The `run` command: start a sequence and follow it live to completion.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;
use uuid::Uuid;

use sequor_core::sequence::{find_sequence, load_sequence_file};
use sequor_types::event::EngineEvent;
use sequor_types::job::{Job, JobState, StepOutcome};

use crate::state::AppState;

/// Run a sequence to completion, rendering progress as it goes.
///
/// `reference` is either a path to a YAML file or a sequence name resolved
/// from the sequences directory. Ctrl+C requests cancellation and keeps
/// following the job until it settles.
pub async fn run_sequence(
    state: &AppState,
    reference: &str,
    sequences_dir: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let path = Path::new(reference);
    let definition = if path.is_file() {
        load_sequence_file(path)?
    } else {
        let dir = sequences_dir.unwrap_or(&state.sequences_dir);
        find_sequence(dir, reference)?.ok_or_else(|| {
            anyhow::anyhow!(
                "no sequence named '{}' in {} (and no such file). Try `sequor sequences`.",
                reference,
                dir.display()
            )
        })?
    };

    let sequence_name = definition.name.clone();
    let total_steps = definition.steps.len();

    // Subscribe before starting so no event is missed.
    let mut events = state.registry.subscribe();
    let job_id = state.registry.start_sequence(definition)?;

    if !json && !quiet {
        println!();
        println!(
            "  {} Running {} ({} steps)  job {}",
            style("▶").cyan().bold(),
            style(&sequence_name).cyan(),
            total_steps,
            style(job_id.to_string()).dim()
        );
        println!();
    }

    let spinner = if json || quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    };

    follow_job(state, job_id, total_steps, &mut events, &spinner).await;
    spinner.finish_and_clear();

    let job = state.registry.get_status(job_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else if !quiet {
        print_report(&job);
    }

    match job.state {
        JobState::Completed => Ok(()),
        JobState::Cancelled => anyhow::bail!("job was cancelled"),
        _ => anyhow::bail!(
            "job finished {}: {}",
            job.state,
            job.error.as_deref().unwrap_or("step failure")
        ),
    }
}

/// Consume engine events for one job until its completion event arrives.
/// Ctrl+C cancels the job but keeps following it to its terminal state.
async fn follow_job(
    state: &AppState,
    job_id: Uuid,
    total_steps: usize,
    events: &mut broadcast::Receiver<EngineEvent>,
    spinner: &ProgressBar,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) if event.job_id() == job_id => match event {
                    EngineEvent::JobStarted { .. } => {
                        spinner.set_message("starting...");
                    }
                    EngineEvent::StepStarted { step_name, step_index, .. } => {
                        spinner.set_message(format!(
                            "[{}/{}] {}",
                            step_index + 1,
                            total_steps,
                            step_name
                        ));
                    }
                    EngineEvent::StepCompleted {
                        step_name,
                        outcome,
                        attempts,
                        duration_ms,
                        ..
                    } => {
                        spinner.println(format_step_line(
                            &step_name, outcome, attempts, duration_ms,
                        ));
                    }
                    EngineEvent::JobCompleted(_) => return,
                },
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event stream lagged; step lines may be missing");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            },
            _ = tokio::signal::ctrl_c() => {
                spinner.set_message("cancelling...");
                let _ = state.registry.cancel_job(job_id);
            }
        }
    }
}

/// One finished-step line for the live view.
fn format_step_line(
    step_name: &str,
    outcome: StepOutcome,
    attempts: u32,
    duration_ms: u64,
) -> String {
    let glyph = match outcome {
        StepOutcome::Success => style("✓").green().to_string(),
        StepOutcome::FallbackUsed => style("✓").yellow().to_string(),
        StepOutcome::Skipped => style("○").yellow().to_string(),
        StepOutcome::Failed => style("✗").red().to_string(),
    };
    let attempts_label = if attempts == 1 {
        "1 attempt".to_string()
    } else {
        format!("{attempts} attempts")
    };
    format!(
        "  {glyph} {step_name}  {outcome} in {} ({attempts_label})",
        format_duration(duration_ms)
    )
}

/// Compact duration: "850ms", "12.4s", "4m05s".
fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

/// Final per-step table plus a one-job summary.
fn print_report(job: &Job) {
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Step").fg(Color::White),
        Cell::new("Outcome").fg(Color::White),
        Cell::new("Attempts").fg(Color::White),
        Cell::new("Duration").fg(Color::White),
        Cell::new("Error").fg(Color::White),
    ]);

    for result in &job.results {
        let outcome_cell = match result.outcome {
            StepOutcome::Success => Cell::new("✓ success").fg(Color::Green),
            StepOutcome::FallbackUsed => Cell::new("✓ fallback_used").fg(Color::Yellow),
            StepOutcome::Skipped => Cell::new("○ skipped").fg(Color::Yellow),
            StepOutcome::Failed => Cell::new("✗ failed").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&result.step_name),
            outcome_cell,
            Cell::new(result.attempts),
            Cell::new(format_duration(result.duration_ms)),
            Cell::new(result.error.as_deref().unwrap_or("")),
        ]);
    }

    println!("{table}");
    println!();

    let state_display = match job.state {
        JobState::Completed => style("completed").green().bold(),
        JobState::Cancelled => style("cancelled").yellow().bold(),
        _ => style(job.state.as_str()).red().bold(),
    };
    let successful = job
        .results
        .iter()
        .filter(|r| r.outcome.is_successful())
        .count();

    println!("  {}  {}", style("State:").bold(), state_display);
    println!(
        "  {}  {} run, {} successful ({:.0}%)",
        style("Steps:").bold(),
        job.results.len(),
        successful,
        job.success_rate() * 100.0
    );
    println!(
        "  {}  {} collected",
        style("Facts:").bold(),
        job.facts.len()
    );
    println!(
        "  {}  {}",
        style("Total:").bold(),
        format_duration(job.duration_ms())
    );
    if let Some(error) = &job.error {
        println!("  {}  {}", style("Error:").bold(), style(error).red());
    }
    println!();
}
