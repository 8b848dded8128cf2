use anyhow::Context;
use hospital_etl::runner::{default_steps, PipelineConfig, RunEvent, StepFailure};
use hospital_etl::{DbConfig, DuckDbConnector, PipelineError, ScriptRunner, Step};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Serialize)]
struct FailureJson<'a> {
    step: usize,
    description: &'a str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    logging_error: Option<String>,
    completed: &'a [hospital_etl::StepReport],
}

pub fn run(
    pipeline: Option<PathBuf>,
    output_dir: PathBuf,
    dry_run: bool,
    progress: bool,
    json: bool,
) -> anyhow::Result<()> {
    let steps: Vec<Step> = match pipeline {
        Some(ref path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load pipeline {}", path.display()))?
            .into_steps(),
        None => default_steps(&output_dir),
    };

    let config = DbConfig::from_env().context("failed to read database settings")?;
    if !json {
        eprintln!(
            "Pipeline: {} steps [{}; data dir: {}]",
            steps.len(),
            config.describe(),
            config.data_dir.display()
        );
    }

    let mut runner = ScriptRunner::new(DuckDbConnector::new(config));

    if dry_run {
        return print_plan(&runner, &steps, json);
    }

    if progress && !json {
        runner = runner.with_progress(progress_bars()?);
    }

    let start_time = Instant::now();
    match runner.run(&steps) {
        Ok(summary) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for (i, step) in summary.steps.iter().enumerate() {
                    println!(
                        "✓ [{}/{}] {} ({}: {} statements, {} rows)",
                        i + 1,
                        steps.len(),
                        step.description,
                        step.database,
                        step.statements,
                        step.rows_affected
                    );
                    if let Some(ref load_type) = step.load_type {
                        println!("      recorded {} run in etl_control", load_type);
                    }
                }
                println!();
                println!(
                    "✓ Pipeline completed in {:.3?}: {} statements, {} rows",
                    start_time.elapsed(),
                    summary.total_statements(),
                    summary.total_rows()
                );
            }
            Ok(())
        }
        Err(failure) => {
            report_failure(&failure, steps.len(), json)?;
            std::process::exit(1);
        }
    }
}

fn report_failure(failure: &StepFailure, total: usize, json: bool) -> anyhow::Result<()> {
    if json {
        let out = FailureJson {
            step: failure.index,
            description: &failure.description,
            error: failure.error.to_string(),
            logging_error: failure.logging.as_ref().map(|e| e.to_string()),
            completed: &failure.completed,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (i, step) in failure.completed.iter().enumerate() {
        println!("✓ [{}/{}] {}", i + 1, total, step.description);
    }
    eprintln!(
        "✗ [{}/{}] {} failed",
        failure.index, total, failure.description
    );
    match &failure.error {
        PipelineError::Statement {
            index,
            statement,
            source,
        } => {
            eprintln!("  Statement {}: {}...", index, statement);
            eprintln!("  Error: {}", source);
        }
        other => eprintln!("  Error: {}", other),
    }
    if let Some(ref logging) = failure.logging {
        eprintln!("  Could not record failure in etl_control: {}", logging);
    }
    eprintln!(
        "Aborted at step {} ({}); {} remaining step(s) not run",
        failure.index,
        failure.description,
        total - failure.index
    );
    Ok(())
}

fn print_plan(
    runner: &ScriptRunner<DuckDbConnector>,
    steps: &[Step],
    json: bool,
) -> anyhow::Result<()> {
    let plans = runner.plan(steps)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    println!("✓ Dry run: nothing executed\n");
    for (i, plan) in plans.iter().enumerate() {
        println!(
            "[{}/{}] {} -> {} ({} statements)",
            i + 1,
            plans.len(),
            plan.description,
            plan.database,
            plan.statements
        );
        println!("      {}", plan.path.display());
        for (table, rows) in &plan.insert_rows {
            println!("      {:<28} {:>10} rows", table, rows);
        }
    }
    Ok(())
}

fn progress_bars() -> anyhow::Result<impl Fn(RunEvent<'_>) + 'static> {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )?
    .progress_chars("█▓▒░  ")
    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    let current: RefCell<Option<ProgressBar>> = RefCell::new(None);

    Ok(move |event: RunEvent<'_>| match event {
        RunEvent::StepStarted {
            step, statements, ..
        } => {
            let pb = ProgressBar::new(statements as u64);
            pb.set_style(style.clone());
            pb.set_message(step.description.clone());
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            *current.borrow_mut() = Some(pb);
        }
        RunEvent::StatementDone { index } => {
            if let Some(ref pb) = *current.borrow() {
                pb.set_position(index as u64);
            }
        }
        RunEvent::StepFinished { .. } => {
            if let Some(pb) = current.borrow_mut().take() {
                pb.finish_with_message("done");
            }
        }
        RunEvent::StepFailed { .. } => {
            if let Some(pb) = current.borrow_mut().take() {
                pb.abandon_with_message("failed");
            }
        }
    })
}
