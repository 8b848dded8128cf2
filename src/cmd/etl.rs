use anyhow::Context;
use hospital_etl::{ControlLogger, DbConfig, DuckDbConnector, IncrementalEtl, LoadStatus};
use std::path::PathBuf;
use std::time::Instant;

pub fn run(script: PathBuf, load_type: String) -> anyhow::Result<()> {
    let config = DbConfig::from_env().context("failed to read database settings")?;
    let start_time = Instant::now();

    let outcome = IncrementalEtl::new(DuckDbConnector::new(config))
        .with_script(&script)
        .with_load_type(&load_type)
        .execute();

    match &outcome.load {
        Ok(report) => println!(
            "✓ ETL completed in {:.3?}: {} statements, {} rows loaded",
            start_time.elapsed(),
            report.statements,
            report.rows_affected
        ),
        Err(e) => eprintln!("✗ ETL failed: {}", e),
    }
    match &outcome.logging {
        Ok(()) => println!("✓ Recorded {} run in etl_control", load_type),
        Err(e) => eprintln!("✗ Could not record run in etl_control: {}", e),
    }

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

pub fn status(limit: usize, json: bool) -> anyhow::Result<()> {
    let config = DbConfig::from_env().context("failed to read database settings")?;
    let history = ControlLogger::new(DuckDbConnector::new(config)).history(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No ETL runs recorded.");
        return Ok(());
    }

    println!(
        "{:<19}  {:<12} {:<8} {:>10}  Error",
        "Load date", "Type", "Status", "Records"
    );
    println!("{}", "─".repeat(80));
    for record in &history {
        let marker = match record.status {
            LoadStatus::Success => "✓",
            LoadStatus::Failure => "✗",
        };
        println!(
            "{:<19}  {:<12} {} {:<6} {:>10}  {}",
            record.load_date.format("%Y-%m-%d %H:%M:%S"),
            record.load_type,
            marker,
            record.status,
            record
                .records_processed
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
