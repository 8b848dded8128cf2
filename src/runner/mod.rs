//! Ordered execution of SQL script files.
//!
//! Each step reads one file, opens a fresh connection to its database, and
//! runs every statement inside a single transaction. The first failing
//! statement rolls the step back and stops the pipeline; steps that already
//! committed stay committed. Steps carrying a load type are ETL loads and
//! append one `etl_control` row for their outcome.

pub mod config;

use crate::compression;
use crate::control::{ControlLogger, ControlRecord};
use crate::db::{Connector, DuckDbConnector, Target};
use crate::error::{PipelineError, PipelineResult};
use crate::parser::{parse_statement, preview, split_statements, InsertParser, StatementType};
use ahash::AHashMap;
use duckdb::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub use config::{default_steps, PipelineConfig};

/// Characters of a failing statement kept in error messages
pub const PREVIEW_CHARS: usize = 50;

/// One SQL file to run against one database
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub description: String,
    pub path: PathBuf,
    pub target: Target,
    /// Databases attached read-only, under [`Target::alias`]
    pub attach: Vec<Target>,
    /// Set for ETL loads, whose outcome is recorded in the control table
    pub load_type: Option<String>,
}

impl Step {
    pub fn new(description: impl Into<String>, path: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            description: description.into(),
            path: path.into(),
            target,
            attach: Vec::new(),
            load_type: None,
        }
    }

    pub fn attach(mut self, target: Target) -> Self {
        self.attach.push(target);
        self
    }

    pub fn with_load_type(mut self, load_type: impl Into<String>) -> Self {
        self.load_type = Some(load_type.into());
        self
    }
}

/// Outcome of executing one script in one transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScriptReport {
    pub statements: usize,
    pub rows_affected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub description: String,
    pub path: PathBuf,
    pub database: String,
    pub statements: usize,
    pub rows_affected: usize,
    pub elapsed_ms: u128,
    /// Load type of the control row written for this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub steps: Vec<StepReport>,
}

impl RunSummary {
    pub fn total_statements(&self) -> usize {
        self.steps.iter().map(|s| s.statements).sum()
    }

    pub fn total_rows(&self) -> usize {
        self.steps.iter().map(|s| s.rows_affected).sum()
    }
}

/// The step that stopped a run, plus what completed before it
#[derive(Debug, thiserror::Error)]
#[error("step {index} ({description}) failed: {error}")]
pub struct StepFailure {
    /// 1-based position of the failing step
    pub index: usize,
    pub description: String,
    #[source]
    pub error: PipelineError,
    /// Control row for a failed ETL load that could not be written
    pub logging: Option<PipelineError>,
    pub completed: Vec<StepReport>,
}

/// Dry-run view of one step
#[derive(Debug, Clone, Serialize)]
pub struct StepPlan {
    pub description: String,
    pub path: PathBuf,
    pub database: String,
    pub statements: usize,
    /// `(table, rows)` for every INSERT target, sorted by table name
    pub insert_rows: Vec<(String, usize)>,
}

/// Progress notifications emitted while a run executes
#[derive(Debug)]
pub enum RunEvent<'a> {
    StepStarted {
        index: usize,
        step: &'a Step,
        statements: usize,
    },
    StatementDone {
        index: usize,
    },
    StepFinished {
        report: &'a StepReport,
    },
    StepFailed {
        index: usize,
    },
}

pub struct ScriptRunner<C: Connector = DuckDbConnector> {
    connector: C,
    progress_fn: Option<Box<dyn Fn(RunEvent<'_>)>>,
}

impl<C: Connector> ScriptRunner<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            progress_fn: None,
        }
    }

    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(RunEvent<'_>) + 'static,
    {
        self.progress_fn = Some(Box::new(f));
        self
    }

    fn emit(&self, event: RunEvent<'_>) {
        if let Some(ref f) = self.progress_fn {
            f(event);
        }
    }

    /// Run every step in order, stopping at the first failure
    pub fn run(&self, steps: &[Step]) -> Result<RunSummary, StepFailure> {
        let mut summary = RunSummary::default();

        for (i, step) in steps.iter().enumerate() {
            let index = i + 1;
            info!(step = index, description = %step.description, path = %step.path.display(), "starting step");

            match self.run_step(index, step) {
                Ok(report) => {
                    info!(
                        step = index,
                        statements = report.statements,
                        rows = report.rows_affected,
                        "step committed"
                    );
                    if let Some(load_type) = &step.load_type {
                        let record = ControlRecord::success(load_type, report.rows_affected);
                        if let Err(error) = self.record_load(&record) {
                            // The load itself stays committed
                            self.emit(RunEvent::StepFailed { index });
                            return Err(StepFailure {
                                index,
                                description: step.description.clone(),
                                error,
                                logging: None,
                                completed: summary.steps,
                            });
                        }
                    }
                    self.emit(RunEvent::StepFinished { report: &report });
                    summary.steps.push(report);
                }
                Err(error) => {
                    warn!(step = index, description = %step.description, %error, "step failed, aborting run");
                    let logging = step.load_type.as_ref().and_then(|load_type| {
                        self.record_load(&ControlRecord::failure(load_type, &error))
                            .err()
                    });
                    self.emit(RunEvent::StepFailed { index });
                    return Err(StepFailure {
                        index,
                        description: step.description.clone(),
                        error,
                        logging,
                        completed: summary.steps,
                    });
                }
            }
        }

        Ok(summary)
    }

    fn record_load(&self, record: &ControlRecord) -> PipelineResult<()> {
        ControlLogger::new(&self.connector).record(record)
    }

    fn run_step(&self, index: usize, step: &Step) -> PipelineResult<StepReport> {
        let start = Instant::now();

        let database = self
            .connector
            .resolve(&step.target)?
            .unwrap_or_else(|| ":memory:".to_string());
        let sql = read_script(&step.path)?;
        let statements = split_statements(&sql);

        let mut conn = self.connector.connect(&step.target, &step.attach)?;
        self.emit(RunEvent::StepStarted {
            index,
            step,
            statements: statements.len(),
        });

        let report = execute_statements(&mut conn, &statements, |n| {
            self.emit(RunEvent::StatementDone { index: n })
        })?;

        Ok(StepReport {
            description: step.description.clone(),
            path: step.path.clone(),
            database,
            statements: report.statements,
            rows_affected: report.rows_affected,
            elapsed_ms: start.elapsed().as_millis(),
            load_type: step.load_type.clone(),
        })
    }

    /// Execute a whole script in one transaction on an open connection
    pub fn execute_script(conn: &mut Connection, sql: &str) -> PipelineResult<ScriptReport> {
        execute_statements(conn, &split_statements(sql), |_| {})
    }

    /// Read and split every step without connecting
    pub fn plan(&self, steps: &[Step]) -> PipelineResult<Vec<StepPlan>> {
        steps
            .iter()
            .map(|step| {
                let database = self
                    .connector
                    .resolve(&step.target)?
                    .unwrap_or_else(|| ":memory:".to_string());
                let sql = read_script(&step.path)?;
                let statements = split_statements(&sql);

                let mut insert_rows: AHashMap<String, usize> = AHashMap::new();
                for stmt in &statements {
                    let (kind, table) = parse_statement(stmt);
                    if kind != StatementType::Insert {
                        continue;
                    }
                    // INSERT ... SELECT has no literal rows to count
                    let rows = InsertParser::new(stmt)
                        .parse()
                        .map(|parsed| parsed.rows.len())
                        .unwrap_or(0);
                    *insert_rows.entry(table).or_default() += rows;
                }

                let mut insert_rows: Vec<(String, usize)> = insert_rows.into_iter().collect();
                insert_rows.sort();

                Ok(StepPlan {
                    description: step.description.clone(),
                    path: step.path.clone(),
                    database,
                    statements: statements.len(),
                    insert_rows,
                })
            })
            .collect()
    }
}

fn execute_statements<F>(
    conn: &mut Connection,
    statements: &[String],
    mut on_done: F,
) -> PipelineResult<ScriptReport>
where
    F: FnMut(usize),
{
    let tx = conn.transaction().map_err(PipelineError::Transaction)?;
    let mut report = ScriptReport::default();

    for (i, stmt) in statements.iter().enumerate() {
        match tx.execute(stmt, []) {
            Ok(changed) => {
                report.statements += 1;
                report.rows_affected += changed;
                debug!(statement = i + 1, rows = changed, "statement executed");
                on_done(i + 1);
            }
            Err(source) => {
                // Dropping `tx` rolls the transaction back.
                return Err(PipelineError::Statement {
                    index: i + 1,
                    statement: preview(stmt, PREVIEW_CHARS),
                    source,
                });
            }
        }
    }

    tx.commit().map_err(PipelineError::Transaction)?;
    Ok(report)
}

/// Read a script, treating a missing file as a configuration error
pub fn read_script(path: &Path) -> PipelineResult<String> {
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    compression::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}
