//! Append-only ETL control table.
//!
//! Every ETL execution writes exactly one row to `etl_control` through its
//! own connection and transaction, so a failed load can still be recorded.

use crate::db::{Connector, DuckDbConnector, Target};
use crate::error::{PipelineError, PipelineResult};
use chrono::{Local, NaiveDateTime, Timelike};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error};

pub const CONTROL_TABLE: &str = "etl_control";

/// Default load type for the incremental trigger
pub const INCREMENTAL: &str = "INCREMENTAL";

const LOAD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const CREATE_CONTROL_TABLE: &str = "CREATE TABLE IF NOT EXISTS etl_control (
    load_type VARCHAR NOT NULL,
    load_date TIMESTAMP NOT NULL,
    records_processed BIGINT,
    status VARCHAR NOT NULL CHECK (status IN ('SUCCESS', 'FAILURE')),
    error_message VARCHAR
)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadStatus {
    Success,
    Failure,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Success => "SUCCESS",
            LoadStatus::Failure => "FAILURE",
        }
    }

    fn parse(s: &str) -> PipelineResult<Self> {
        match s {
            "SUCCESS" => Ok(LoadStatus::Success),
            "FAILURE" => Ok(LoadStatus::Failure),
            other => Err(PipelineError::Logging(format!(
                "unknown status '{}' in {}",
                other, CONTROL_TABLE
            ))),
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One row of `etl_control`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlRecord {
    pub load_type: String,
    pub load_date: NaiveDateTime,
    pub records_processed: Option<i64>,
    pub status: LoadStatus,
    pub error_message: Option<String>,
}

impl ControlRecord {
    pub fn success(load_type: impl Into<String>, records_processed: usize) -> Self {
        Self {
            load_type: load_type.into(),
            load_date: now(),
            records_processed: Some(records_processed as i64),
            status: LoadStatus::Success,
            error_message: None,
        }
    }

    /// Failures always record zero processed rows
    pub fn failure(load_type: impl Into<String>, err: &dyn std::error::Error) -> Self {
        Self {
            load_type: load_type.into(),
            load_date: now(),
            records_processed: Some(0),
            status: LoadStatus::Failure,
            error_message: Some(err.to_string()),
        }
    }
}

fn now() -> NaiveDateTime {
    let local = Local::now().naive_local();
    // Stored at second precision
    local.with_nanosecond(0).unwrap_or(local)
}

pub struct ControlLogger<C: Connector = DuckDbConnector> {
    connector: C,
}

impl<C: Connector> ControlLogger<C> {
    /// Log into the star database
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    fn open(&self) -> PipelineResult<duckdb::Connection> {
        self.connector
            .connect(&Target::Star, &[])
            .map_err(|e| PipelineError::Logging(e.to_string()))
    }

    /// Append one record in its own transaction
    pub fn record(&self, record: &ControlRecord) -> PipelineResult<()> {
        let result = self.open().and_then(|mut conn| {
            conn.execute_batch(CREATE_CONTROL_TABLE).map_err(|e| {
                PipelineError::Logging(format!("creating {}: {}", CONTROL_TABLE, e))
            })?;
            let tx = conn
                .transaction()
                .map_err(|e| PipelineError::Logging(e.to_string()))?;
            tx.execute(
                "INSERT INTO etl_control (load_type, load_date, records_processed, status, error_message)
                 VALUES (?, CAST(? AS TIMESTAMP), ?, ?, ?)",
                duckdb::params![
                    record.load_type,
                    record.load_date.format(LOAD_DATE_FORMAT).to_string(),
                    record.records_processed,
                    record.status.as_str(),
                    record.error_message,
                ],
            )
            .map_err(|e| PipelineError::Logging(format!("inserting control row: {}", e)))?;
            tx.commit()
                .map_err(|e| PipelineError::Logging(e.to_string()))
        });

        match &result {
            Ok(()) => debug!(
                load_type = %record.load_type,
                status = %record.status,
                records = ?record.records_processed,
                "control record written"
            ),
            Err(e) => error!(load_type = %record.load_type, error = %e, "control record not written"),
        }
        result
    }

    /// Most recent records, newest first
    ///
    /// Never creates the database or the table: a warehouse that has not
    /// been logged to yet has an empty history.
    pub fn history(&self, limit: usize) -> PipelineResult<Vec<ControlRecord>> {
        let exists = self
            .connector
            .exists(&Target::Star)
            .map_err(|e| PipelineError::Logging(e.to_string()))?;
        if !exists {
            return Ok(Vec::new());
        }

        let conn = self.open()?;
        let read_err = |e: duckdb::Error| PipelineError::Logging(format!("reading history: {}", e));

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
                [CONTROL_TABLE],
                |row| row.get(0),
            )
            .map_err(read_err)?;
        if tables == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn
            .prepare(
                "SELECT load_type, strftime(load_date, '%Y-%m-%d %H:%M:%S'), records_processed, status, error_message
                 FROM etl_control
                 ORDER BY load_date DESC, rowid DESC
                 LIMIT ?",
            )
            .map_err(read_err)?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(read_err)?;

        let mut records = Vec::new();
        for row in rows {
            let (load_type, load_date, records_processed, status, error_message) =
                row.map_err(read_err)?;
            let load_date = NaiveDateTime::parse_from_str(&load_date, LOAD_DATE_FORMAT)
                .map_err(|e| PipelineError::Logging(format!("bad load_date '{}': {}", load_date, e)))?;
            records.push(ControlRecord {
                load_type,
                load_date,
                records_processed,
                status: LoadStatus::parse(&status)?,
                error_message,
            });
        }
        Ok(records)
    }
}
