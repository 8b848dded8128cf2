//! Hospital ETL pipeline.
//!
//! Runs ordered SQL scripts against embedded DuckDB databases (operational
//! schema, generated load data, star schema, incremental ETL) with one
//! transaction per script, and records every ETL execution in an
//! append-only control table.
//!
//! The synthetic dataset itself comes from the `hospital_data_gen` crate.

pub mod compression;
pub mod config;
pub mod control;
pub mod db;
pub mod error;
pub mod etl;
pub mod parser;
pub mod runner;

pub use config::DbConfig;
pub use control::{ControlLogger, ControlRecord, LoadStatus};
pub use db::{Connector, DuckDbConnector, Target};
pub use error::{PipelineError, PipelineResult};
pub use etl::{EtlOutcome, IncrementalEtl};
pub use runner::{RunSummary, ScriptReport, ScriptRunner, Step, StepFailure, StepReport};
