//! Incremental warehouse load with control logging.

use crate::control::{ControlLogger, ControlRecord, INCREMENTAL};
use crate::db::{Connector, DuckDbConnector, Target};
use crate::error::PipelineResult;
use crate::runner::config::INCREMENTAL_ETL_SCRIPT;
use crate::runner::{read_script, ScriptReport, ScriptRunner};
use std::path::PathBuf;
use tracing::{info, warn};

/// Both halves of an ETL execution: the load itself and its control row
#[derive(Debug)]
pub struct EtlOutcome {
    pub load: PipelineResult<ScriptReport>,
    pub logging: PipelineResult<()>,
}

impl EtlOutcome {
    pub fn is_success(&self) -> bool {
        self.load.is_ok() && self.logging.is_ok()
    }
}

/// Runs the ETL script against the star database with the operational
/// database attached as `rdbms`
pub struct IncrementalEtl<C: Connector = DuckDbConnector> {
    connector: C,
    script: PathBuf,
    load_type: String,
}

impl<C: Connector> IncrementalEtl<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            script: PathBuf::from(INCREMENTAL_ETL_SCRIPT),
            load_type: INCREMENTAL.to_string(),
        }
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_load_type(mut self, load_type: impl Into<String>) -> Self {
        self.load_type = load_type.into();
        self
    }

    /// Run the load and record exactly one control row for it
    pub fn execute(&self) -> EtlOutcome {
        info!(script = %self.script.display(), load_type = %self.load_type, "starting ETL");

        let load = self.load();
        let record = match &load {
            Ok(report) => {
                info!(rows = report.rows_affected, "ETL load committed");
                ControlRecord::success(&self.load_type, report.rows_affected)
            }
            Err(e) => {
                warn!(error = %e, "ETL load failed");
                ControlRecord::failure(&self.load_type, e)
            }
        };

        let logging = ControlLogger::new(&self.connector).record(&record);
        EtlOutcome { load, logging }
    }

    fn load(&self) -> PipelineResult<ScriptReport> {
        let sql = read_script(&self.script)?;
        // Closed before the control logger opens the same database
        let mut conn = self.connector.connect(&Target::Star, &[Target::Rdbms])?;
        ScriptRunner::<C>::execute_script(&mut conn, &sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::control::LoadStatus;

    #[test]
    fn test_borrowed_connector_loads_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let connector = DuckDbConnector::new(
            DbConfig {
                rdbms_database: Some("ops".to_string()),
                star_database: Some("wh".to_string()),
                ..DbConfig::default()
            }
            .with_data_dir(dir.path()),
        );
        {
            let ops = connector.open("ops").unwrap();
            ops.execute_batch("CREATE TABLE src (id INTEGER); INSERT INTO src VALUES (1), (2);")
                .unwrap();
            let wh = connector.open("wh").unwrap();
            wh.execute_batch("CREATE TABLE dst (id INTEGER);").unwrap();
        }
        let script = dir.path().join("etl.sql");
        std::fs::write(&script, "INSERT INTO dst SELECT id FROM rdbms.src;").unwrap();

        let outcome = IncrementalEtl::new(&connector)
            .with_script(&script)
            .with_load_type("NIGHTLY")
            .execute();
        assert!(outcome.is_success());

        let history = ControlLogger::new(&connector).history(5).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].load_type, "NIGHTLY");
        assert_eq!(history[0].status, LoadStatus::Success);
        assert_eq!(history[0].records_processed, Some(2));
    }
}
