//! Incremental ETL, control logging, and the full generate-to-warehouse flow.

use duckdb::Connection;
use hospital_data_gen::{hospital_schema, Generator, GeneratorConfig, RenderConfig, Renderer};
use hospital_etl::control::INCREMENTAL;
use hospital_etl::runner::{default_steps, ScriptRunner, Step};
use hospital_etl::{
    ControlLogger, DbConfig, DuckDbConnector, IncrementalEtl, LoadStatus, PipelineError, Target,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn connector(dir: &Path) -> DuckDbConnector {
    let config = DbConfig {
        rdbms_database: Some("hospital".to_string()),
        star_database: Some("hospital_star".to_string()),
        ..DbConfig::default()
    }
    .with_data_dir(dir.join("data"));
    DuckDbConnector::new(config)
}

fn repo_file(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

/// Source table in the operational database and an empty target in the warehouse
fn seed_databases(c: &DuckDbConnector) {
    let ops = c.open("hospital").unwrap();
    ops.execute_batch("CREATE TABLE src (id INTEGER); INSERT INTO src VALUES (1), (2);")
        .unwrap();
    let star = c.open("hospital_star").unwrap();
    star.execute_batch("CREATE TABLE dst (id INTEGER);").unwrap();
}

#[test]
fn test_successful_etl_logs_rows() {
    let temp_dir = TempDir::new().unwrap();
    let c = connector(temp_dir.path());
    seed_databases(&c);

    let script = temp_dir.path().join("etl.sql");
    std::fs::write(
        &script,
        "INSERT INTO dst SELECT id FROM rdbms.src;\nINSERT INTO dst VALUES (99);",
    )
    .unwrap();

    let outcome = IncrementalEtl::new(c.clone()).with_script(&script).execute();
    assert!(outcome.is_success());
    assert_eq!(outcome.load.as_ref().unwrap().rows_affected, 3);

    let history = ControlLogger::new(c).history(10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].load_type, INCREMENTAL);
    assert_eq!(history[0].status, LoadStatus::Success);
    assert_eq!(history[0].records_processed, Some(3));
    assert_eq!(history[0].error_message, None);
}

#[test]
fn test_failed_etl_logs_single_failure_row() {
    let temp_dir = TempDir::new().unwrap();
    let c = connector(temp_dir.path());
    seed_databases(&c);

    let script = temp_dir.path().join("etl.sql");
    std::fs::write(
        &script,
        "INSERT INTO dst SELECT id FROM rdbms.src;\nINSERT INTO dst VALUES (99);\nINSERT INTO no_such_table VALUES (1);",
    )
    .unwrap();

    let outcome = IncrementalEtl::new(c.clone()).with_script(&script).execute();
    assert!(!outcome.is_success());
    assert!(outcome.logging.is_ok());
    assert!(matches!(
        outcome.load,
        Err(PipelineError::Statement { index: 3, .. })
    ));

    let history = ControlLogger::new(c.clone()).history(10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, LoadStatus::Failure);
    assert_eq!(history[0].records_processed, Some(0));
    let message = history[0].error_message.as_deref().unwrap();
    assert!(message.contains("statement 3"));

    // The load rolled back as a whole
    let star = c.open("hospital_star").unwrap();
    assert_eq!(count(&star, "SELECT COUNT(*) FROM dst"), 0);
}

#[test]
fn test_missing_script_is_logged() {
    let temp_dir = TempDir::new().unwrap();
    let c = connector(temp_dir.path());

    let outcome = IncrementalEtl::new(c.clone())
        .with_script(temp_dir.path().join("missing.sql"))
        .execute();
    assert!(matches!(outcome.load, Err(PipelineError::MissingFile(_))));
    assert!(outcome.logging.is_ok());

    let history = ControlLogger::new(c).history(10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, LoadStatus::Failure);
    assert!(history[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("missing.sql"));
}

#[test]
fn test_logging_failure_is_reported_separately() {
    let temp_dir = TempDir::new().unwrap();
    // No star database configured: the load and the control row both fail
    let c = DuckDbConnector::new(DbConfig::default().with_data_dir(temp_dir.path()));
    let script = temp_dir.path().join("etl.sql");
    std::fs::write(&script, "SELECT 1;").unwrap();

    let outcome = IncrementalEtl::new(c).with_script(&script).execute();
    assert!(matches!(outcome.load, Err(PipelineError::Config(_))));
    assert!(matches!(outcome.logging, Err(PipelineError::Logging(_))));
}

#[test]
fn test_history_newest_first_and_limited() {
    let temp_dir = TempDir::new().unwrap();
    let c = connector(temp_dir.path());
    seed_databases(&c);

    let good = temp_dir.path().join("good.sql");
    std::fs::write(&good, "INSERT INTO dst VALUES (1);").unwrap();
    let bad = temp_dir.path().join("bad.sql");
    std::fs::write(&bad, "INSERT INTO nowhere VALUES (1);").unwrap();

    IncrementalEtl::new(c.clone()).with_script(&good).execute();
    IncrementalEtl::new(c.clone())
        .with_script(&bad)
        .with_load_type("BACKFILL")
        .execute();

    let history = ControlLogger::new(c.clone()).history(1).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].load_type, "BACKFILL");
    assert_eq!(history[0].status, LoadStatus::Failure);

    assert_eq!(ControlLogger::new(c).history(10).unwrap().len(), 2);
}

#[test]
fn test_full_pipeline_then_incremental_rerun() {
    let temp_dir = TempDir::new().unwrap();
    let c = connector(temp_dir.path());
    let output_dir = temp_dir.path().join("output");
    std::fs::create_dir_all(&output_dir).unwrap();

    let config = GeneratorConfig {
        patients: 150,
        providers: 20,
        ..GeneratorConfig::default()
    }
    .with_seed(2024)
    .with_encounters(300);
    let bundle = Generator::new(config).unwrap().generate();

    let mut load = std::fs::File::create(output_dir.join("load_data.sql")).unwrap();
    Renderer::new(RenderConfig::new().with_batch_size(100))
        .render(&bundle, &mut load)
        .unwrap();
    drop(load);
    std::fs::write(
        output_dir.join("rdbms_schema.sql"),
        hospital_schema().render_ddl(),
    )
    .unwrap();

    let mut steps = default_steps(&output_dir);
    for step in steps.iter_mut().skip(2) {
        step.path = repo_file(&step.path.to_string_lossy());
    }

    let summary = ScriptRunner::new(c.clone()).run(&steps).unwrap();
    assert_eq!(summary.steps.len(), 4);
    assert_eq!(summary.steps[1].rows_affected, bundle.total_rows());
    let first_load = summary.steps[3].rows_affected;
    assert!(first_load > 0);

    {
        let ops = c.open("hospital").unwrap();
        assert_eq!(
            count(&ops, "SELECT COUNT(*) FROM encounters") as usize,
            bundle.encounters.len()
        );
        assert_eq!(
            count(&ops, "SELECT COUNT(DISTINCT mrn) FROM patients") as usize,
            bundle.patients.len()
        );

        let star = c.open("hospital_star").unwrap();
        assert_eq!(
            count(&star, "SELECT COUNT(*) FROM fact_encounter") as usize,
            bundle.encounters.len()
        );
        assert_eq!(
            count(&star, "SELECT COUNT(*) FROM fact_billing") as usize,
            bundle.billing.len()
        );
        assert_eq!(
            count(&star, "SELECT COUNT(*) FROM fact_encounter_diagnosis") as usize,
            bundle.encounter_diagnoses.len()
        );
        assert_eq!(
            count(&star, "SELECT COUNT(*) FROM dim_patient") as usize,
            bundle.patients.len()
        );
    }

    // Everything is already loaded, so the rerun picks up nothing
    let outcome = IncrementalEtl::new(c.clone())
        .with_script(repo_file("sql/incremental_etl.sql"))
        .execute();
    assert!(outcome.is_success());
    assert_eq!(outcome.load.unwrap().rows_affected, 0);

    let history = ControlLogger::new(c).history(10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, LoadStatus::Success);
    assert_eq!(history[0].records_processed, Some(0));
    assert_eq!(history[1].status, LoadStatus::Success);
    assert_eq!(history[1].records_processed, Some(first_load as i64));
}

fn etl_step(script: PathBuf) -> Step {
    Step::new("ETL", script, Target::Star)
        .attach(Target::Rdbms)
        .with_load_type(INCREMENTAL)
}

#[test]
fn test_pipeline_etl_step_logs_success() {
    let temp_dir = TempDir::new().unwrap();
    let c = connector(temp_dir.path());
    seed_databases(&c);

    let script = temp_dir.path().join("etl.sql");
    std::fs::write(&script, "INSERT INTO dst SELECT id FROM rdbms.src;").unwrap();
    let plain = temp_dir.path().join("plain.sql");
    std::fs::write(&plain, "INSERT INTO dst VALUES (7);").unwrap();

    let summary = ScriptRunner::new(c.clone())
        .run(&[
            Step::new("Plain", plain, Target::Star),
            etl_step(script),
        ])
        .unwrap();
    assert_eq!(summary.steps[0].load_type, None);
    assert_eq!(summary.steps[1].load_type.as_deref(), Some(INCREMENTAL));

    // Only the ETL step writes a control row
    let history = ControlLogger::new(c).history(10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].load_type, INCREMENTAL);
    assert_eq!(history[0].status, LoadStatus::Success);
    assert_eq!(history[0].records_processed, Some(2));
}

#[test]
fn test_pipeline_etl_step_logs_failure() {
    let temp_dir = TempDir::new().unwrap();
    let c = connector(temp_dir.path());
    seed_databases(&c);

    let script = temp_dir.path().join("etl.sql");
    std::fs::write(
        &script,
        "INSERT INTO dst SELECT id FROM rdbms.src;
INSERT INTO dst VALUES (99);
INSERT INTO no_such_table VALUES (1);",
    )
    .unwrap();

    let failure = ScriptRunner::new(c.clone())
        .run(&[etl_step(script)])
        .unwrap_err();
    assert!(matches!(
        failure.error,
        PipelineError::Statement { index: 3, .. }
    ));
    assert!(failure.logging.is_none());

    let history = ControlLogger::new(c.clone()).history(10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, LoadStatus::Failure);
    assert_eq!(history[0].records_processed, Some(0));
    assert!(history[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("statement 3"));

    let star = c.open("hospital_star").unwrap();
    assert_eq!(count(&star, "SELECT COUNT(*) FROM dst"), 0);
}

#[test]
fn test_pipeline_etl_step_missing_script_logs_failure() {
    let temp_dir = TempDir::new().unwrap();
    let c = connector(temp_dir.path());
    seed_databases(&c);

    let failure = ScriptRunner::new(c.clone())
        .run(&[etl_step(temp_dir.path().join("missing.sql"))])
        .unwrap_err();
    assert!(matches!(failure.error, PipelineError::MissingFile(_)));

    let history = ControlLogger::new(c).history(10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, LoadStatus::Failure);
    assert_eq!(history[0].records_processed, Some(0));
}

#[test]
fn test_pipeline_etl_step_unlogged_failure_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    // No star database configured: neither the load nor its control row can run
    let c = DuckDbConnector::new(DbConfig::default().with_data_dir(temp_dir.path()));
    let script = temp_dir.path().join("etl.sql");
    std::fs::write(&script, "SELECT 1;").unwrap();

    let failure = ScriptRunner::new(c)
        .run(&[Step::new("ETL", script, Target::Star).with_load_type(INCREMENTAL)])
        .unwrap_err();
    assert!(matches!(failure.error, PipelineError::Config(_)));
    assert!(matches!(failure.logging, Some(PipelineError::Logging(_))));
}
