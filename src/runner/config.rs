//! YAML pipeline description.
//!
//! ```yaml
//! steps:
//!   - description: Load data
//!     path: output/load_data.sql
//!     database: rdbms
//!   - description: ETL
//!     path: sql/incremental_etl.sql
//!     database: star
//!     attach: [rdbms]
//!     load_type: INCREMENTAL
//! ```
//!
//! A step with a `load_type` is an ETL load: its outcome is appended to
//! `etl_control` whether it commits or fails.

use super::Step;
use crate::control::INCREMENTAL;
use crate::db::Target;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the generated scripts
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const RDBMS_SCHEMA_FILE: &str = "rdbms_schema.sql";
pub const LOAD_DATA_FILE: &str = "load_data.sql";
pub const STAR_SCHEMA_SCRIPT: &str = "sql/star_schema.sql";
pub const INCREMENTAL_ETL_SCRIPT: &str = "sql/incremental_etl.sql";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub description: String,
    pub path: PathBuf,
    #[serde(default)]
    pub database: Target,
    #[serde(default)]
    pub attach: Vec<Target>,
    #[serde(default)]
    pub load_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub steps: Vec<StepConfig>,
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig = serde_yaml_ng::from_str(content)
            .map_err(|e| PipelineError::Config(format!("invalid pipeline file: {}", e)))?;
        if config.steps.is_empty() {
            return Err(PipelineError::Config(
                "pipeline file defines no steps".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
            .into_iter()
            .map(|s| Step {
                description: s.description,
                path: s.path,
                target: s.database,
                attach: s.attach,
                load_type: s.load_type,
            })
            .collect()
    }
}

/// RDBMS schema, load data, star schema, then the incremental ETL
pub fn default_steps(output_dir: &Path) -> Vec<Step> {
    vec![
        Step::new(
            "RDBMS schema",
            output_dir.join(RDBMS_SCHEMA_FILE),
            Target::Rdbms,
        ),
        Step::new("Load data", output_dir.join(LOAD_DATA_FILE), Target::Rdbms),
        Step::new("Star schema", STAR_SCHEMA_SCRIPT, Target::Star),
        Step::new("ETL", INCREMENTAL_ETL_SCRIPT, Target::Star)
            .attach(Target::Rdbms)
            .with_load_type(INCREMENTAL),
    ]
}
