//! Embedded DuckDB connections for pipeline steps.
//!
//! Database `<name>` lives at `<data_dir>/<name>.duckdb`. A step with no
//! database runs in a transient in-memory session. Extra databases are
//! attached read-only under an alias so scripts can query across catalogs
//! (`SELECT ... FROM rdbms.patients`).

use crate::config::{validate_database_name, DbConfig};
use crate::error::{PipelineError, PipelineResult};
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which database a step connects to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// No database: a transient in-memory session
    #[default]
    None,
    /// The operational database (`DB_RDBMS`)
    Rdbms,
    /// The warehouse database (`DB_STAR`)
    Star,
    /// Any other database under the data directory
    Named(String),
}

impl Target {
    /// Alias used when this target is attached to another session
    pub fn alias(&self) -> Option<&str> {
        match self {
            Target::None => None,
            Target::Rdbms => Some("rdbms"),
            Target::Star => Some("star"),
            Target::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::None => write!(f, "none"),
            Target::Rdbms => write!(f, "rdbms"),
            Target::Star => write!(f, "star"),
            Target::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Opens connections scoped to one step
pub trait Connector {
    /// Database name `target` resolves to, `None` for an in-memory session
    fn resolve(&self, target: &Target) -> PipelineResult<Option<String>>;

    /// Whether `target` already holds a database; in-memory targets never do
    fn exists(&self, target: &Target) -> PipelineResult<bool>;

    /// Open `target` with every entry of `attach` attached read-only
    fn connect(&self, target: &Target, attach: &[Target]) -> PipelineResult<Connection>;
}

impl<C: Connector + ?Sized> Connector for &C {
    fn resolve(&self, target: &Target) -> PipelineResult<Option<String>> {
        (**self).resolve(target)
    }

    fn exists(&self, target: &Target) -> PipelineResult<bool> {
        (**self).exists(target)
    }

    fn connect(&self, target: &Target, attach: &[Target]) -> PipelineResult<Connection> {
        (**self).connect(target, attach)
    }
}

/// File-backed DuckDB connector driven by [`DbConfig`]
#[derive(Debug, Clone)]
pub struct DuckDbConnector {
    config: DbConfig,
}

impl DuckDbConnector {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Open database `name`, creating the data directory and file as needed
    pub fn open(&self, name: &str) -> PipelineResult<Connection> {
        validate_database_name(name)?;
        std::fs::create_dir_all(&self.config.data_dir).map_err(|source| PipelineError::Io {
            path: self.config.data_dir.clone(),
            source,
        })?;

        let path = self.config.database_path(name);
        debug!(database = name, path = %path.display(), "opening database");
        Connection::open(&path).map_err(|source| PipelineError::Connection {
            database: name.to_string(),
            source,
        })
    }

    fn open_in_memory(&self) -> PipelineResult<Connection> {
        Connection::open_in_memory().map_err(|source| PipelineError::Connection {
            database: ":memory:".to_string(),
            source,
        })
    }

    fn attach(&self, conn: &Connection, target: &Target) -> PipelineResult<()> {
        let (Some(name), Some(alias)) = (self.resolve(target)?, target.alias()) else {
            return Err(PipelineError::Config(
                "cannot attach an in-memory target".to_string(),
            ));
        };

        let path = self.config.database_path(&name);
        if !path.exists() {
            return Err(PipelineError::Config(format!(
                "database '{}' to attach does not exist at {}",
                name,
                path.display()
            )));
        }

        let sql = format!(
            "ATTACH '{}' AS {} (READ_ONLY)",
            path.display().to_string().replace('\'', "''"),
            alias
        );
        debug!(database = %name, alias, "attaching database");
        conn.execute_batch(&sql)
            .map_err(|source| PipelineError::Connection {
                database: name,
                source,
            })
    }
}

impl Connector for DuckDbConnector {
    fn resolve(&self, target: &Target) -> PipelineResult<Option<String>> {
        let name = match target {
            Target::None => return Ok(None),
            Target::Rdbms => self.config.rdbms()?.to_string(),
            Target::Star => self.config.star()?.to_string(),
            Target::Named(name) => name.clone(),
        };
        validate_database_name(&name)?;
        Ok(Some(name))
    }

    fn exists(&self, target: &Target) -> PipelineResult<bool> {
        Ok(self
            .resolve(target)?
            .is_some_and(|name| self.config.database_path(&name).exists()))
    }

    fn connect(&self, target: &Target, attach: &[Target]) -> PipelineResult<Connection> {
        let conn = match self.resolve(target)? {
            Some(name) => self.open(&name)?,
            None => self.open_in_memory()?,
        };
        for extra in attach {
            self.attach(&conn, extra)?;
        }
        Ok(conn)
    }
}
