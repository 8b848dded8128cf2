//! Database settings read from the environment.
//!
//! A `.env` file in the working directory is loaded first (see
//! [`DbConfig::from_env`]); variables already set in the process win.

use crate::error::PipelineError;
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_RDBMS: &str = "DB_RDBMS";
pub const ENV_DB_STAR: &str = "DB_STAR";
pub const ENV_DB_DATA_DIR: &str = "DB_DATA_DIR";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_DATA_DIR: &str = "data";

/// File extension of database files under the data directory
pub const DATABASE_EXTENSION: &str = "duckdb";

/// Connection settings shared by every component
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub rdbms_database: Option<String>,
    pub star_database: Option<String>,
    pub data_dir: PathBuf,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("rdbms_database", &self.rdbms_database)
            .field("star_database", &self.star_database)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            user: None,
            password: None,
            rdbms_database: None,
            star_database: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl DbConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self, PipelineError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rdbms_database = var(ENV_DB_RDBMS);
        let star_database = var(ENV_DB_STAR);
        for name in rdbms_database.iter().chain(star_database.iter()) {
            validate_database_name(name)?;
        }

        Ok(Self {
            host: var(ENV_DB_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            user: var(ENV_DB_USER),
            password: var(ENV_DB_PASSWORD),
            rdbms_database,
            star_database,
            data_dir: var(ENV_DB_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        })
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn rdbms(&self) -> Result<&str, PipelineError> {
        self.rdbms_database
            .as_deref()
            .ok_or_else(|| PipelineError::Config(format!("{} is not set", ENV_DB_RDBMS)))
    }

    pub fn star(&self) -> Result<&str, PipelineError> {
        self.star_database
            .as_deref()
            .ok_or_else(|| PipelineError::Config(format!("{} is not set", ENV_DB_STAR)))
    }

    /// On-disk location of database `name`
    pub fn database_path(&self, name: &str) -> PathBuf {
        database_path(&self.data_dir, name)
    }

    /// `user@host` for diagnostics
    pub fn describe(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

pub fn database_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{}.{}", name, DATABASE_EXTENSION))
}

/// Names end up in file paths and ATTACH aliases, so keep them to `[A-Za-z0-9_]+`
pub fn validate_database_name(name: &str) -> Result<(), PipelineError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(PipelineError::Config(format!(
            "invalid database name '{}': use letters, digits and underscores",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DbConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.rdbms().is_err());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = DbConfig::from_lookup(lookup(&[
            ("DB_HOST", "db.internal"),
            ("DB_USER", "etl"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_RDBMS", "hospital_rdbms"),
            ("DB_STAR", "hospital_star"),
            ("DB_DATA_DIR", "/var/lib/etl"),
        ]))
        .unwrap();

        assert_eq!(config.rdbms().unwrap(), "hospital_rdbms");
        assert_eq!(config.star().unwrap(), "hospital_star");
        assert_eq!(config.describe(), "etl@db.internal");
        assert_eq!(
            config.database_path("hospital_star"),
            PathBuf::from("/var/lib/etl/hospital_star.duckdb")
        );
    }

    #[test]
    fn test_password_redacted() {
        let config =
            DbConfig::from_lookup(lookup(&[("DB_PASSWORD", "hunter2")])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_invalid_database_name() {
        let err = DbConfig::from_lookup(lookup(&[("DB_STAR", "star;drop")])).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = DbConfig::from_lookup(lookup(&[("DB_HOST", "  ")])).unwrap();
        assert_eq!(config.host, "localhost");
    }
}
