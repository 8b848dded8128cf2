use std::path::PathBuf;

/// Errors raised while running SQL steps and logging their outcome
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    #[error("SQL file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot connect to database '{database}': {source}")]
    Connection {
        database: String,
        #[source]
        source: duckdb::Error,
    },

    /// `index` is 1-based within the step; `statement` is a short prefix
    #[error("statement {index} failed ({statement}...): {source}")]
    Statement {
        index: usize,
        statement: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("transaction error: {0}")]
    Transaction(#[source] duckdb::Error),

    /// Reading or writing the control table failed
    #[error("control log error: {0}")]
    Logging(String),
}

impl PipelineError {
    /// Configuration errors fail before any statement runs
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PipelineError::Config(_) | PipelineError::MissingFile(_) | PipelineError::Io { .. }
        )
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
