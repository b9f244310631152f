//! Error taxonomy for the query and aggregation core.
//!
//! Every failure is returned to the immediate caller; nothing here is
//! retried. The command layer wraps these into `anyhow` errors and prints
//! them verbatim.

use thiserror::Error;

/// Main error type for the fitstat core
#[derive(Error, Debug)]
pub enum StatsError {
    /// The builder was handed directives it cannot turn into valid text.
    #[error("query builder rejected: {0}")]
    BadOptions(String),

    /// The store refused or failed to run the statement. Only the query text
    /// is kept, bound values stay out of the message.
    #[error("select caused: {source} (query: {query})")]
    QueryFailed {
        query: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("row shape mismatch: {0}")]
    ScanMismatch(String),

    #[error("impossible day offset {offset} for {year}-{month:02}-{day:02}")]
    TimeAnomaly { year: i32, month: u32, day: u32, offset: i64 },

    #[error("scan cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Create a builder rejection from a message
    pub fn bad_options(msg: impl Into<String>) -> Self {
        Self::BadOptions(msg.into())
    }

    /// Create a scan mismatch from a message
    pub fn scan_mismatch(msg: impl Into<String>) -> Self {
        Self::ScanMismatch(msg.into())
    }

    pub fn query_failed(query: &str, source: rusqlite::Error) -> Self {
        Self::QueryFailed {
            query: query.to_string(),
            source,
        }
    }

    /// Classifies an error raised while reading a row.
    ///
    /// Decoding problems mean the row does not have the expected shape;
    /// anything else came from stepping the statement.
    pub fn from_row_error(query: &str, err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::InvalidColumnType(idx, name, ty) => {
                Self::ScanMismatch(format!("column {} ({}) has type {}", idx, name, ty))
            }
            rusqlite::Error::InvalidColumnIndex(idx) => Self::ScanMismatch(format!("no column at index {}", idx)),
            rusqlite::Error::InvalidColumnName(name) => Self::ScanMismatch(format!("no column named {}", name)),
            rusqlite::Error::FromSqlConversionFailure(idx, ty, cause) => {
                Self::ScanMismatch(format!("column {} ({}) failed to convert: {}", idx, ty, cause))
            }
            rusqlite::Error::IntegralValueOutOfRange(idx, value) => {
                Self::ScanMismatch(format!("column {} value {} out of range", idx, value))
            }
            other => Self::query_failed(query, other),
        }
    }
}
