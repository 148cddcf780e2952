/// DBAL Error Module
///
/// This module defines the error type shared by every operation of the
/// connection facade, together with the snapshot that the facade keeps of
/// the most recent failure.
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error type for every fallible operation in the crate.
///
/// The variants follow the three failure families of the facade:
/// - connect-time failures (`Connect`)
/// - statement failures while preparing, binding, executing or fetching (`Statement`)
/// - logical misuse such as introspecting an unknown table (`UnknownTable`, `NotConnected`)
///
/// plus the ambient failures of configuration loading and output encoding.
#[derive(Error, Debug)]
pub enum DbalError {
    /// The driver refused to open the database
    #[error("Connection error: failed to open {dsn}: {source}")]
    Connect {
        dsn: String,
        #[source]
        source: rusqlite::Error,
    },

    /// An operation needed a driver handle but none is present
    #[error("Connection error: no open database handle")]
    NotConnected,

    /// SQL statement errors (syntax, execution, missing tables, bad parameters)
    #[error("Query error: {source} (query: {sql})")]
    Statement {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Introspection was requested for a table the catalog does not list
    #[error("Schema error: table `{0}` does not exist")]
    UnknownTable(String),

    /// A fetched row could not be mapped onto the requested type
    #[error("Decode error: {source} (query: {sql})")]
    Decode {
        sql: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbalError {
    /// Statement text attached to the error, if the failure came from one.
    pub fn sql(&self) -> Option<&str> {
        match self {
            DbalError::Statement { sql, .. } | DbalError::Decode { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Extended SQLite result code, if the driver reported one.
    pub fn driver_code(&self) -> Option<i32> {
        match self {
            DbalError::Connect { source, .. } | DbalError::Statement { source, .. } => {
                match source {
                    rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Type alias for Result to use DbalError as the error type.
pub type Result<T> = std::result::Result<T, DbalError>;

/// Snapshot of the most recent failure recorded by a facade.
///
/// `DbalError` owns driver errors that cannot be cloned, so the facade keeps
/// this rendered copy instead. It mirrors the driver's usual error triple:
/// a numeric code, a message and the statement that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Extended SQLite result code (None for errors raised by this crate)
    pub code: Option<i32>,
    /// Human readable message
    pub message: String,
    /// Statement text, when the failure belongs to a statement
    pub sql: Option<String>,
}

impl From<&DbalError> for ErrorInfo {
    fn from(err: &DbalError) -> Self {
        ErrorInfo {
            code: err.driver_code(),
            message: err.to_string(),
            sql: err.sql().map(str::to_string),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), Some("boom".to_string()))
    }

    #[test]
    fn test_error_display() {
        let stmt_err = DbalError::Statement {
            sql: "SELECT 1".to_string(),
            source: rusqlite::Error::ExecuteReturnedResults,
        };
        assert!(stmt_err.to_string().contains("Query error"));
        assert!(stmt_err.to_string().contains("SELECT 1"));

        let table_err = DbalError::UnknownTable("ghost".to_string());
        assert!(table_err.to_string().contains("`ghost`"));

        let config_err = DbalError::Config("missing [database]".to_string());
        assert!(config_err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DbalError = io_err.into();
        match err {
            DbalError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let err: DbalError = json_err.into();
        match err {
            DbalError::Json(_) => {}
            _ => panic!("Expected JSON error"),
        }
    }

    #[test]
    fn test_error_info_keeps_driver_code_and_sql() {
        let err = DbalError::Statement {
            sql: "INSERT INTO t VALUES (1)".to_string(),
            source: sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
        };
        let info = ErrorInfo::from(&err);

        assert_eq!(info.code, Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE));
        assert_eq!(info.sql.as_deref(), Some("INSERT INTO t VALUES (1)"));
        assert!(info.to_string().starts_with(&format!("[{}]", rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)));
    }

    #[test]
    fn test_error_info_without_driver_code() {
        let info = ErrorInfo::from(&DbalError::NotConnected);
        assert_eq!(info.code, None);
        assert_eq!(info.sql, None);
        assert_eq!(info.to_string(), "Connection error: no open database handle");
    }
}
