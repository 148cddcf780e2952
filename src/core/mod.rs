/// Core Module for DBAL
///
/// The connection facade and the error type shared by all of its operations.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DbalError, ErrorInfo, Result};
