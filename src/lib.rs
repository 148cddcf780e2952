// Core infrastructure modules
pub mod core;

// Configuration file support
pub mod config;

#[cfg(test)]
pub(crate) mod test_utils;

pub use crate::core::db::{
    ColumnInfo, ConnectOptions, Dbal, Execution, Params, RawRow, ResultSet, Row, StatementType,
    TableCheck, Value,
};
pub use crate::core::{DbalError, ErrorInfo, Result};
