/// Schema Introspection Module
///
/// Lists tables and describes columns by issuing SQLite catalog statements
/// through the facade, so they show up in `last_query` like any other
/// statement. Nothing is cached; every call asks the catalog again.

use super::connection::Dbal;
use super::query::Row;
use super::value::Value;
use crate::core::{DbalError, Result};
use serde::Serialize;

/// Catalog statement listing user tables and views, in catalog order.
/// Only the exact, case-sensitive `sqlite_` prefix marks internal tables.
pub const LIST_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND substr(name, 1, 7) <> 'sqlite_'";

/// Whether a table name is checked against the catalog before it is
/// interpolated into a describe statement.
///
/// Identifiers cannot be bound as parameters, so the check is what keeps a
/// caller-supplied name from injecting SQL. `Trusted` is the explicit opt-out
/// for names the caller has already verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableCheck {
    #[default]
    Verify,
    Trusted,
}

/// Represents a table column with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Zero-based position in the table
    pub position: i64,
    /// Column name
    pub name: String,
    /// Declared type (e.g., "INTEGER", "TEXT"); empty when none was declared
    pub type_name: String,
    /// Whether the column is declared NOT NULL
    pub notnull: bool,
    /// Default value expression (if any)
    pub dflt_value: Option<String>,
    /// Whether this column is part of the primary key
    pub pk: bool,
}

impl ColumnInfo {
    /// Creates a ColumnInfo from a `PRAGMA table_info` result row
    fn from_pragma_row(row: &Row) -> Option<Self> {
        let text = |i: usize| -> Option<String> {
            match row.get_index(i)? {
                Value::Null => None,
                value => Some(value.to_string()),
            }
        };

        Some(ColumnInfo {
            position: row.get_index(0)?.as_i64()?,
            name: text(1)?,
            type_name: text(2).unwrap_or_default(),
            notnull: row.get_index(3)?.as_i64()? != 0,
            dflt_value: text(4),
            pk: row.get_index(5)?.as_i64()? != 0,
        })
    }
}

/// Describe statement for one table; the name goes in as a quoted identifier
fn describe_table_sql(table: &str) -> String {
    format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""))
}

impl Dbal {
    /// Names of all user tables and views, in the order the catalog reports them
    pub fn get_tables(&mut self) -> Result<Vec<String>> {
        let set = self.query(LIST_TABLES_SQL, ())?;
        Ok(set
            .rows
            .iter()
            .filter_map(|row| row.get_index(0))
            .map(Value::to_string)
            .collect())
    }

    /// Column names of `table`
    pub fn get_columns(&mut self, table: &str, check: TableCheck) -> Result<Vec<String>> {
        let columns = self.get_column_details(table, check)?;
        Ok(columns.into_iter().map(|c| c.name).collect())
    }

    /// Full column metadata of `table`
    ///
    /// With `TableCheck::Verify` the table must be listed by `get_tables()`;
    /// otherwise `DbalError::UnknownTable` is returned and the describe
    /// statement is never issued. SQLite describes a missing table as zero
    /// columns, which is reported as `UnknownTable` too.
    pub fn get_column_details(&mut self, table: &str, check: TableCheck) -> Result<Vec<ColumnInfo>> {
        if check == TableCheck::Verify {
            let tables = self.get_tables()?;
            if !tables.iter().any(|t| t == table) {
                return self.record(Err(DbalError::UnknownTable(table.to_string())));
            }
        }

        let set = self.query(&describe_table_sql(table), ())?;
        if set.is_empty() {
            return self.record(Err(DbalError::UnknownTable(table.to_string())));
        }
        Ok(set.rows.iter().filter_map(ColumnInfo::from_pragma_row).collect())
    }

    /// Whether the catalog lists `table`. False when the catalog cannot be read.
    pub fn table_exists(&mut self, table: &str) -> bool {
        self.get_tables()
            .map(|tables| tables.iter().any(|t| t == table))
            .unwrap_or(false)
    }

    /// Whether `column` exists in `table`. False for unknown tables.
    pub fn column_exists(&mut self, column: &str, table: &str) -> bool {
        self.get_columns(table, TableCheck::Verify)
            .map(|columns| columns.iter().any(|c| c == column))
            .unwrap_or(false)
    }
}
