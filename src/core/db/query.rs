/// Query Execution Module
///
/// This module runs statements against a borrowed driver connection and
/// materializes the rows they return. It does not record anything; the
/// facade in `connection.rs` wraps these calls and keeps `last_query` /
/// `last_error` up to date.

use super::value::{Params, Value};
use crate::core::{DbalError, Result};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Rows, Statement};
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use tracing::debug;

/// A fetched record as an ordered list of named fields
///
/// A statement may yield several columns with the same name (`SELECT 1 AS a,
/// 2 AS a`). Positional access sees all of them; every lookup or conversion by
/// name (`get`, `into_raw`, serialization, `deserialize`) sees only the last.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

/// A fetched record as a plain string-keyed map
pub type RawRow = HashMap<String, Value>;

impl Row {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Row { fields }
    }

    /// Value of the named column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Value at the given column position
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts into the key-value representation
    pub fn into_raw(self) -> RawRow {
        self.fields.into_iter().collect()
    }

    /// Fields reachable by name, in column order
    fn named_fields(&self) -> impl Iterator<Item = &(String, Value)> {
        self.fields.iter().enumerate().filter_map(move |(i, field)| {
            let shadowed = self.fields[i + 1..].iter().any(|(later, _)| *later == field.0);
            (!shadowed).then_some(field)
        })
    }

    /// Maps the row onto any deserializable type, matching fields by column name.
    pub fn deserialize<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(self)?)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.named_fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Eagerly materialized rows of one statement
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet<R = Row> {
    /// Statement text exactly as it was passed in
    pub sql: String,
    /// Column names reported by the prepared statement
    pub columns: Vec<String>,
    /// All fetched rows, in driver order
    pub rows: Vec<R>,
}

impl<R> ResultSet<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&R> {
        self.rows.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}

impl<R> IntoIterator for ResultSet<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a ResultSet<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Outcome of a statement run through the write path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Statement text exactly as it was passed in
    pub sql: String,
    /// Rows inserted, updated or deleted
    pub affected_rows: usize,
    /// Driver rowid of the most recent successful insert on the connection
    pub last_insert_id: i64,
}

/// Runs a statement to completion without keeping any rows it returns
pub fn execute_on_connection(conn: &Connection, sql: &str, params: &Params) -> Result<Execution> {
    debug!(sql, params = params.len(), "execute");

    let mut stmt = prepare(conn, sql)?;
    let mut rows = bind_and_run(&mut stmt, params).map_err(|e| statement_error(sql, e))?;
    while rows.next().map_err(|e| statement_error(sql, e))?.is_some() {}
    drop(rows);

    // sqlite3_changes() keeps the count of the last write, so reads report zero
    let affected_rows = if StatementType::from_sql(sql).returns_rows() {
        0
    } else {
        conn.changes() as usize
    };

    Ok(Execution {
        sql: sql.to_string(),
        affected_rows,
        last_insert_id: conn.last_insert_rowid(),
    })
}

/// Runs a statement and collects every row it returns
pub fn query_on_connection(conn: &Connection, sql: &str, params: &Params) -> Result<ResultSet> {
    debug!(sql, params = params.len(), "query");

    let mut stmt = prepare(conn, sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = bind_and_run(&mut stmt, params).map_err(|e| statement_error(sql, e))?;

    let mut collected = Vec::new();
    while let Some(row) = rows.next().map_err(|e| statement_error(sql, e))? {
        let mut fields = Vec::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            let value = row.get_ref(i).map_err(|e| statement_error(sql, e))?;
            fields.push((name.clone(), Value::from(value)));
        }
        collected.push(Row::new(fields));
    }

    Ok(ResultSet {
        sql: sql.to_string(),
        columns,
        rows: collected,
    })
}

fn prepare<'c>(conn: &'c Connection, sql: &str) -> Result<Statement<'c>> {
    conn.prepare(sql).map_err(|e| statement_error(sql, e))
}

/// Binds the parameters and starts stepping the statement
fn bind_and_run<'s>(stmt: &'s mut Statement<'_>, params: &Params) -> rusqlite::Result<Rows<'s>> {
    match params {
        Params::None => stmt.query([]),
        Params::Positional(values) => stmt.query(rusqlite::params_from_iter(values.iter())),
        Params::Named(pairs) => stmt.query(named_refs(pairs).as_slice()),
    }
}

fn named_refs(pairs: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
    pairs
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

fn statement_error(sql: &str, source: rusqlite::Error) -> DbalError {
    DbalError::Statement {
        sql: sql.to_string(),
        source,
    }
}

/// Represents different SQL statement types for routing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Pragma,
    /// BEGIN/COMMIT/ROLLBACK transaction commands
    Transaction,
    Other,
}

impl StatementType {
    /// Determines the statement type from its leading keyword
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
            .next()
            .unwrap_or("")
            .to_uppercase();

        match keyword.as_str() {
            "SELECT" | "WITH" | "VALUES" | "EXPLAIN" => StatementType::Select,
            "INSERT" | "REPLACE" => StatementType::Insert,
            "UPDATE" => StatementType::Update,
            "DELETE" => StatementType::Delete,
            "CREATE" => StatementType::Create,
            "DROP" => StatementType::Drop,
            "ALTER" => StatementType::Alter,
            "PRAGMA" => StatementType::Pragma,
            "BEGIN" | "COMMIT" | "END" | "ROLLBACK" | "SAVEPOINT" | "RELEASE" => StatementType::Transaction,
            _ => StatementType::Other,
        }
    }

    /// Whether statements of this type belong on the read path.
    ///
    /// PRAGMA is treated as a read: most pragmas report a value.
    pub fn returns_rows(self) -> bool {
        matches!(self, StatementType::Select | StatementType::Pragma)
    }
}
