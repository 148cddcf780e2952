/// Connection Management Module
///
/// This module provides the connection facade: one exclusively owned driver
/// handle plus the bookkeeping of the last statement and the last failure.
/// Schema introspection lives in `schema.rs` as a second `impl Dbal` block.

use super::query::{self, Execution, RawRow, ResultSet, Row};
use super::value::Params;
use crate::core::{DbalError, ErrorInfo, Result};
use rusqlite::{Connection, OpenFlags};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{info, warn};

/// Host recorded when none is given
pub const DEFAULT_HOST: &str = "localhost";

/// Driver prefix of the connection string
const DSN_DRIVER: &str = "sqlite";

/// Credentials and open options for a connection
#[derive(Clone, PartialEq)]
pub struct ConnectOptions {
    pub user: String,
    pub password: String,
    /// Database file path, SQLite URI, or ":memory:"
    pub database: String,
    pub host: String,
    /// Create the database file when it does not exist
    pub create_if_missing: bool,
    /// Open the database read-only
    pub read_only: bool,
    /// Run `PRAGMA foreign_keys = ON` after opening
    pub foreign_keys: bool,
}

impl ConnectOptions {
    pub fn new(user: impl Into<String>, password: impl Into<String>, database: impl Into<String>) -> Self {
        ConnectOptions {
            user: user.into(),
            password: password.into(),
            database: database.into(),
            host: DEFAULT_HOST.to_string(),
            create_if_missing: true,
            read_only: false,
            foreign_keys: true,
        }
    }

    /// Options for a private in-memory database
    pub fn in_memory() -> Self {
        ConnectOptions::new("", "", ":memory:")
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Connection string in `<driver>:host=<host>;dbname=<database>` form
    pub fn dsn(&self) -> String {
        format!("{}:host={};dbname={}", DSN_DRIVER, self.host, self.database)
    }

    fn open_flags(&self) -> OpenFlags {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        flags
    }

    /// Opens a driver connection with these options
    fn open(&self) -> Result<Connection> {
        let connect_error = |source: rusqlite::Error| DbalError::Connect {
            dsn: self.dsn(),
            source,
        };

        let conn = Connection::open_with_flags(&self.database, self.open_flags()).map_err(connect_error)?;
        if self.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(connect_error)?;
        }
        Ok(conn)
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions::in_memory()
    }
}

// The password never reaches logs or panic messages.
impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("create_if_missing", &self.create_if_missing)
            .field("read_only", &self.read_only)
            .field("foreign_keys", &self.foreign_keys)
            .finish()
    }
}

/// Connection facade over a single SQLite handle
///
/// Every operation returns a `Result`; nothing panics past this type. In
/// addition the facade remembers the text of the most recent statement and a
/// snapshot of the most recent failure, for debugging.
#[derive(Debug)]
pub struct Dbal {
    /// Absent when the facade wraps a handle opened elsewhere
    options: Option<ConnectOptions>,
    handle: Option<Connection>,
    last_query: Option<String>,
    last_error: Option<ErrorInfo>,
}

impl Dbal {
    /// Tries to connect and always returns a facade.
    ///
    /// On failure the handle stays absent, `is_connected()` is false and
    /// the error is available through `last_error()`.
    pub fn new(options: ConnectOptions) -> Self {
        match options.open() {
            Ok(conn) => {
                info!(dsn = %options.dsn(), user = %options.user, "connected");
                Dbal::with_parts(Some(options), Some(conn))
            }
            Err(err) => {
                let mut dbal = Dbal::with_parts(Some(options), None);
                dbal.record_error(&err);
                dbal
            }
        }
    }

    /// Connects, returning the error instead of an unusable facade
    pub fn connect(options: ConnectOptions) -> Result<Self> {
        let conn = options.open()?;
        info!(dsn = %options.dsn(), user = %options.user, "connected");
        Ok(Dbal::with_parts(Some(options), Some(conn)))
    }

    /// Wraps an already open driver connection. The facade did not open it,
    /// so it carries no connect options.
    pub fn from_handle(conn: Connection) -> Self {
        Dbal::with_parts(None, Some(conn))
    }

    fn with_parts(options: Option<ConnectOptions>, handle: Option<Connection>) -> Self {
        Dbal {
            options,
            handle,
            last_query: None,
            last_error: None,
        }
    }

    /// Options the facade connected with; `None` for `from_handle`
    pub fn options(&self) -> Option<&ConnectOptions> {
        self.options.as_ref()
    }

    /// Replaces the driver handle, dropping (and closing) the previous one
    pub fn set_handle(&mut self, conn: Connection) {
        self.handle = Some(conn);
    }

    /// The raw driver handle, if connected
    pub fn handle(&self) -> Option<&Connection> {
        self.handle.as_ref()
    }

    /// Removes the driver handle, leaving the facade disconnected
    pub fn take_handle(&mut self) -> Option<Connection> {
        self.handle.take()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Runs a write statement. Rows it returns (`RETURNING`, pragmas) are
    /// stepped through and discarded.
    pub fn execute(&mut self, sql: &str, params: impl Into<Params>) -> Result<Execution> {
        let params = params.into();
        self.last_query = Some(sql.to_string());
        let result = self
            .connection()
            .and_then(|conn| query::execute_on_connection(conn, sql, &params));
        self.record(result)
    }

    /// Runs a read statement, returning rows as ordered named fields
    pub fn query(&mut self, sql: &str, params: impl Into<Params>) -> Result<ResultSet<Row>> {
        let params = params.into();
        self.last_query = Some(sql.to_string());
        let result = self
            .connection()
            .and_then(|conn| query::query_on_connection(conn, sql, &params));
        self.record(result)
    }

    /// Runs a read statement, returning rows as string-keyed maps
    pub fn query_raw(&mut self, sql: &str, params: impl Into<Params>) -> Result<ResultSet<RawRow>> {
        let set = self.query(sql, params)?;
        Ok(ResultSet {
            sql: set.sql,
            columns: set.columns,
            rows: set.rows.into_iter().map(Row::into_raw).collect(),
        })
    }

    /// First row of the result, or `None` when the statement returned nothing
    pub fn query_single(&mut self, sql: &str, params: impl Into<Params>) -> Result<Option<Row>> {
        let set = self.query(sql, params)?;
        Ok(set.rows.into_iter().next())
    }

    /// Runs a read statement and maps every row onto `T` by column name
    pub fn query_as<T: DeserializeOwned>(&mut self, sql: &str, params: impl Into<Params>) -> Result<Vec<T>> {
        let set = self.query(sql, params)?;
        let decoded = set
            .rows
            .iter()
            .map(|row| row.deserialize::<T>())
            .collect::<std::result::Result<Vec<T>, _>>()
            .map_err(|source| DbalError::Decode { sql: set.sql.clone(), source });
        self.record(decoded)
    }

    /// Rowid of the most recent successful insert on this connection
    pub fn last_insert_id(&mut self) -> Result<i64> {
        let result = self.connection().map(Connection::last_insert_rowid);
        self.record(result)
    }

    /// Text of the most recently executed statement
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Snapshot of the most recent failure
    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    fn connection(&self) -> Result<&Connection> {
        self.handle.as_ref().ok_or(DbalError::NotConnected)
    }

    /// Remembers a failed result; successful results leave `last_error` as is.
    pub(crate) fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.record_error(err);
        }
        result
    }

    fn record_error(&mut self, err: &DbalError) {
        warn!(error = %err, "dbal operation failed");
        self.last_error = Some(ErrorInfo::from(err));
    }
}
