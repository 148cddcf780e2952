/// Database Module
///
/// The connection facade and everything it is built from.
///
/// ## Architecture
///
/// - **Values** (`value.rs`): scalar values and statement parameters
/// - **Query Execution** (`query.rs`): runs statements on a borrowed driver connection and materializes rows
/// - **Connection Management** (`connection.rs`): the `Dbal` facade, its options, and last query/error bookkeeping
/// - **Schema Introspection** (`schema.rs`): catalog statements for tables and columns
///
/// ## Error Handling
///
/// All operations return the crate `Result`; failures are also remembered by
/// the facade and readable through `Dbal::last_error`.
pub mod connection;
pub mod query;
pub mod schema;
pub mod value;

pub use connection::*;
pub use query::*;
pub use schema::*;
pub use value::*;
