//! # crudmap
//!
//! Parameterized CRUD statements and ordered row mapping over a pluggable SQL driver.
//!
//! ## Features
//!
//! - **Placeholders only**: values are always bound, never spliced into SQL text
//! - **Validated identifiers**: table and column names are checked before use
//! - **Ordered rows**: columns keep result order, duplicate names included
//! - **Audit stamps**: INSERT sets `createtime` and `modifiedtime`, UPDATE sets `modifiedtime`
//! - **Safe defaults**: empty condition sets are errors; deleting every row is its own call
//! - **One connection per call**: acquired, used for one statement, and always released
//!
//! ## Example
//!
//! ```ignore
//! use crudmap::{ColumnMap, Database, PgConnector, stmt};
//!
//! let db = Database::new(PgConnector::from_url("postgres://app@localhost/shop")?);
//!
//! // INSERT
//! db.insert("users", ColumnMap::new().with("id", 1).with("name", "alice")).await?;
//!
//! // SELECT
//! let rows = db
//!     .fetch(&stmt::select("users", ["id", "name"]).eq("id", 1))
//!     .await?;
//! assert_eq!(rows.first().and_then(|r| r.get("name")).and_then(|v| v.as_str()), Some("alice"));
//!
//! // UPDATE
//! db.execute(&stmt::update("users", ColumnMap::new().with("name", "bob")).eq("id", 1)).await?;
//!
//! // DELETE
//! db.delete("users", ColumnMap::new().with("id", 1)).await?;
//! ```

pub mod clock;
pub mod columns;
pub mod config;
pub mod driver;
pub mod error;
pub mod ident;
pub mod mapper;
pub mod postgres;
pub mod row;
pub mod session;
pub mod stmt;
pub mod value;

pub use clock::{Clock, ManualClock, SystemClock, TIMESTAMP_FORMAT, format_timestamp};
pub use columns::{ColumnMap, ColumnValues, Conditions};
pub use config::{DatabaseConfig, ExecOptions};
pub use driver::{Connection, Connector, RawRow, ResultStream};
pub use error::{CrudError, CrudResult, DriverError};
pub use ident::Ident;
pub use mapper::RowStream;
pub use postgres::{ConnectOptions, PgConnection, PgConnector, PgRow};
pub use row::{ResultSet, Row};
pub use session::{Database, Outcome};
pub use stmt::{BuildContext, BuildStatement, Dialect, Statement, StatementKind};
pub use value::Value;
