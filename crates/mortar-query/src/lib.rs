//! # mortar-query
//!
//! The SQL generation layer of the Mortar toolkit: a fluent, dialect-agnostic
//! query [`Builder`] over a small clause AST, compiled by per-dialect
//! [`Grammar`] implementations into parameterized SQL plus a bindings vector.
//!
//! This crate performs no I/O. Execution lives in `mortar-connection` and the
//! model layer in `mortar-orm`; both consume the `(sql, bindings)` pairs
//! produced here.
//!
//! ## Quick start
//!
//! ```
//! use mortar_query::{Builder, MysqlGrammar, PostgresGrammar};
//!
//! let mut query = Builder::table("users");
//! query.where_eq("active", 1).order_by("name", "asc").limit(10);
//!
//! let (sql, bindings) = query.clone().to_qmark(&MysqlGrammar).unwrap();
//! assert_eq!(
//! 	sql,
//! 	"SELECT * FROM `users` WHERE `users`.`active` = ? ORDER BY `name` ASC LIMIT 10"
//! );
//! assert_eq!(bindings.len(), 1);
//!
//! // The same builder state compiles for any dialect.
//! let (sql, _) = query.to_qmark(&PostgresGrammar).unwrap();
//! assert!(sql.starts_with("SELECT * FROM \"users\""));
//! ```
//!
//! ## Dialect differences
//!
//! | | quoting | placeholders | limit/offset | locks |
//! |---|---|---|---|---|
//! | MySQL / MariaDB | `` `id` `` | `?` | `LIMIT n OFFSET m` | `FOR UPDATE` |
//! | PostgreSQL | `"id"` | `$1…` | `LIMIT n OFFSET m` | `FOR UPDATE` |
//! | SQLite | `"id"` | `?` | `LIMIT n OFFSET m` | none |
//! | MSSQL | `[id]` | `?` | `OFFSET … FETCH` | `WITH (UPDLOCK, ROWLOCK)` |

pub mod builder;
pub mod clause;
pub mod error;
pub mod grammar;
pub mod schema;
pub mod types;
pub mod value;
pub mod writer;

pub use builder::Builder;
pub use clause::{
	AggregateClause, GroupClause, HavingClause, JoinClause, OnCondition, OrderClause, Raw,
	SelectColumn, UpdateExpr, WhereClause, WhereCondition,
};
pub use error::{QueryError, Result};
pub use grammar::{Grammar, MssqlGrammar, MysqlGrammar, PostgresGrammar, SqliteGrammar};
pub use schema::{
	ColumnDef, ColumnKind, ForeignAction, ForeignKeyDef, IndexDef, IndexKind, TableCommand,
	TableMode,
};
pub use types::{AggregateFunction, Boolean, JoinKind, LockMode, Operator, OrderDirection};
pub use value::{Value, Values};
pub use writer::SqlWriter;
