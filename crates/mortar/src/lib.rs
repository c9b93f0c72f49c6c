//! # mortar
//!
//! A relational-database access toolkit: a dialect-aware SQL query builder,
//! an active-record model layer with relationships and eager loading, a
//! named-connection resolver with nested transactions, and a migration
//! system with a batch ledger.
//!
//! This crate re-exports the four subsystem crates:
//!
//! - [`mortar_query`]: clause AST, fluent [`Builder`](query::Builder) and the
//!   MySQL / PostgreSQL / SQLite / MSSQL grammars
//! - [`mortar_connection`]: [`ConnectionResolver`](connection::ConnectionResolver),
//!   configuration and the driver seam
//! - [`mortar_orm`]: the [`Model`](orm::Model) trait, collections, scopes,
//!   relationships and lifecycle events
//! - [`mortar_migrations`]: blueprints, the schema facade and the
//!   [`Migrator`](migrations::Migrator)
//!
//! ```no_run
//! use mortar::prelude::*;
//!
//! model!(User, {
//! 	ModelMeta::builder("User")
//! 		.fillable(["name", "email"])
//! 		.soft_deletes()
//! 		.build()
//! });
//!
//! # fn main() -> mortar::orm::Result<()> {
//! set_connection_details(ConnectionDetails::single(
//! 	"default",
//! 	ConnectionConfig::from_url("sqlite://app.db").unwrap(),
//! ));
//!
//! let user = User::create([("name", "Joe".into()), ("email", "joe@ex.io".into())])?;
//! let active = User::query().where_null("deleted_at").get()?;
//! # let _ = (user, active);
//! # Ok(())
//! # }
//! ```

pub use mortar_connection as connection;
pub use mortar_migrations as migrations;
pub use mortar_orm as orm;
pub use mortar_query as query;

/// The commonly imported surface.
pub mod prelude {
	pub use mortar_connection::{
		db_url, resolver, set_connection_details, Connection, ConnectionConfig,
		ConnectionDetails, ConnectionResolver, DatabaseDriver, QueryResult, Row,
	};
	pub use mortar_migrations::{Blueprint, Migration, MigrationStatus, Migrator, Schema};
	pub use mortar_orm::{
		model, CastType, Collection, EventResult, GlobalScope, Model, ModelData, ModelMeta,
		ModelQuery, Observer, OrmError, Paginator, PivotConfig, RelationKind, SimplePaginator,
		ThroughConfig, UuidConfig,
	};
	pub use mortar_query::{
		Builder, Grammar, JoinKind, MssqlGrammar, MysqlGrammar, PostgresGrammar, SqliteGrammar,
		Value, Values,
	};
}
