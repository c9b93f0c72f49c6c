//! Migration errors.

use mortar_connection::ConnectionError;
use mortar_query::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
	#[error(transparent)]
	Connection(#[from] ConnectionError),

	#[error(transparent)]
	Compile(#[from] QueryError),

	#[error("migration `{name}` failed: {reason}")]
	Failed { name: String, reason: String },

	#[error("no migration named `{0}` is registered")]
	UnknownMigration(String),
}

pub type Result<T> = std::result::Result<T, MigrationError>;
