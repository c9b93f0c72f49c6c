//! Connection and statement errors.

use mortar_query::{QueryError, Values};
use thiserror::Error;

/// Anything a driver can fail with.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConnectionError {
	#[error("no connection named `{0}` is registered")]
	UnknownConnection(String),

	#[error("invalid connection configuration: {0}")]
	Configuration(String),

	#[error("no driver factory registered for `{0}`")]
	UnsupportedDriver(String),

	#[error("invalid database url `{url}`: {reason}")]
	InvalidUrl { url: String, reason: String },

	#[error(transparent)]
	Compile(#[from] QueryError),

	/// A driver failure while executing a statement. Carries the compiled
	/// SQL and its bindings so the failing query is reconstructible.
	#[error("query failed: {source} (sql: `{sql}`)")]
	Query {
		sql: String,
		bindings: Values,
		#[source]
		source: DriverError,
	},
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
