//! The driver seam.
//!
//! The core never opens sockets. A [`Connection`] is whatever a driver crate
//! hands back from its registered [`ConnectionFactory`]; the resolver opens
//! one lazily per connection name and serializes statements through it.

use std::sync::Arc;

use mortar_query::Values;

use crate::config::ConnectionConfig;
use crate::error::DriverError;
use crate::row::{ExecuteResult, Row};

/// A live, synchronous database handle.
pub trait Connection: Send {
	/// Run a write statement, returning the affected count and, when the
	/// driver knows it, the last inserted id.
	fn execute(&mut self, sql: &str, bindings: &Values) -> Result<ExecuteResult, DriverError>;

	/// Run a read statement.
	fn fetch_all(&mut self, sql: &str, bindings: &Values) -> Result<Vec<Row>, DriverError>;
}

/// Opens a [`Connection`] from a config. Registered per driver.
pub type ConnectionFactory =
	Arc<dyn Fn(&ConnectionConfig) -> Result<Box<dyn Connection>, DriverError> + Send + Sync>;
