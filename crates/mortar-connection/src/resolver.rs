//! The connection resolver.
//!
//! Holds the named-connection registry, opens driver handles lazily, logs and
//! dispatches raw statements, and keeps one transaction stack per connection
//! name. A process-wide instance is available through [`resolver()`];
//! everything is also constructible standalone for injection in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use mortar_query::{Grammar, Values};
use tracing::debug;

use crate::config::{ConnectionConfig, ConnectionDetails, DatabaseDriver};
use crate::connection::{Connection, ConnectionFactory};
use crate::error::{ConnectionError, Result};
use crate::row::{ExecuteResult, QueryResult, Row};

/// Target used for statement logging when `log_queries` is enabled.
pub const QUERY_LOG_TARGET: &str = "mortar::connection::queries";

type SharedConnection = Arc<Mutex<Box<dyn Connection>>>;

#[derive(Default)]
pub struct ConnectionResolver {
	configs: RwLock<HashMap<String, ConnectionConfig>>,
	default_name: RwLock<Option<String>>,
	factories: RwLock<HashMap<DatabaseDriver, ConnectionFactory>>,
	connections: Mutex<HashMap<String, SharedConnection>>,
	/// Transaction depth per connection name; 0 or absent means autocommit.
	transactions: Mutex<HashMap<String, usize>>,
}

impl ConnectionResolver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the whole registry. Open handles and transaction state are
	/// discarded along with the configs they belonged to.
	pub fn set_connection_details(&self, details: ConnectionDetails) {
		*self.configs.write().expect("connection registry poisoned") = details.connections;
		*self.default_name.write().expect("connection registry poisoned") =
			Some(details.default);
		self.connections
			.lock()
			.expect("connection pool poisoned")
			.clear();
		self.transactions
			.lock()
			.expect("transaction registry poisoned")
			.clear();
	}

	/// Register the factory that opens handles for `driver`.
	pub fn register_driver(&self, driver: DatabaseDriver, factory: ConnectionFactory) {
		self.factories
			.write()
			.expect("driver registry poisoned")
			.insert(driver, factory);
	}

	fn resolve_name(&self, name: Option<&str>) -> Result<String> {
		if let Some(name) = name {
			return Ok(name.to_string());
		}
		self.default_name
			.read()
			.expect("connection registry poisoned")
			.clone()
			.ok_or_else(|| {
				ConnectionError::Configuration("no default connection configured".to_string())
			})
	}

	pub fn config(&self, name: Option<&str>) -> Result<ConnectionConfig> {
		let name = self.resolve_name(name)?;
		self.configs
			.read()
			.expect("connection registry poisoned")
			.get(&name)
			.cloned()
			.ok_or(ConnectionError::UnknownConnection(name))
	}

	/// The grammar for a named connection's dialect.
	pub fn grammar(&self, name: Option<&str>) -> Result<&'static dyn Grammar> {
		Ok(self.config(name)?.driver.grammar())
	}

	/// Get (or lazily open) the pooled handle for a connection name.
	pub fn get_connection(&self, name: Option<&str>) -> Result<SharedConnection> {
		let name = self.resolve_name(name)?;
		if let Some(existing) = self
			.connections
			.lock()
			.expect("connection pool poisoned")
			.get(&name)
		{
			return Ok(existing.clone());
		}

		let config = self.config(Some(&name))?;
		let factory = self
			.factories
			.read()
			.expect("driver registry poisoned")
			.get(&config.driver)
			.cloned()
			.ok_or_else(|| {
				ConnectionError::UnsupportedDriver(config.driver.as_str().to_string())
			})?;
		let connection: SharedConnection = Arc::new(Mutex::new(factory(&config).map_err(
			|source| ConnectionError::Query {
				sql: String::new(),
				bindings: Values::new(),
				source,
			},
		)?));
		self.connections
			.lock()
			.expect("connection pool poisoned")
			.insert(name, connection.clone());
		Ok(connection)
	}

	fn log_statement(&self, config: &ConnectionConfig, sql: &str, bindings: &Values) {
		if config.log_queries {
			debug!(target: QUERY_LOG_TARGET, sql, ?bindings, "running query");
		}
	}

	/// Run a raw statement, sniffing the verb to decide between a row fetch
	/// and an execute.
	pub fn statement(
		&self,
		sql: &str,
		bindings: &Values,
		name: Option<&str>,
	) -> Result<QueryResult> {
		let head = sql.trim_start().to_ascii_lowercase();
		if head.starts_with("select") || head.starts_with("pragma") || head.starts_with("show") {
			Ok(QueryResult::Rows(self.select(sql, bindings, name)?))
		} else {
			Ok(QueryResult::Affected(
				self.execute(sql, bindings, name)?.rows_affected,
			))
		}
	}

	/// Run a read statement.
	pub fn select(&self, sql: &str, bindings: &Values, name: Option<&str>) -> Result<Vec<Row>> {
		let config = self.config(name)?;
		let connection = self.get_connection(name)?;
		// Logging happens after binding and before dispatch so failed
		// queries still show up.
		self.log_statement(&config, sql, bindings);
		let mut handle = connection.lock().expect("connection handle poisoned");
		handle
			.fetch_all(sql, bindings)
			.map_err(|source| ConnectionError::Query {
				sql: sql.to_string(),
				bindings: bindings.clone(),
				source,
			})
	}

	/// Run a write statement.
	pub fn execute(
		&self,
		sql: &str,
		bindings: &Values,
		name: Option<&str>,
	) -> Result<ExecuteResult> {
		let config = self.config(name)?;
		let connection = self.get_connection(name)?;
		self.log_statement(&config, sql, bindings);
		let mut handle = connection.lock().expect("connection handle poisoned");
		handle
			.execute(sql, bindings)
			.map_err(|source| ConnectionError::Query {
				sql: sql.to_string(),
				bindings: bindings.clone(),
				source,
			})
	}

	// ---- transactions ------------------------------------------------

	fn savepoint_name(depth: usize) -> String {
		format!("SP_{}", depth)
	}

	/// Current nesting depth for a connection name.
	pub fn transaction_depth(&self, name: Option<&str>) -> Result<usize> {
		let name = self.resolve_name(name)?;
		Ok(*self
			.transactions
			.lock()
			.expect("transaction registry poisoned")
			.get(&name)
			.unwrap_or(&0))
	}

	/// Begin a transaction, or create a savepoint when one is already open.
	pub fn begin_transaction(&self, name: Option<&str>) -> Result<()> {
		let resolved = self.resolve_name(name)?;
		let grammar = self.grammar(Some(&resolved))?;
		let depth = self.transaction_depth(Some(&resolved))?;
		let sql = if depth == 0 {
			grammar.begin_transaction_sql().to_string()
		} else {
			grammar.savepoint_sql(&Self::savepoint_name(depth))
		};
		self.execute(&sql, &Values::new(), Some(&resolved))?;
		self.transactions
			.lock()
			.expect("transaction registry poisoned")
			.insert(resolved, depth + 1);
		Ok(())
	}

	/// Commit the innermost scope: releases a savepoint when nested,
	/// commits for real at depth one.
	pub fn commit(&self, name: Option<&str>) -> Result<()> {
		let resolved = self.resolve_name(name)?;
		let grammar = self.grammar(Some(&resolved))?;
		let depth = self.transaction_depth(Some(&resolved))?;
		match depth {
			0 => {}
			1 => {
				self.execute(grammar.commit_sql(), &Values::new(), Some(&resolved))?;
			}
			nested => {
				if let Some(sql) =
					grammar.savepoint_release_sql(&Self::savepoint_name(nested - 1))
				{
					self.execute(&sql, &Values::new(), Some(&resolved))?;
				}
			}
		}
		if depth > 0 {
			self.transactions
				.lock()
				.expect("transaction registry poisoned")
				.insert(resolved, depth - 1);
		}
		Ok(())
	}

	/// Roll back the innermost scope, leaving any outer transaction alive.
	pub fn rollback(&self, name: Option<&str>) -> Result<()> {
		let resolved = self.resolve_name(name)?;
		let grammar = self.grammar(Some(&resolved))?;
		let depth = self.transaction_depth(Some(&resolved))?;
		match depth {
			0 => {}
			1 => {
				self.execute(grammar.rollback_sql(), &Values::new(), Some(&resolved))?;
			}
			nested => {
				let sql = grammar.savepoint_rollback_sql(&Self::savepoint_name(nested - 1));
				self.execute(&sql, &Values::new(), Some(&resolved))?;
			}
		}
		if depth > 0 {
			self.transactions
				.lock()
				.expect("transaction registry poisoned")
				.insert(resolved, depth - 1);
		}
		Ok(())
	}

	/// Run `f` inside a transaction scope: commit on `Ok`, roll back on
	/// `Err`. Nesting uses savepoints, so an inner failure only unwinds its
	/// own scope.
	pub fn transaction<T, E, F>(&self, name: Option<&str>, f: F) -> std::result::Result<T, E>
	where
		F: FnOnce() -> std::result::Result<T, E>,
		E: From<ConnectionError>,
	{
		self.begin_transaction(name).map_err(E::from)?;
		match f() {
			Ok(value) => {
				self.commit(name).map_err(E::from)?;
				Ok(value)
			}
			Err(error) => {
				// Preserve the caller's error even if the rollback itself
				// fails.
				let _ = self.rollback(name);
				Err(error)
			}
		}
	}
}

static GLOBAL_RESOLVER: OnceLock<ConnectionResolver> = OnceLock::new();

/// The process-wide resolver.
pub fn resolver() -> &'static ConnectionResolver {
	GLOBAL_RESOLVER.get_or_init(ConnectionResolver::new)
}

/// Replace the global registry. The usual call is one per process, at boot;
/// later calls swap the registry atomically.
pub fn set_connection_details(details: ConnectionDetails) {
	resolver().set_connection_details(details);
}
