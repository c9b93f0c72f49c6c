//! Test doubles for the driver seam.
//!
//! [`FakeDriver`] registers a factory producing [`FakeConnection`]s that
//! share one recording buffer: every statement is captured with its bindings,
//! and canned results are popped from a queue. Reads with nothing queued
//! return no rows; writes report one affected row and a sequential insert id,
//! which is enough for most model round-trips.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use mortar_query::{Value, Values};

use crate::config::{ConnectionConfig, DatabaseDriver};
use crate::connection::Connection;
use crate::error::DriverError;
use crate::resolver::ConnectionResolver;
use crate::row::{ExecuteResult, Row};

#[derive(Debug)]
enum CannedResult {
	Rows(Vec<Row>),
	Affected(u64),
	Error(String),
}

#[derive(Debug, Default)]
struct FakeState {
	queries: Vec<(String, Vec<Value>)>,
	results: VecDeque<CannedResult>,
	next_insert_id: i64,
}

/// Shared handle over the fake's recorded state.
#[derive(Clone, Default)]
pub struct FakeDriver {
	state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register this fake as the factory for every driver on `resolver`.
	pub fn install(&self, resolver: &ConnectionResolver) {
		for driver in [
			DatabaseDriver::Mysql,
			DatabaseDriver::Postgres,
			DatabaseDriver::Sqlite,
			DatabaseDriver::Mssql,
		] {
			let state = self.state.clone();
			resolver.register_driver(
				driver,
				Arc::new(move |_config: &ConnectionConfig| {
					Ok(Box::new(FakeConnection {
						state: state.clone(),
					}) as Box<dyn Connection>)
				}),
			);
		}
	}

	/// Queue rows for the next read statement.
	pub fn queue_rows(&self, rows: Vec<Row>) {
		self.lock().results.push_back(CannedResult::Rows(rows));
	}

	/// Queue an affected-count for the next write statement.
	pub fn queue_affected(&self, count: u64) {
		self.lock().results.push_back(CannedResult::Affected(count));
	}

	/// Queue a driver failure for the next statement.
	pub fn queue_error(&self, message: impl Into<String>) {
		self.lock()
			.results
			.push_back(CannedResult::Error(message.into()));
	}

	/// Everything executed so far, in order.
	pub fn queries(&self) -> Vec<(String, Vec<Value>)> {
		self.lock().queries.clone()
	}

	/// SQL strings only, for order assertions.
	pub fn sql_log(&self) -> Vec<String> {
		self.lock().queries.iter().map(|(sql, _)| sql.clone()).collect()
	}

	pub fn query_count(&self) -> usize {
		self.lock().queries.len()
	}

	pub fn clear(&self) {
		let mut state = self.lock();
		state.queries.clear();
		state.results.clear();
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
		self.state.lock().expect("fake driver state poisoned")
	}
}

struct FakeConnection {
	state: Arc<Mutex<FakeState>>,
}

impl Connection for FakeConnection {
	fn execute(&mut self, sql: &str, bindings: &Values) -> Result<ExecuteResult, DriverError> {
		let mut state = self.state.lock().expect("fake driver state poisoned");
		state
			.queries
			.push((sql.to_string(), bindings.clone().into_inner()));
		// Queued rows belong to a later read; only consume write results.
		let queued = matches!(
			state.results.front(),
			Some(CannedResult::Affected(_)) | Some(CannedResult::Error(_))
		);
		if queued {
			match state.results.pop_front() {
				Some(CannedResult::Affected(count)) => {
					return Ok(ExecuteResult {
						rows_affected: count,
						last_insert_id: None,
					})
				}
				Some(CannedResult::Error(message)) => return Err(message.into()),
				_ => {}
			}
		}
		state.next_insert_id += 1;
		Ok(ExecuteResult {
			rows_affected: 1,
			last_insert_id: Some(state.next_insert_id),
		})
	}

	fn fetch_all(&mut self, sql: &str, bindings: &Values) -> Result<Vec<Row>, DriverError> {
		let mut state = self.state.lock().expect("fake driver state poisoned");
		state
			.queries
			.push((sql.to_string(), bindings.clone().into_inner()));
		let queued = matches!(
			state.results.front(),
			Some(CannedResult::Rows(_)) | Some(CannedResult::Error(_))
		);
		if queued {
			match state.results.pop_front() {
				Some(CannedResult::Rows(rows)) => return Ok(rows),
				Some(CannedResult::Error(message)) => return Err(message.into()),
				_ => {}
			}
		}
		Ok(Vec::new())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ConnectionDetails;
	use pretty_assertions::assert_eq;

	#[test]
	fn test_fake_records_and_replays() {
		let resolver = ConnectionResolver::new();
		let fake = FakeDriver::new();
		fake.install(&resolver);
		resolver.set_connection_details(ConnectionDetails::single(
			"default",
			ConnectionConfig::sqlite_memory(),
		));

		fake.queue_rows(vec![Row::from_pairs([("id", Value::Int(9))])]);
		let rows = resolver
			.select("SELECT * FROM users", &Values::new(), None)
			.unwrap();
		assert_eq!(rows[0].get_i64("id"), Some(9));
		assert_eq!(fake.sql_log(), vec!["SELECT * FROM users".to_string()]);
	}

	#[test]
	fn test_fake_insert_ids_are_sequential() {
		let resolver = ConnectionResolver::new();
		let fake = FakeDriver::new();
		fake.install(&resolver);
		resolver.set_connection_details(ConnectionDetails::single(
			"default",
			ConnectionConfig::sqlite_memory(),
		));

		let first = resolver
			.execute("INSERT INTO users (name) VALUES (?)", &Values::new(), None)
			.unwrap();
		let second = resolver
			.execute("INSERT INTO users (name) VALUES (?)", &Values::new(), None)
			.unwrap();
		assert_eq!(first.last_insert_id, Some(1));
		assert_eq!(second.last_insert_id, Some(2));
	}

	#[test]
	fn test_queued_error_surfaces() {
		let resolver = ConnectionResolver::new();
		let fake = FakeDriver::new();
		fake.install(&resolver);
		resolver.set_connection_details(ConnectionDetails::single(
			"default",
			ConnectionConfig::sqlite_memory(),
		));

		fake.queue_error("duplicate key");
		assert!(resolver
			.execute("INSERT INTO users (id) VALUES (?)", &Values::new(), None)
			.is_err());
	}
}
