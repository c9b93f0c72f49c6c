//! The schema facade.
//!
//! Binds blueprints to a connection: compiles them with the connection's
//! grammar and executes the resulting DDL statement list. In dry-run mode
//! nothing executes; the compiled SQL is collected for display instead.

use std::sync::Arc;

use tracing::debug;

use mortar_connection::{resolver as global_resolver, ConnectionResolver, DatabaseDriver};
use mortar_query::{Builder, Grammar, TableCommand, Value, Values};

use crate::blueprint::Blueprint;
use crate::error::Result;

pub struct Schema {
	resolver: Option<Arc<ConnectionResolver>>,
	connection: Option<String>,
	dry_run: bool,
	/// SQL captured by the last dry-run operation.
	captured: Vec<String>,
}

impl Default for Schema {
	fn default() -> Self {
		Self::new()
	}
}

impl Schema {
	pub fn new() -> Self {
		Self {
			resolver: None,
			connection: None,
			dry_run: false,
			captured: Vec::new(),
		}
	}

	pub fn on_connection(mut self, name: impl Into<String>) -> Self {
		self.connection = Some(name.into());
		self
	}

	pub fn on_resolver(mut self, resolver: Arc<ConnectionResolver>) -> Self {
		self.resolver = Some(resolver);
		self
	}

	/// Compile without executing; retrieve the SQL with [`Schema::captured`].
	pub fn dry_run(mut self, enabled: bool) -> Self {
		self.dry_run = enabled;
		self
	}

	pub fn captured(&self) -> &[String] {
		&self.captured
	}

	fn resolver(&self) -> &ConnectionResolver {
		match &self.resolver {
			Some(resolver) => resolver,
			None => global_resolver(),
		}
	}

	pub fn connection_name(&self) -> Option<&str> {
		self.connection.as_deref()
	}

	fn grammar(&self) -> Result<&'static dyn Grammar> {
		Ok(self.resolver().grammar(self.connection_name())?)
	}

	fn run_command(&mut self, command: TableCommand) -> Result<Vec<String>> {
		let grammar = self.grammar()?;
		let statements = grammar.compile_table(&command)?;
		for sql in &statements {
			if self.dry_run {
				self.captured.push(sql.clone());
			} else {
				debug!(sql, "running schema statement");
				self.resolver()
					.execute(sql, &Values::new(), self.connection_name())?;
			}
		}
		Ok(statements)
	}

	/// Create a table. Returns the executed (or captured) statements.
	pub fn create<F>(&mut self, table: impl Into<String>, f: F) -> Result<Vec<String>>
	where
		F: FnOnce(&mut Blueprint),
	{
		let mut blueprint = Blueprint::create(table);
		f(&mut blueprint);
		self.run_command(blueprint.into_command())
	}

	/// Alter a table.
	pub fn table<F>(&mut self, table: impl Into<String>, f: F) -> Result<Vec<String>>
	where
		F: FnOnce(&mut Blueprint),
	{
		let mut blueprint = Blueprint::alter(table);
		f(&mut blueprint);
		self.run_command(blueprint.into_command())
	}

	pub fn drop(&mut self, table: impl Into<String>) -> Result<Vec<String>> {
		self.run_command(Blueprint::drop(table, false).into_command())
	}

	pub fn drop_if_exists(&mut self, table: impl Into<String>) -> Result<Vec<String>> {
		self.run_command(Blueprint::drop(table, true).into_command())
	}

	/// Probe the dialect's catalog for a table.
	pub fn has_table(&self, table: &str) -> Result<bool> {
		let config = self.resolver().config(self.connection_name())?;
		let grammar = self.grammar()?;
		let query = match config.driver {
			DatabaseDriver::Sqlite => {
				let mut q = Builder::table("sqlite_master");
				q.select(["name"])
					.where_eq("type", "table")
					.where_eq("name", table);
				q
			}
			DatabaseDriver::Mysql | DatabaseDriver::Postgres | DatabaseDriver::Mssql => {
				let mut q = Builder::table("information_schema.tables");
				q.select(["table_name"]).where_eq("table_name", table);
				if let Some(schema) = &config.schema {
					q.where_eq("table_schema", Value::String(schema.clone()));
				}
				q
			}
		};
		let (sql, bindings) = grammar.compile_select(&query)?;
		let rows = self
			.resolver()
			.select(&sql, &bindings, self.connection_name())?;
		Ok(!rows.is_empty())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mortar_connection::testing::FakeDriver;
	use mortar_connection::{ConnectionConfig, ConnectionDetails};
	use pretty_assertions::assert_eq;

	fn schema_with_fake() -> (Schema, FakeDriver) {
		let resolver = Arc::new(ConnectionResolver::new());
		let fake = FakeDriver::new();
		fake.install(&resolver);
		resolver.set_connection_details(ConnectionDetails::single(
			"default",
			ConnectionConfig::sqlite_memory(),
		));
		(Schema::new().on_resolver(resolver), fake)
	}

	#[test]
	fn test_create_executes_each_statement() {
		let (mut schema, fake) = schema_with_fake();
		schema
			.create("users", |table| {
				table.increments("id");
				table.string("name");
				table.index("name");
			})
			.unwrap();
		let sql = fake.sql_log();
		assert_eq!(sql.len(), 2);
		assert!(sql[0].starts_with("CREATE TABLE \"users\""));
		assert!(sql[1].starts_with("CREATE INDEX"));
	}

	#[test]
	fn test_dry_run_captures_without_executing() {
		let (schema, fake) = schema_with_fake();
		let mut schema = schema.dry_run(true);
		let statements = schema
			.create("users", |table| {
				table.increments("id");
			})
			.unwrap();
		assert_eq!(statements.len(), 1);
		assert_eq!(schema.captured().len(), 1);
		assert!(fake.sql_log().is_empty());
	}
}
