//! The migration runner and its ledger.
//!
//! Applied migrations are recorded in a `migrations` table with `{id,
//! migration, batch}`. `migrate` runs pending migrations in lexicographic
//! name order under the next batch number, each inside its own transaction;
//! `rollback` reverts the latest batch in reverse order; `reset` unwinds
//! everything; `refresh` is reset followed by migrate.

use std::sync::Arc;

use tracing::info;

use mortar_connection::{resolver as global_resolver, ConnectionResolver};
use mortar_query::{Builder, Value, Values};

use crate::error::{MigrationError, Result};
use crate::schema::Schema;

const LEDGER_TABLE: &str = "migrations";

/// One schema change with a forward and reverse step.
pub trait Migration: Send + Sync {
	/// The ledger name; ordering is lexicographic, so date-prefixed names
	/// (`2024_05_01_000000_create_users`) apply chronologically.
	fn name(&self) -> &str;

	fn up(&self, schema: &mut Schema) -> Result<()>;

	fn down(&self, schema: &mut Schema) -> Result<()>;
}

/// Status line reported by `status()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
	pub name: String,
	pub applied: bool,
	pub batch: Option<i64>,
}

pub struct Migrator {
	resolver: Option<Arc<ConnectionResolver>>,
	connection: Option<String>,
	migrations: Vec<Box<dyn Migration>>,
}

impl Default for Migrator {
	fn default() -> Self {
		Self::new()
	}
}

impl Migrator {
	pub fn new() -> Self {
		Self {
			resolver: None,
			connection: None,
			migrations: Vec::new(),
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

	pub fn register(&mut self, migration: Box<dyn Migration>) -> &mut Self {
		self.migrations.push(migration);
		self
	}

	fn resolver(&self) -> &ConnectionResolver {
		match &self.resolver {
			Some(resolver) => resolver,
			None => global_resolver(),
		}
	}

	fn connection_name(&self) -> Option<&str> {
		self.connection.as_deref()
	}

	fn schema(&self) -> Schema {
		let mut schema = Schema::new();
		if let Some(resolver) = &self.resolver {
			schema = schema.on_resolver(resolver.clone());
		}
		if let Some(connection) = &self.connection {
			schema = schema.on_connection(connection.clone());
		}
		schema
	}

	/// Create the ledger table when missing.
	pub fn ensure_ledger(&self) -> Result<()> {
		let mut schema = self.schema();
		if !schema.has_table(LEDGER_TABLE)? {
			schema.create(LEDGER_TABLE, |table| {
				table.increments("id");
				table.string("migration");
				table.integer("batch");
			})?;
		}
		Ok(())
	}

	fn ledger_rows(&self) -> Result<Vec<(String, i64)>> {
		let grammar = self.resolver().grammar(self.connection_name())?;
		let mut query = Builder::table(LEDGER_TABLE);
		query.select(["migration", "batch"]).order_by("id", "asc");
		let (sql, bindings) = grammar.compile_select(&query)?;
		let rows = self
			.resolver()
			.select(&sql, &bindings, self.connection_name())?;
		Ok(rows
			.into_iter()
			.filter_map(|row| {
				let name = row.get_str("migration")?.to_string();
				let batch = row.get_i64("batch")?;
				Some((name, batch))
			})
			.collect())
	}

	fn record_applied(&self, name: &str, batch: i64) -> Result<()> {
		let grammar = self.resolver().grammar(self.connection_name())?;
		let query = Builder::table(LEDGER_TABLE);
		let (sql, bindings) = grammar.compile_insert(
			&query,
			&[
				("migration".to_string(), Value::String(name.to_string())),
				("batch".to_string(), Value::Int(batch)),
			],
		)?;
		self.resolver()
			.execute(&sql, &bindings, self.connection_name())?;
		Ok(())
	}

	fn forget_applied(&self, name: &str) -> Result<()> {
		let grammar = self.resolver().grammar(self.connection_name())?;
		let mut query = Builder::table(LEDGER_TABLE);
		query.where_eq("migration", name);
		let (sql, bindings) = grammar.compile_delete(&query)?;
		self.resolver()
			.execute(&sql, &bindings, self.connection_name())?;
		Ok(())
	}

	/// Apply every pending migration under one new batch number. Returns
	/// the applied names in order.
	pub fn migrate(&self) -> Result<Vec<String>> {
		self.ensure_ledger()?;
		let ledger = self.ledger_rows()?;
		let next_batch = ledger.iter().map(|(_, b)| *b).max().unwrap_or(0) + 1;

		let mut pending: Vec<&dyn Migration> = self
			.migrations
			.iter()
			.map(|m| m.as_ref())
			.filter(|m| !ledger.iter().any(|(name, _)| name == m.name()))
			.collect();
		pending.sort_by(|a, b| a.name().cmp(b.name()));

		let mut applied = Vec::new();
		for migration in pending {
			self.run_one(migration, next_batch)?;
			applied.push(migration.name().to_string());
		}
		Ok(applied)
	}

	/// Each file runs inside its own transaction: a failure rolls the
	/// current file back but leaves earlier files of the batch applied.
	fn run_one(&self, migration: &dyn Migration, batch: i64) -> Result<()> {
		let name = migration.name().to_string();
		self.resolver()
			.transaction(self.connection_name(), || -> Result<()> {
				let mut schema = self.schema();
				migration.up(&mut schema)?;
				self.record_applied(&name, batch)?;
				Ok(())
			})
			.map_err(|e| match e {
				MigrationError::Failed { .. } => e,
				other => MigrationError::Failed {
					name: name.clone(),
					reason: other.to_string(),
				},
			})?;
		info!(migration = %name, batch, "migrated");
		Ok(())
	}

	fn revert_one(&self, name: &str) -> Result<()> {
		let migration = self
			.migrations
			.iter()
			.find(|m| m.name() == name)
			.ok_or_else(|| MigrationError::UnknownMigration(name.to_string()))?;
		self.resolver()
			.transaction(self.connection_name(), || -> Result<()> {
				let mut schema = self.schema();
				migration.down(&mut schema)?;
				self.forget_applied(name)?;
				Ok(())
			})?;
		info!(migration = %name, "rolled back");
		Ok(())
	}

	/// Revert the most recent batch, newest file first.
	pub fn rollback(&self) -> Result<Vec<String>> {
		self.ensure_ledger()?;
		let ledger = self.ledger_rows()?;
		let Some(last_batch) = ledger.iter().map(|(_, b)| *b).max() else {
			return Ok(Vec::new());
		};
		let mut names: Vec<String> = ledger
			.into_iter()
			.filter(|(_, batch)| *batch == last_batch)
			.map(|(name, _)| name)
			.collect();
		names.sort();
		names.reverse();

		for name in &names {
			self.revert_one(name)?;
		}
		Ok(names)
	}

	/// Revert every applied batch.
	pub fn reset(&self) -> Result<Vec<String>> {
		self.ensure_ledger()?;
		let mut ledger = self.ledger_rows()?;
		// Newest batch first, then reverse name order within a batch.
		ledger.sort_by(|(a_name, a_batch), (b_name, b_batch)| {
			b_batch.cmp(a_batch).then(b_name.cmp(a_name))
		});
		let names: Vec<String> = ledger.into_iter().map(|(name, _)| name).collect();
		for name in &names {
			self.revert_one(name)?;
		}
		Ok(names)
	}

	/// Reset, then migrate everything again.
	pub fn refresh(&self) -> Result<Vec<String>> {
		self.reset()?;
		self.migrate()
	}

	/// Applied/pending report for every registered migration.
	pub fn status(&self) -> Result<Vec<MigrationStatus>> {
		self.ensure_ledger()?;
		let ledger = self.ledger_rows()?;
		let mut statuses: Vec<MigrationStatus> = self
			.migrations
			.iter()
			.map(|m| {
				let entry = ledger.iter().find(|(name, _)| name == m.name());
				MigrationStatus {
					name: m.name().to_string(),
					applied: entry.is_some(),
					batch: entry.map(|(_, batch)| *batch),
				}
			})
			.collect();
		statuses.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(statuses)
	}

	/// Compile the pending migrations without executing anything; the
	/// dry-run counterpart of [`Migrator::migrate`].
	pub fn show_pending(&self) -> Result<Vec<(String, Vec<String>)>> {
		self.ensure_ledger()?;
		let ledger = self.ledger_rows()?;
		let mut pending: Vec<&dyn Migration> = self
			.migrations
			.iter()
			.map(|m| m.as_ref())
			.filter(|m| !ledger.iter().any(|(name, _)| name == m.name()))
			.collect();
		pending.sort_by(|a, b| a.name().cmp(b.name()));

		let mut out = Vec::new();
		for migration in pending {
			let mut schema = self.schema().dry_run(true);
			migration.up(&mut schema)?;
			out.push((
				migration.name().to_string(),
				schema.captured().to_vec(),
			));
		}
		Ok(out)
	}

	/// Raw statement escape hatch for data migrations.
	pub fn statement(&self, sql: &str, bindings: Vec<Value>) -> Result<()> {
		self.resolver()
			.execute(sql, &Values::from(bindings), self.connection_name())?;
		Ok(())
	}
}
