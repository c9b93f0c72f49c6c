//! Dialect grammars.
//!
//! [`Grammar`] carries the full ANSI compilation as default methods; the four
//! dialect implementations override only the points where they actually
//! differ — identifier quoting, placeholder style, limit/offset syntax,
//! locks, regexp support, DDL type names and transaction verbs. Bindings are
//! collected while clauses are written, so the emitted vector is always the
//! in-order concatenation select → from → join → where → group → having →
//! order → limit.

mod mssql;
mod mysql;
mod postgres;
mod sqlite;

pub use mssql::MssqlGrammar;
pub use mysql::MysqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;

use crate::builder::Builder;
use crate::clause::{
	AggregateClause, GroupClause, HavingClause, JoinClause, OrderClause, SelectColumn, UpdateExpr,
	WhereClause, WhereCondition,
};
use crate::error::{QueryError, Result};
use crate::schema::{ColumnDef, ColumnKind, ForeignKeyDef, IndexDef, IndexKind, TableCommand, TableMode};
use crate::types::{LockMode, Operator};
use crate::value::{Value, Values};
use crate::writer::SqlWriter;

pub trait Grammar: Send + Sync {
	fn dialect(&self) -> &'static str;

	/// Quote a single identifier segment.
	fn quote(&self, ident: &str) -> String;

	/// Post-process the finished SQL (PostgreSQL numbers its placeholders).
	fn finalize(&self, sql: String) -> String {
		sql
	}

	/// The dialect spelling of `REGEXP` / `NOT REGEXP`.
	fn regexp_operator(&self, negated: bool) -> Result<&'static str> {
		Ok(if negated { "NOT REGEXP" } else { "REGEXP" })
	}

	// ---- identifier helpers ------------------------------------------

	/// Quote a possibly dotted identifier (`users.id`, `t.*`).
	fn quote_path(&self, path: &str) -> String {
		path.split('.')
			.map(|segment| {
				if segment == "*" {
					"*".to_string()
				} else {
					self.quote(segment)
				}
			})
			.collect::<Vec<_>>()
			.join(".")
	}

	/// Qualify a bare column with the query's table or alias.
	fn qualify(&self, column: &str, qualifier: Option<&str>) -> String {
		if column.contains('.') {
			return self.quote_path(column);
		}
		match qualifier {
			Some(table) => format!("{}.{}", self.quote_path(table), self.quote(column)),
			None => self.quote(column),
		}
	}

	fn quote_table(&self, table: &str, alias: Option<&str>) -> String {
		match alias {
			Some(alias) => format!("{} AS {}", self.quote_path(table), self.quote(alias)),
			None => self.quote_path(table),
		}
	}

	// ---- SELECT ------------------------------------------------------

	fn compile_select(&self, builder: &Builder) -> Result<(String, Values)> {
		let table = builder.table.as_deref().ok_or(QueryError::MissingTable)?;
		let mut w = SqlWriter::new();

		w.push("SELECT ");
		if builder.distinct {
			w.push("DISTINCT ");
		}
		self.write_select_head(&mut w, builder)?;
		w.push(" FROM ");
		w.push(&self.quote_table(table, builder.alias.as_deref()));
		if let Some(hint) = self.table_hint(builder.lock) {
			w.push(" ");
			w.push(hint);
		}

		for join in &builder.joins {
			self.write_join(&mut w, join)?;
		}
		self.write_wheres(&mut w, &builder.wheres, builder.qualifier())?;
		self.write_groups(&mut w, &builder.groups);
		self.write_havings(&mut w, &builder.havings)?;
		self.write_orders(&mut w, &builder.orders);
		self.write_limit_offset(&mut w, builder)?;
		if let Some(suffix) = self.lock_suffix(builder.lock) {
			w.push(" ");
			w.push(suffix);
		}

		let (sql, values) = w.finish();
		Ok((self.finalize(sql), values))
	}

	/// Aggregate head wins over explicit columns; empty columns mean `*`.
	fn write_select_head(&self, w: &mut SqlWriter, builder: &Builder) -> Result<()> {
		if let Some(aggregate) = &builder.aggregate {
			self.write_aggregate(w, aggregate, builder.qualifier());
			return Ok(());
		}
		if builder.columns.is_empty() {
			w.push("*");
			return Ok(());
		}
		let mut error = None;
		w.push_list(&builder.columns, ", ", |w, column| match column {
			SelectColumn::Column { name, alias } => {
				w.push(&self.quote_path(name));
				if let Some(alias) = alias {
					w.push(" AS ");
					w.push(&self.quote(alias));
				}
			}
			SelectColumn::Subquery { query, alias } => match self.compile_subselect(query) {
				Ok((sql, bindings)) => {
					w.push("(");
					w.push_fragment(&sql, bindings);
					w.push(") AS ");
					w.push(&self.quote(alias));
				}
				Err(e) => error = Some(e),
			},
			SelectColumn::Raw(raw) => {
				w.push_fragment(&raw.sql, raw.bindings.clone());
			}
		});
		match error {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	fn write_aggregate(
		&self,
		w: &mut SqlWriter,
		aggregate: &AggregateClause,
		qualifier: Option<&str>,
	) {
		w.push(aggregate.function.as_sql());
		w.push("(");
		if aggregate.column == "*" {
			w.push("*");
		} else {
			w.push(&self.qualify(&aggregate.column, qualifier));
		}
		w.push(")");
		if let Some(alias) = &aggregate.alias {
			w.push(" AS ");
			w.push(&self.quote(alias));
		}
	}

	// ---- JOIN --------------------------------------------------------

	fn write_join(&self, w: &mut SqlWriter, join: &JoinClause) -> Result<()> {
		w.push(" ");
		w.push(join.kind.as_sql());
		w.push(" ");
		w.push(&self.quote_table(&join.table, join.alias.as_deref()));
		if join.on.is_empty() && join.wheres.is_empty() {
			return Ok(());
		}
		w.push(" ON ");
		let mut written = 0usize;
		for on in &join.on {
			if written > 0 {
				w.push(" ");
				w.push(on.boolean.as_sql());
				w.push(" ");
			}
			w.push(&self.quote_path(&on.first));
			w.push(" ");
			w.push(self.operator_sql(&on.operator)?);
			w.push(" ");
			w.push(&self.quote_path(&on.second));
			written += 1;
		}
		// Extra predicates on a join land in the ON clause.
		let join_qualifier = join.alias.as_deref().or(Some(join.table.as_str()));
		for clause in &join.wheres {
			if written > 0 {
				w.push(" ");
				w.push(clause.boolean.as_sql());
				w.push(" ");
			}
			self.write_condition(w, &clause.condition, join_qualifier)?;
			written += 1;
		}
		Ok(())
	}

	// ---- WHERE -------------------------------------------------------

	fn write_wheres(
		&self,
		w: &mut SqlWriter,
		wheres: &[WhereClause],
		qualifier: Option<&str>,
	) -> Result<()> {
		if wheres.is_empty() {
			return Ok(());
		}
		w.push(" WHERE ");
		self.write_where_list(w, wheres, qualifier)
	}

	fn write_where_list(
		&self,
		w: &mut SqlWriter,
		wheres: &[WhereClause],
		qualifier: Option<&str>,
	) -> Result<()> {
		for (i, clause) in wheres.iter().enumerate() {
			if i > 0 {
				w.push(" ");
				w.push(clause.boolean.as_sql());
				w.push(" ");
			}
			self.write_condition(w, &clause.condition, qualifier)?;
		}
		Ok(())
	}

	fn operator_sql(&self, operator: &Operator) -> Result<&'static str> {
		if operator.is_regexp() {
			self.regexp_operator(matches!(operator, Operator::NotRegexp))
		} else {
			Ok(operator.as_sql())
		}
	}

	fn write_condition(
		&self,
		w: &mut SqlWriter,
		condition: &WhereCondition,
		qualifier: Option<&str>,
	) -> Result<()> {
		match condition {
			WhereCondition::Basic {
				column,
				operator,
				value,
			} => {
				w.push(&self.qualify(column, qualifier));
				// Comparisons against NULL collapse into IS [NOT] NULL.
				if value.is_null() && matches!(operator, Operator::Eq | Operator::NotEq) {
					w.push(if *operator == Operator::Eq {
						" IS NULL"
					} else {
						" IS NOT NULL"
					});
					return Ok(());
				}
				w.push(" ");
				w.push(self.operator_sql(operator)?);
				w.push(" ");
				w.push_value(value.clone());
			}
			WhereCondition::Null { column, negated } => {
				w.push(&self.qualify(column, qualifier));
				w.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
			}
			WhereCondition::In {
				column,
				values,
				negated,
			} => {
				// An empty list can never match; compile a constant
				// predicate instead of invalid `IN ()` syntax.
				if values.is_empty() {
					w.push(if *negated { "1 = 1" } else { "0 = 1" });
					return Ok(());
				}
				w.push(&self.qualify(column, qualifier));
				w.push(if *negated { " NOT IN (" } else { " IN (" });
				w.push_list(values, ", ", |w, value| {
					w.push_value(value.clone());
				});
				w.push(")");
			}
			WhereCondition::InSub {
				column,
				query,
				negated,
			} => {
				w.push(&self.qualify(column, qualifier));
				w.push(if *negated { " NOT IN (" } else { " IN (" });
				let (sql, bindings) = self.compile_subselect(query)?;
				w.push_fragment(&sql, bindings);
				w.push(")");
			}
			WhereCondition::Between {
				column,
				low,
				high,
				negated,
			} => {
				w.push(&self.qualify(column, qualifier));
				w.push(if *negated {
					" NOT BETWEEN "
				} else {
					" BETWEEN "
				});
				w.push_value(low.clone());
				w.push(" AND ");
				w.push_value(high.clone());
			}
			WhereCondition::Column {
				first,
				operator,
				second,
			} => {
				w.push(&self.qualify(first, qualifier));
				w.push(" ");
				w.push(self.operator_sql(operator)?);
				w.push(" ");
				w.push(&self.qualify(second, qualifier));
			}
			WhereCondition::Exists { query, negated } => {
				w.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
				let (sql, bindings) = self.compile_subselect(query)?;
				w.push_fragment(&sql, bindings);
				w.push(")");
			}
			WhereCondition::Sub {
				column,
				operator,
				query,
			} => {
				w.push(&self.qualify(column, qualifier));
				w.push(" ");
				w.push(self.operator_sql(operator)?);
				w.push(" (");
				let (sql, bindings) = self.compile_subselect(query)?;
				w.push_fragment(&sql, bindings);
				w.push(")");
			}
			WhereCondition::Nested { wheres } => {
				w.push("(");
				self.write_where_list(w, wheres, qualifier)?;
				w.push(")");
			}
			WhereCondition::Raw(raw) => {
				w.push_fragment(&raw.sql, raw.bindings.clone());
			}
		}
		Ok(())
	}

	/// Nested selects compile without placeholder renumbering; the outer
	/// `finalize` pass sees the whole statement.
	fn compile_subselect(&self, builder: &Builder) -> Result<(String, Values)> {
		let table = builder.table.as_deref().ok_or(QueryError::MissingTable)?;
		let mut w = SqlWriter::new();
		w.push("SELECT ");
		if builder.distinct {
			w.push("DISTINCT ");
		}
		self.write_select_head(&mut w, builder)?;
		w.push(" FROM ");
		w.push(&self.quote_table(table, builder.alias.as_deref()));
		for join in &builder.joins {
			self.write_join(&mut w, join)?;
		}
		self.write_wheres(&mut w, &builder.wheres, builder.qualifier())?;
		self.write_groups(&mut w, &builder.groups);
		self.write_havings(&mut w, &builder.havings)?;
		self.write_orders(&mut w, &builder.orders);
		self.write_limit_offset(&mut w, builder)?;
		Ok(w.finish())
	}

	// ---- GROUP / HAVING / ORDER --------------------------------------

	fn write_groups(&self, w: &mut SqlWriter, groups: &[GroupClause]) {
		if groups.is_empty() {
			return;
		}
		w.push(" GROUP BY ");
		w.push_list(groups, ", ", |w, group| match group {
			GroupClause::Column(column) => w.push(&self.quote_path(column)),
			GroupClause::Raw(raw) => w.push_fragment(&raw.sql, raw.bindings.clone()),
		});
	}

	fn write_havings(&self, w: &mut SqlWriter, havings: &[HavingClause]) -> Result<()> {
		if havings.is_empty() {
			return Ok(());
		}
		w.push(" HAVING ");
		for (i, having) in havings.iter().enumerate() {
			match having {
				HavingClause::Basic {
					boolean,
					column,
					operator,
					value,
				} => {
					if i > 0 {
						w.push(" ");
						w.push(boolean.as_sql());
						w.push(" ");
					}
					w.push(&self.quote_path(column));
					w.push(" ");
					w.push(self.operator_sql(operator)?);
					w.push(" ");
					w.push_value(value.clone());
				}
				HavingClause::Raw { boolean, raw } => {
					if i > 0 {
						w.push(" ");
						w.push(boolean.as_sql());
						w.push(" ");
					}
					w.push_fragment(&raw.sql, raw.bindings.clone());
				}
			}
		}
		Ok(())
	}

	fn write_orders(&self, w: &mut SqlWriter, orders: &[OrderClause]) {
		if orders.is_empty() {
			return;
		}
		w.push(" ORDER BY ");
		w.push_list(orders, ", ", |w, order| match order {
			OrderClause::Column { column, direction } => {
				w.push(&self.quote_path(column));
				w.push(" ");
				w.push(direction.as_sql());
			}
			OrderClause::Raw(raw) => w.push_fragment(&raw.sql, raw.bindings.clone()),
		});
	}

	fn write_limit_offset(&self, w: &mut SqlWriter, builder: &Builder) -> Result<()> {
		if let Some(limit) = builder.limit {
			w.push(&format!(" LIMIT {}", limit));
		}
		if let Some(offset) = builder.offset {
			w.push(&format!(" OFFSET {}", offset));
		}
		Ok(())
	}

	// ---- locks -------------------------------------------------------

	/// Suffix appended after the whole statement (`FOR UPDATE`).
	fn lock_suffix(&self, mode: LockMode) -> Option<&'static str> {
		match mode {
			LockMode::None => None,
			LockMode::Shared => Some("FOR SHARE"),
			LockMode::Update => Some("FOR UPDATE"),
		}
	}

	/// Hint written directly after the table name (MSSQL).
	fn table_hint(&self, _mode: LockMode) -> Option<&'static str> {
		None
	}

	// ---- INSERT / UPDATE / DELETE ------------------------------------

	fn compile_insert(
		&self,
		builder: &Builder,
		row: &[(String, Value)],
	) -> Result<(String, Values)> {
		let table = builder.table.as_deref().ok_or(QueryError::MissingTable)?;
		let mut w = SqlWriter::new();
		w.push("INSERT INTO ");
		w.push(&self.quote_path(table));
		w.push(" (");
		w.push_list(row, ", ", |w, (column, _)| {
			w.push(&self.quote(column));
		});
		w.push(") VALUES (");
		w.push_list(row, ", ", |w, (_, value)| {
			w.push_value(value.clone());
		});
		w.push(")");
		if let Some(suffix) = self.insert_suffix() {
			w.push(" ");
			w.push(suffix);
		}
		let (sql, values) = w.finish();
		Ok((self.finalize(sql), values))
	}

	fn compile_bulk_insert(
		&self,
		builder: &Builder,
		columns: &[String],
		rows: &[Vec<Value>],
	) -> Result<(String, Values)> {
		let table = builder.table.as_deref().ok_or(QueryError::MissingTable)?;
		let mut w = SqlWriter::new();
		w.push("INSERT INTO ");
		w.push(&self.quote_path(table));
		w.push(" (");
		w.push_list(columns, ", ", |w, column| {
			w.push(&self.quote(column));
		});
		w.push(") VALUES ");
		w.push_list(rows, ", ", |w, row| {
			w.push("(");
			w.push_list(row, ", ", |w, value| {
				w.push_value(value.clone());
			});
			w.push(")");
		});
		let (sql, values) = w.finish();
		Ok((self.finalize(sql), values))
	}

	/// Clause appended to INSERT statements (PostgreSQL's `RETURNING *`).
	fn insert_suffix(&self) -> Option<&'static str> {
		None
	}

	fn compile_update(
		&self,
		builder: &Builder,
		sets: &[(String, UpdateExpr)],
	) -> Result<(String, Values)> {
		let table = builder.table.as_deref().ok_or(QueryError::MissingTable)?;
		let mut w = SqlWriter::new();
		w.push("UPDATE ");
		w.push(&self.quote_path(table));
		w.push(" SET ");
		w.push_list(sets, ", ", |w, (column, expr)| {
			w.push(&self.quote(column));
			w.push(" = ");
			match expr {
				UpdateExpr::Value(value) => w.push_value(value.clone()),
				UpdateExpr::Raw(sql) => w.push(sql),
			}
		});
		self.write_wheres(&mut w, &builder.wheres, builder.qualifier())?;
		let (sql, values) = w.finish();
		Ok((self.finalize(sql), values))
	}

	fn compile_delete(&self, builder: &Builder) -> Result<(String, Values)> {
		let table = builder.table.as_deref().ok_or(QueryError::MissingTable)?;
		let mut w = SqlWriter::new();
		w.push("DELETE FROM ");
		w.push(&self.quote_path(table));
		self.write_wheres(&mut w, &builder.wheres, builder.qualifier())?;
		let (sql, values) = w.finish();
		Ok((self.finalize(sql), values))
	}

	/// One or more statements; disabling foreign-key checks may bracket the
	/// truncate on dialects that need it.
	fn compile_truncate(&self, table: &str, disable_foreign_keys: bool) -> Result<Vec<String>> {
		let _ = disable_foreign_keys;
		Ok(vec![format!("TRUNCATE TABLE {}", self.quote_path(table))])
	}

	// ---- transactions ------------------------------------------------

	fn begin_transaction_sql(&self) -> &'static str {
		"BEGIN"
	}

	fn commit_sql(&self) -> &'static str {
		"COMMIT"
	}

	fn rollback_sql(&self) -> &'static str {
		"ROLLBACK"
	}

	fn savepoint_sql(&self, name: &str) -> String {
		format!("SAVEPOINT {}", name)
	}

	/// `None` where the dialect has no RELEASE form.
	fn savepoint_release_sql(&self, name: &str) -> Option<String> {
		Some(format!("RELEASE SAVEPOINT {}", name))
	}

	fn savepoint_rollback_sql(&self, name: &str) -> String {
		format!("ROLLBACK TO SAVEPOINT {}", name)
	}

	// ---- DDL ---------------------------------------------------------

	/// The type fragment for a column, without modifiers.
	fn column_type(&self, column: &ColumnDef) -> Result<String>;

	/// The full definition for auto-incrementing primary keys.
	fn increments_type(&self, big: bool) -> String;

	fn supports_unsigned(&self) -> bool {
		false
	}

	fn write_column_def(&self, parts: &mut Vec<String>, column: &ColumnDef) -> Result<()> {
		if matches!(
			column.kind,
			ColumnKind::Increments | ColumnKind::BigIncrements
		) {
			parts.push(format!(
				"{} {}",
				self.quote(&column.name),
				self.increments_type(matches!(column.kind, ColumnKind::BigIncrements)),
			));
			return Ok(());
		}
		let mut def = format!("{} {}", self.quote(&column.name), self.column_type(column)?);
		if column.unsigned && self.supports_unsigned() {
			def.push_str(" UNSIGNED");
		}
		def.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
		if column.use_current {
			def.push_str(" DEFAULT CURRENT_TIMESTAMP");
		} else if let Some(default) = &column.default {
			def.push_str(" DEFAULT ");
			def.push_str(&default.quoted());
		}
		if column.primary {
			def.push_str(" PRIMARY KEY");
		}
		if column.unique {
			def.push_str(" UNIQUE");
		}
		if let Some(after) = &column.after {
			if self.supports_column_positioning() {
				def.push_str(" AFTER ");
				def.push_str(&self.quote(after));
			}
		}
		parts.push(def);
		Ok(())
	}

	fn supports_column_positioning(&self) -> bool {
		false
	}

	/// `ALTER TABLE ... ADD` keyword; MSSQL drops the `COLUMN` word.
	fn add_column_keyword(&self) -> &'static str {
		"ADD COLUMN"
	}

	fn compile_change_column(&self, table: &str, column: &ColumnDef) -> Result<String> {
		let mut parts = Vec::new();
		self.write_column_def(&mut parts, column)?;
		Ok(format!(
			"ALTER TABLE {} ALTER COLUMN {}",
			self.quote_path(table),
			parts.remove(0)
		))
	}

	fn compile_drop_index(&self, table: &str, name: &str) -> String {
		let _ = table;
		format!("DROP INDEX {}", self.quote(name))
	}

	fn compile_index(&self, table: &str, index: &IndexDef) -> Result<String> {
		self.compile_basic_index(table, index)
	}

	fn compile_basic_index(&self, table: &str, index: &IndexDef) -> Result<String> {
		let name = index.resolved_name(table);
		let columns = index
			.columns
			.iter()
			.map(|c| self.quote(c))
			.collect::<Vec<_>>()
			.join(", ");
		match index.kind {
			IndexKind::Primary => Ok(format!(
				"ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
				self.quote_path(table),
				self.quote(&name),
				columns
			)),
			IndexKind::Unique => Ok(format!(
				"CREATE UNIQUE INDEX {} ON {} ({})",
				self.quote(&name),
				self.quote_path(table),
				columns
			)),
			IndexKind::Index => Ok(format!(
				"CREATE INDEX {} ON {} ({})",
				self.quote(&name),
				self.quote_path(table),
				columns
			)),
			IndexKind::Fulltext => Err(QueryError::Unsupported {
				dialect: self.dialect(),
				feature: "fulltext indexes".to_string(),
			}),
		}
	}

	fn compile_foreign_key(&self, table: &str, fk: &ForeignKeyDef) -> String {
		let mut sql = format!(
			"ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
			self.quote_path(table),
			self.quote(&fk.resolved_name(table)),
			self.quote(&fk.column),
			self.quote_path(&fk.on),
			self.quote(&fk.references),
		);
		if let Some(action) = fk.on_delete {
			sql.push_str(" ON DELETE ");
			sql.push_str(action.as_sql());
		}
		if let Some(action) = fk.on_update {
			sql.push_str(" ON UPDATE ");
			sql.push_str(action.as_sql());
		}
		sql
	}

	/// Compile a whole table command into an ordered statement list:
	/// create/alter first, then column changes, then indexes, then
	/// foreign keys.
	fn compile_table(&self, command: &TableCommand) -> Result<Vec<String>> {
		match command.mode {
			TableMode::Drop => {
				let exists = if command.if_exists { "IF EXISTS " } else { "" };
				Ok(vec![format!(
					"DROP TABLE {}{}",
					exists,
					self.quote_path(&command.table)
				)])
			}
			TableMode::Create => self.compile_create(command),
			TableMode::Alter => self.compile_alter(command),
		}
	}

	fn compile_create(&self, command: &TableCommand) -> Result<Vec<String>> {
		let mut parts = Vec::new();
		for column in &command.columns {
			self.write_column_def(&mut parts, column)?;
		}
		let mut statements = Vec::new();
		let mut trailing_indexes = Vec::new();
		for index in &command.indexes {
			// A primary-key index inlines as a table constraint; the rest
			// compile to their own statements after the create.
			if index.kind == IndexKind::Primary {
				let columns = index
					.columns
					.iter()
					.map(|c| self.quote(c))
					.collect::<Vec<_>>()
					.join(", ");
				parts.push(format!("PRIMARY KEY ({})", columns));
			} else {
				trailing_indexes.push(index);
			}
		}
		for fk in &command.foreign_keys {
			let mut constraint = format!(
				"CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
				self.quote(&fk.resolved_name(&command.table)),
				self.quote(&fk.column),
				self.quote_path(&fk.on),
				self.quote(&fk.references),
			);
			if let Some(action) = fk.on_delete {
				constraint.push_str(" ON DELETE ");
				constraint.push_str(action.as_sql());
			}
			if let Some(action) = fk.on_update {
				constraint.push_str(" ON UPDATE ");
				constraint.push_str(action.as_sql());
			}
			parts.push(constraint);
		}
		statements.push(format!(
			"CREATE TABLE {} ({})",
			self.quote_path(&command.table),
			parts.join(", ")
		));
		for index in trailing_indexes {
			statements.push(self.compile_index(&command.table, index)?);
		}
		Ok(statements)
	}

	fn compile_alter(&self, command: &TableCommand) -> Result<Vec<String>> {
		let mut statements = Vec::new();
		for column in &command.columns {
			if column.change {
				statements.push(self.compile_change_column(&command.table, column)?);
			} else {
				let mut parts = Vec::new();
				self.write_column_def(&mut parts, column)?;
				statements.push(format!(
					"ALTER TABLE {} {} {}",
					self.quote_path(&command.table),
					self.add_column_keyword(),
					parts.remove(0)
				));
			}
		}
		for dropped in &command.dropped_columns {
			statements.push(format!(
				"ALTER TABLE {} DROP COLUMN {}",
				self.quote_path(&command.table),
				self.quote(dropped)
			));
		}
		for dropped in &command.dropped_indexes {
			statements.push(self.compile_drop_index(&command.table, dropped));
		}
		for index in &command.indexes {
			statements.push(self.compile_index(&command.table, index)?);
		}
		for fk in &command.foreign_keys {
			statements.push(self.compile_foreign_key(&command.table, fk));
		}
		Ok(statements)
	}
}
