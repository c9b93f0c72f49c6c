//! Table blueprints.
//!
//! A [`Blueprint`] accumulates column, index and foreign-key definitions
//! under one of three modes (create, alter, drop) and hands the finished
//! [`TableCommand`] to a grammar for DDL compilation. Column methods return a
//! [`ColumnHandle`] so modifiers chain off the definition they refer to.

use mortar_query::schema::{
	ColumnDef, ColumnKind, ForeignAction, ForeignKeyDef, IndexDef, IndexKind, TableCommand,
	TableMode,
};
use mortar_query::Value;

#[derive(Debug, Clone)]
pub struct Blueprint {
	command: TableCommand,
}

impl Blueprint {
	pub fn create(table: impl Into<String>) -> Self {
		Self {
			command: TableCommand::new(TableMode::Create, table),
		}
	}

	pub fn alter(table: impl Into<String>) -> Self {
		Self {
			command: TableCommand::new(TableMode::Alter, table),
		}
	}

	pub fn drop(table: impl Into<String>, if_exists: bool) -> Self {
		let mut command = TableCommand::new(TableMode::Drop, table);
		command.if_exists = if_exists;
		Self { command }
	}

	pub fn table(&self) -> &str {
		&self.command.table
	}

	pub fn into_command(self) -> TableCommand {
		self.command
	}

	fn push_column(&mut self, name: impl Into<String>, kind: ColumnKind) -> ColumnHandle<'_> {
		self.command.columns.push(ColumnDef::new(name, kind));
		let column = self
			.command
			.columns
			.last_mut()
			.unwrap_or_else(|| unreachable!("column was just pushed"));
		ColumnHandle { column }
	}

	// ---- columns -----------------------------------------------------

	pub fn increments(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Increments)
	}

	pub fn big_increments(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::BigIncrements)
	}

	pub fn uuid(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Uuid)
	}

	/// A `VARCHAR(255)` column.
	pub fn string(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::VarChar(255))
	}

	pub fn string_len(&mut self, name: impl Into<String>, length: u32) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::VarChar(length))
	}

	pub fn char(&mut self, name: impl Into<String>, length: u32) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Char(length))
	}

	pub fn text(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Text)
	}

	pub fn integer(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Integer)
	}

	pub fn big_integer(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::BigInteger)
	}

	pub fn small_integer(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::SmallInteger)
	}

	pub fn tiny_integer(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::TinyInteger)
	}

	pub fn unsigned_integer(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		let mut handle = self.push_column(name, ColumnKind::Integer);
		handle.column.unsigned = true;
		handle
	}

	pub fn decimal(
		&mut self,
		name: impl Into<String>,
		precision: u8,
		scale: u8,
	) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Decimal { precision, scale })
	}

	pub fn float(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Float)
	}

	pub fn double(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Double)
	}

	pub fn boolean(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Boolean)
	}

	pub fn date(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Date)
	}

	pub fn datetime(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::DateTime)
	}

	pub fn timestamp(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Timestamp)
	}

	/// The conventional `created_at` / `updated_at` pair.
	pub fn timestamps(&mut self) {
		self.timestamp("created_at").nullable().use_current();
		self.timestamp("updated_at").nullable().use_current();
	}

	/// The nullable `deleted_at` column backing soft deletes.
	pub fn soft_deletes(&mut self) {
		self.timestamp("deleted_at").nullable();
	}

	pub fn json(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Json)
	}

	pub fn binary(&mut self, name: impl Into<String>) -> ColumnHandle<'_> {
		self.push_column(name, ColumnKind::Binary)
	}

	pub fn enumeration<I, S>(&mut self, name: impl Into<String>, variants: I) -> ColumnHandle<'_>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.push_column(
			name,
			ColumnKind::Enum(variants.into_iter().map(Into::into).collect()),
		)
	}

	// ---- indexes & keys ----------------------------------------------

	fn push_index(&mut self, kind: IndexKind, columns: Vec<String>) {
		self.command.indexes.push(IndexDef {
			kind,
			columns,
			name: None,
		});
	}

	pub fn primary<I, S>(&mut self, columns: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.push_index(
			IndexKind::Primary,
			columns.into_iter().map(Into::into).collect(),
		);
	}

	pub fn unique(&mut self, column: impl Into<String>) {
		self.push_index(IndexKind::Unique, vec![column.into()]);
	}

	pub fn index(&mut self, column: impl Into<String>) {
		self.push_index(IndexKind::Index, vec![column.into()]);
	}

	pub fn fulltext(&mut self, column: impl Into<String>) {
		self.push_index(IndexKind::Fulltext, vec![column.into()]);
	}

	/// Begin a foreign-key definition; chain `references`, `on` and the
	/// action modifiers.
	pub fn foreign(&mut self, column: impl Into<String>) -> ForeignHandle<'_> {
		self.command.foreign_keys.push(ForeignKeyDef {
			column: column.into(),
			references: "id".to_string(),
			on: String::new(),
			name: None,
			on_delete: None,
			on_update: None,
		});
		let fk = self
			.command
			.foreign_keys
			.last_mut()
			.unwrap_or_else(|| unreachable!("foreign key was just pushed"));
		ForeignHandle { fk }
	}

	// ---- alter-mode drops --------------------------------------------

	pub fn drop_column(&mut self, name: impl Into<String>) {
		self.command.dropped_columns.push(name.into());
	}

	pub fn drop_index(&mut self, name: impl Into<String>) {
		self.command.dropped_indexes.push(name.into());
	}
}

/// Chainable modifiers for the column just defined.
pub struct ColumnHandle<'a> {
	column: &'a mut ColumnDef,
}

impl ColumnHandle<'_> {
	pub fn nullable(&mut self) -> &mut Self {
		self.column.nullable = true;
		self
	}

	pub fn unique(&mut self) -> &mut Self {
		self.column.unique = true;
		self
	}

	pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
		self.column.default = Some(value.into());
		self
	}

	pub fn use_current(&mut self) -> &mut Self {
		self.column.use_current = true;
		self
	}

	pub fn unsigned(&mut self) -> &mut Self {
		self.column.unsigned = true;
		self
	}

	pub fn primary(&mut self) -> &mut Self {
		self.column.primary = true;
		self
	}

	pub fn after(&mut self, column: impl Into<String>) -> &mut Self {
		self.column.after = Some(column.into());
		self
	}

	/// Mark an alter-mode definition as a modification of an existing
	/// column.
	pub fn change(&mut self) -> &mut Self {
		self.column.change = true;
		self
	}
}

/// Chainable builder for a foreign-key constraint.
pub struct ForeignHandle<'a> {
	fk: &'a mut ForeignKeyDef,
}

impl ForeignHandle<'_> {
	pub fn references(&mut self, column: impl Into<String>) -> &mut Self {
		self.fk.references = column.into();
		self
	}

	pub fn on(&mut self, table: impl Into<String>) -> &mut Self {
		self.fk.on = table.into();
		self
	}

	pub fn on_delete(&mut self, action: ForeignAction) -> &mut Self {
		self.fk.on_delete = Some(action);
		self
	}

	pub fn on_update(&mut self, action: ForeignAction) -> &mut Self {
		self.fk.on_update = Some(action);
		self
	}

	pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
		self.fk.name = Some(name.into());
		self
	}
}
