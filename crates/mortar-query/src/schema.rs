//! Schema-change statement objects.
//!
//! A [`TableCommand`] is the compiled form of a migration blueprint: one
//! table, one mode, plus the column, index and foreign-key definitions the
//! grammar turns into DDL statements.

use crate::value::Value;

/// What the command does to its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
	Create,
	Alter,
	Drop,
}

/// Column data types understood by every grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
	/// Auto-incrementing integer primary key.
	Increments,
	/// Auto-incrementing big-integer primary key.
	BigIncrements,
	Integer,
	BigInteger,
	SmallInteger,
	TinyInteger,
	Decimal { precision: u8, scale: u8 },
	Float,
	Double,
	VarChar(u32),
	Char(u32),
	Text,
	Boolean,
	Date,
	DateTime,
	Timestamp,
	Json,
	Binary,
	Uuid,
	Enum(Vec<String>),
}

/// One column definition inside a create or alter command.
#[derive(Debug, Clone)]
pub struct ColumnDef {
	pub name: String,
	pub kind: ColumnKind,
	pub nullable: bool,
	pub unique: bool,
	pub default: Option<Value>,
	/// `DEFAULT CURRENT_TIMESTAMP`
	pub use_current: bool,
	pub unsigned: bool,
	pub primary: bool,
	/// Position hint, honored where the dialect supports `AFTER`.
	pub after: Option<String>,
	/// Marks an alter-mode column as a modification of an existing one.
	pub change: bool,
}

impl ColumnDef {
	pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
		Self {
			name: name.into(),
			kind,
			nullable: false,
			unique: false,
			default: None,
			use_current: false,
			unsigned: false,
			primary: false,
			after: None,
			change: false,
		}
	}
}

/// Index categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
	Primary,
	Unique,
	Index,
	Fulltext,
}

/// A named (or auto-named) index over one or more columns.
#[derive(Debug, Clone)]
pub struct IndexDef {
	pub kind: IndexKind,
	pub columns: Vec<String>,
	pub name: Option<String>,
}

impl IndexDef {
	/// The constraint name, defaulting to `<table>_<cols>_<suffix>`.
	pub fn resolved_name(&self, table: &str) -> String {
		if let Some(name) = &self.name {
			return name.clone();
		}
		let suffix = match self.kind {
			IndexKind::Primary => "primary",
			IndexKind::Unique => "unique",
			IndexKind::Index => "index",
			IndexKind::Fulltext => "fulltext",
		};
		format!("{}_{}_{}", table, self.columns.join("_"), suffix)
	}
}

/// Referential action on a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignAction {
	Cascade,
	SetNull,
	Restrict,
	NoAction,
}

impl ForeignAction {
	pub fn as_sql(&self) -> &'static str {
		match self {
			ForeignAction::Cascade => "CASCADE",
			ForeignAction::SetNull => "SET NULL",
			ForeignAction::Restrict => "RESTRICT",
			ForeignAction::NoAction => "NO ACTION",
		}
	}
}

/// A foreign key constraint.
#[derive(Debug, Clone)]
pub struct ForeignKeyDef {
	pub column: String,
	pub references: String,
	pub on: String,
	pub name: Option<String>,
	pub on_delete: Option<ForeignAction>,
	pub on_update: Option<ForeignAction>,
}

impl ForeignKeyDef {
	pub fn resolved_name(&self, table: &str) -> String {
		self.name
			.clone()
			.unwrap_or_else(|| format!("{}_{}_foreign", table, self.column))
	}
}

/// A complete schema change against one table.
#[derive(Debug, Clone)]
pub struct TableCommand {
	pub mode: TableMode,
	pub table: String,
	pub columns: Vec<ColumnDef>,
	pub indexes: Vec<IndexDef>,
	pub foreign_keys: Vec<ForeignKeyDef>,
	pub dropped_columns: Vec<String>,
	pub dropped_indexes: Vec<String>,
	pub if_exists: bool,
}

impl TableCommand {
	pub fn new(mode: TableMode, table: impl Into<String>) -> Self {
		Self {
			mode,
			table: table.into(),
			columns: Vec::new(),
			indexes: Vec::new(),
			foreign_keys: Vec::new(),
			dropped_columns: Vec::new(),
			dropped_indexes: Vec::new(),
			if_exists: false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_index_default_name() {
		let index = IndexDef {
			kind: IndexKind::Unique,
			columns: vec!["email".to_string()],
			name: None,
		};
		assert_eq!(index.resolved_name("users"), "users_email_unique");
	}

	#[test]
	fn test_foreign_key_default_name() {
		let fk = ForeignKeyDef {
			column: "user_id".to_string(),
			references: "id".to_string(),
			on: "users".to_string(),
			name: None,
			on_delete: Some(ForeignAction::Cascade),
			on_update: None,
		};
		assert_eq!(fk.resolved_name("posts"), "posts_user_id_foreign");
	}
}
