//! SQLite grammar.
//!
//! Double-quoted identifiers, `?` placeholders. No row locks (the whole
//! database locks on write), no TRUNCATE verb, no in-place column changes.

use super::Grammar;
use crate::error::{QueryError, Result};
use crate::schema::{ColumnDef, ColumnKind};
use crate::types::LockMode;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGrammar;

impl Grammar for SqliteGrammar {
	fn dialect(&self) -> &'static str {
		"sqlite"
	}

	fn quote(&self, ident: &str) -> String {
		format!("\"{}\"", ident.replace('"', "\"\""))
	}

	fn lock_suffix(&self, _mode: LockMode) -> Option<&'static str> {
		None
	}

	fn compile_truncate(&self, table: &str, disable_foreign_keys: bool) -> Result<Vec<String>> {
		let delete = format!("DELETE FROM {}", self.quote_path(table));
		if disable_foreign_keys {
			Ok(vec![
				"PRAGMA foreign_keys = OFF".to_string(),
				delete,
				"PRAGMA foreign_keys = ON".to_string(),
			])
		} else {
			Ok(vec![delete])
		}
	}

	fn column_type(&self, column: &ColumnDef) -> Result<String> {
		Ok(match &column.kind {
			ColumnKind::Increments | ColumnKind::BigIncrements => unreachable!(),
			ColumnKind::Integer
			| ColumnKind::BigInteger
			| ColumnKind::SmallInteger
			| ColumnKind::TinyInteger => "INTEGER".to_string(),
			ColumnKind::Decimal { precision, scale } => {
				format!("DECIMAL({}, {})", precision, scale)
			}
			ColumnKind::Float | ColumnKind::Double => "REAL".to_string(),
			ColumnKind::VarChar(length) => format!("VARCHAR({})", length),
			ColumnKind::Char(length) => format!("CHAR({})", length),
			ColumnKind::Text => "TEXT".to_string(),
			ColumnKind::Boolean => "BOOLEAN".to_string(),
			ColumnKind::Date => "DATE".to_string(),
			ColumnKind::DateTime => "DATETIME".to_string(),
			ColumnKind::Timestamp => "TIMESTAMP".to_string(),
			ColumnKind::Json => "TEXT".to_string(),
			ColumnKind::Binary => "BLOB".to_string(),
			ColumnKind::Uuid => "CHAR(36)".to_string(),
			ColumnKind::Enum(variants) => {
				let quoted = variants
					.iter()
					.map(|v| format!("'{}'", v.replace('\'', "''")))
					.collect::<Vec<_>>()
					.join(", ");
				format!(
					"VARCHAR(255) CHECK ({} IN ({}))",
					self.quote(&column.name),
					quoted
				)
			}
		})
	}

	fn increments_type(&self, big: bool) -> String {
		// SQLite rowid aliases are INTEGER regardless of width.
		let _ = big;
		"INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
	}

	fn compile_change_column(&self, _table: &str, _column: &ColumnDef) -> Result<String> {
		Err(QueryError::Unsupported {
			dialect: self.dialect(),
			feature: "modifying existing columns".to_string(),
		})
	}
}
