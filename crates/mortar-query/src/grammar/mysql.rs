//! MySQL / MariaDB grammar.
//!
//! Backtick identifiers, `?` placeholders, `REGEXP` support, `AFTER` column
//! positioning and `MODIFY COLUMN` alters.

use super::Grammar;
use crate::error::Result;
use crate::schema::{ColumnDef, ColumnKind, IndexDef, IndexKind};
use crate::types::LockMode;

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlGrammar;

impl Grammar for MysqlGrammar {
	fn dialect(&self) -> &'static str {
		"mysql"
	}

	fn quote(&self, ident: &str) -> String {
		format!("`{}`", ident.replace('`', "``"))
	}

	fn lock_suffix(&self, mode: LockMode) -> Option<&'static str> {
		match mode {
			LockMode::None => None,
			LockMode::Shared => Some("LOCK IN SHARE MODE"),
			LockMode::Update => Some("FOR UPDATE"),
		}
	}

	fn begin_transaction_sql(&self) -> &'static str {
		"START TRANSACTION"
	}

	fn compile_truncate(&self, table: &str, disable_foreign_keys: bool) -> Result<Vec<String>> {
		let truncate = format!("TRUNCATE TABLE {}", self.quote_path(table));
		if disable_foreign_keys {
			Ok(vec![
				"SET FOREIGN_KEY_CHECKS = 0".to_string(),
				truncate,
				"SET FOREIGN_KEY_CHECKS = 1".to_string(),
			])
		} else {
			Ok(vec![truncate])
		}
	}

	fn column_type(&self, column: &ColumnDef) -> Result<String> {
		Ok(match &column.kind {
			ColumnKind::Increments | ColumnKind::BigIncrements => unreachable!(),
			ColumnKind::Integer => "INT".to_string(),
			ColumnKind::BigInteger => "BIGINT".to_string(),
			ColumnKind::SmallInteger => "SMALLINT".to_string(),
			ColumnKind::TinyInteger => "TINYINT".to_string(),
			ColumnKind::Decimal { precision, scale } => {
				format!("DECIMAL({}, {})", precision, scale)
			}
			ColumnKind::Float => "FLOAT".to_string(),
			ColumnKind::Double => "DOUBLE".to_string(),
			ColumnKind::VarChar(length) => format!("VARCHAR({})", length),
			ColumnKind::Char(length) => format!("CHAR({})", length),
			ColumnKind::Text => "TEXT".to_string(),
			ColumnKind::Boolean => "TINYINT(1)".to_string(),
			ColumnKind::Date => "DATE".to_string(),
			ColumnKind::DateTime => "DATETIME".to_string(),
			ColumnKind::Timestamp => "TIMESTAMP".to_string(),
			ColumnKind::Json => "JSON".to_string(),
			ColumnKind::Binary => "LONGBLOB".to_string(),
			ColumnKind::Uuid => "CHAR(36)".to_string(),
			ColumnKind::Enum(variants) => {
				let quoted = variants
					.iter()
					.map(|v| format!("'{}'", v.replace('\'', "''")))
					.collect::<Vec<_>>()
					.join(", ");
				format!("ENUM({})", quoted)
			}
		})
	}

	fn increments_type(&self, big: bool) -> String {
		if big {
			"BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY".to_string()
		} else {
			"INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY".to_string()
		}
	}

	fn supports_unsigned(&self) -> bool {
		true
	}

	fn supports_column_positioning(&self) -> bool {
		true
	}

	fn compile_change_column(&self, table: &str, column: &ColumnDef) -> Result<String> {
		let mut parts = Vec::new();
		self.write_column_def(&mut parts, column)?;
		Ok(format!(
			"ALTER TABLE {} MODIFY COLUMN {}",
			self.quote_path(table),
			parts.remove(0)
		))
	}

	fn compile_drop_index(&self, table: &str, name: &str) -> String {
		format!(
			"DROP INDEX {} ON {}",
			self.quote(name),
			self.quote_path(table)
		)
	}

	fn compile_index(&self, table: &str, index: &IndexDef) -> Result<String> {
		if index.kind == IndexKind::Fulltext {
			let columns = index
				.columns
				.iter()
				.map(|c| self.quote(c))
				.collect::<Vec<_>>()
				.join(", ");
			return Ok(format!(
				"CREATE FULLTEXT INDEX {} ON {} ({})",
				self.quote(&index.resolved_name(table)),
				self.quote_path(table),
				columns
			));
		}
		self.compile_basic_index(table, index)
	}
}
