//! PostgreSQL grammar.
//!
//! Double-quoted identifiers and numbered `$n` placeholders. Clauses compile
//! with `?` like every other dialect; `finalize` renumbers the finished
//! statement so nested fragments stay in document order.

use super::Grammar;
use crate::error::Result;
use crate::schema::{ColumnDef, ColumnKind};
use crate::writer::number_placeholders;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

impl Grammar for PostgresGrammar {
	fn dialect(&self) -> &'static str {
		"postgres"
	}

	fn quote(&self, ident: &str) -> String {
		format!("\"{}\"", ident.replace('"', "\"\""))
	}

	fn finalize(&self, sql: String) -> String {
		number_placeholders(&sql)
	}

	fn regexp_operator(&self, negated: bool) -> Result<&'static str> {
		Ok(if negated { "!~" } else { "~" })
	}

	fn insert_suffix(&self) -> Option<&'static str> {
		Some("RETURNING *")
	}

	fn compile_truncate(&self, table: &str, disable_foreign_keys: bool) -> Result<Vec<String>> {
		let cascade = if disable_foreign_keys { " CASCADE" } else { "" };
		Ok(vec![format!(
			"TRUNCATE TABLE {}{}",
			self.quote_path(table),
			cascade
		)])
	}

	fn column_type(&self, column: &ColumnDef) -> Result<String> {
		Ok(match &column.kind {
			ColumnKind::Increments | ColumnKind::BigIncrements => unreachable!(),
			ColumnKind::Integer => "INTEGER".to_string(),
			ColumnKind::BigInteger => "BIGINT".to_string(),
			ColumnKind::SmallInteger => "SMALLINT".to_string(),
			ColumnKind::TinyInteger => "SMALLINT".to_string(),
			ColumnKind::Decimal { precision, scale } => {
				format!("DECIMAL({}, {})", precision, scale)
			}
			ColumnKind::Float => "REAL".to_string(),
			ColumnKind::Double => "DOUBLE PRECISION".to_string(),
			ColumnKind::VarChar(length) => format!("VARCHAR({})", length),
			ColumnKind::Char(length) => format!("CHAR({})", length),
			ColumnKind::Text => "TEXT".to_string(),
			ColumnKind::Boolean => "BOOLEAN".to_string(),
			ColumnKind::Date => "DATE".to_string(),
			ColumnKind::DateTime => "TIMESTAMP".to_string(),
			ColumnKind::Timestamp => "TIMESTAMPTZ".to_string(),
			ColumnKind::Json => "JSONB".to_string(),
			ColumnKind::Binary => "BYTEA".to_string(),
			ColumnKind::Uuid => "UUID".to_string(),
			// Emulated with a checked VARCHAR; native enum types need a
			// separate CREATE TYPE the blueprint does not model.
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
		if big {
			"BIGSERIAL PRIMARY KEY".to_string()
		} else {
			"SERIAL PRIMARY KEY".to_string()
		}
	}

	fn compile_change_column(&self, table: &str, column: &ColumnDef) -> Result<String> {
		let mut sql = format!(
			"ALTER TABLE {} ALTER COLUMN {} TYPE {}",
			self.quote_path(table),
			self.quote(&column.name),
			self.column_type(column)?
		);
		sql.push_str(&format!(
			", ALTER COLUMN {} {} NOT NULL",
			self.quote(&column.name),
			if column.nullable { "DROP" } else { "SET" }
		));
		Ok(sql)
	}
}
