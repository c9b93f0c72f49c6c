//! Microsoft SQL Server grammar.
//!
//! Square-bracket identifiers, `?` placeholders, `OFFSET … FETCH` paging
//! (which requires an ORDER BY; one is injected when missing), lock hints as
//! table hints, and no regexp operator.

use super::Grammar;
use crate::builder::Builder;
use crate::error::{QueryError, Result};
use crate::schema::{ColumnDef, ColumnKind};
use crate::types::LockMode;
use crate::writer::SqlWriter;

#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlGrammar;

impl Grammar for MssqlGrammar {
	fn dialect(&self) -> &'static str {
		"mssql"
	}

	fn quote(&self, ident: &str) -> String {
		format!("[{}]", ident.replace(']', "]]"))
	}

	fn regexp_operator(&self, _negated: bool) -> Result<&'static str> {
		Err(QueryError::Unsupported {
			dialect: self.dialect(),
			feature: "the regexp operator".to_string(),
		})
	}

	fn lock_suffix(&self, _mode: LockMode) -> Option<&'static str> {
		None
	}

	fn table_hint(&self, mode: LockMode) -> Option<&'static str> {
		match mode {
			LockMode::None => None,
			LockMode::Shared => Some("WITH (HOLDLOCK, ROWLOCK)"),
			LockMode::Update => Some("WITH (UPDLOCK, ROWLOCK)"),
		}
	}

	fn write_limit_offset(&self, w: &mut SqlWriter, builder: &Builder) -> Result<()> {
		if builder.limit.is_none() && builder.offset.is_none() {
			return Ok(());
		}
		// OFFSET/FETCH is only legal after an ORDER BY.
		if builder.orders.is_empty() {
			w.push(" ORDER BY (SELECT NULL)");
		}
		w.push(&format!(" OFFSET {} ROWS", builder.offset.unwrap_or(0)));
		if let Some(limit) = builder.limit {
			w.push(&format!(" FETCH NEXT {} ROWS ONLY", limit));
		}
		Ok(())
	}

	fn begin_transaction_sql(&self) -> &'static str {
		"BEGIN TRANSACTION"
	}

	fn savepoint_sql(&self, name: &str) -> String {
		format!("SAVE TRANSACTION {}", name)
	}

	fn savepoint_release_sql(&self, _name: &str) -> Option<String> {
		// T-SQL savepoints expire with the transaction; there is no RELEASE.
		None
	}

	fn savepoint_rollback_sql(&self, name: &str) -> String {
		format!("ROLLBACK TRANSACTION {}", name)
	}

	fn add_column_keyword(&self) -> &'static str {
		"ADD"
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
			ColumnKind::Float => "REAL".to_string(),
			ColumnKind::Double => "FLOAT".to_string(),
			ColumnKind::VarChar(length) => format!("NVARCHAR({})", length),
			ColumnKind::Char(length) => format!("NCHAR({})", length),
			ColumnKind::Text => "NVARCHAR(MAX)".to_string(),
			ColumnKind::Boolean => "BIT".to_string(),
			ColumnKind::Date => "DATE".to_string(),
			ColumnKind::DateTime => "DATETIME2".to_string(),
			ColumnKind::Timestamp => "DATETIMEOFFSET".to_string(),
			ColumnKind::Json => "NVARCHAR(MAX)".to_string(),
			ColumnKind::Binary => "VARBINARY(MAX)".to_string(),
			ColumnKind::Uuid => "UNIQUEIDENTIFIER".to_string(),
			ColumnKind::Enum(variants) => {
				let quoted = variants
					.iter()
					.map(|v| format!("'{}'", v.replace('\'', "''")))
					.collect::<Vec<_>>()
					.join(", ");
				format!(
					"NVARCHAR(255) CHECK ({} IN ({}))",
					self.quote(&column.name),
					quoted
				)
			}
		})
	}

	fn increments_type(&self, big: bool) -> String {
		if big {
			"BIGINT IDENTITY(1,1) PRIMARY KEY".to_string()
		} else {
			"INT IDENTITY(1,1) PRIMARY KEY".to_string()
		}
	}
}
