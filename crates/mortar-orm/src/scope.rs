//! Query scopes.
//!
//! Global scopes attach predicates or behavior overrides to every query built
//! from a model. Soft deletes and UUID primary keys are composable scope
//! records registered in the metadata's scope list like any user scope; they
//! are not special-cased type machinery. Local scopes are named query
//! fragments invoked explicitly.

use std::collections::BTreeMap;

use chrono::Utc;
use mortar_query::{Builder, UpdateExpr, Value};
use uuid::Uuid;

use crate::error::{OrmError, Result};

/// Name the soft-delete scope registers under for per-query opt-out.
pub const SOFT_DELETE_SCOPE: &str = "soft_deletes";

/// A behavior applied to every query for a model, unless opted out by name.
pub trait GlobalScope: Send + Sync {
	fn name(&self) -> &str;

	/// Constrain a select/update/delete builder.
	fn apply(&self, builder: &mut Builder);

	/// Replacement assignments that turn a delete into an update. `None`
	/// leaves the DELETE statement alone.
	fn apply_to_delete(&self) -> Option<Vec<(String, UpdateExpr)>> {
		None
	}

	/// Adjust the row about to be inserted.
	fn apply_to_insert(&self, _row: &mut BTreeMap<String, Value>) -> Result<()> {
		Ok(())
	}
}

/// A named query fragment: `scope("popular", args)` runs the function
/// against the builder.
pub type LocalScope = fn(&mut Builder, &[Value]);

/// How soft-deleted rows participate in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrashMode {
	/// Hide trashed rows (the scope's normal behavior).
	#[default]
	WithoutTrashed,
	/// Disable the scope.
	WithTrashed,
	/// Invert the scope: only trashed rows.
	OnlyTrashed,
}

/// The soft-delete scope: hides stamped rows and rewrites deletes into
/// updates of the stamp column.
#[derive(Debug, Clone)]
pub struct SoftDeletingScope {
	pub column: String,
}

impl Default for SoftDeletingScope {
	fn default() -> Self {
		Self {
			column: "deleted_at".to_string(),
		}
	}
}

impl GlobalScope for SoftDeletingScope {
	fn name(&self) -> &str {
		SOFT_DELETE_SCOPE
	}

	fn apply(&self, builder: &mut Builder) {
		builder.where_null(self.column.clone());
	}

	fn apply_to_delete(&self) -> Option<Vec<(String, UpdateExpr)>> {
		Some(vec![(
			self.column.clone(),
			UpdateExpr::Value(Value::DateTime(Utc::now())),
		)])
	}
}

/// UUID primary-key configuration.
#[derive(Debug, Clone)]
pub struct UuidConfig {
	/// One of 1, 3, 4 or 5.
	pub version: u8,
	/// Namespace for v3/v5.
	pub namespace: Option<Uuid>,
	/// Name hashed for v3/v5.
	pub name: Option<String>,
}

impl Default for UuidConfig {
	fn default() -> Self {
		Self {
			version: 4,
			namespace: None,
			name: None,
		}
	}
}

impl UuidConfig {
	/// Generate a key according to the configured version.
	pub fn generate(&self) -> Result<Uuid> {
		match self.version {
			1 => {
				let timestamp = uuid::Timestamp::now(uuid::NoContext);
				Ok(Uuid::new_v1(timestamp, &[0, 0, 0, 0, 0, 0]))
			}
			3 | 5 => {
				let namespace = self.namespace.unwrap_or(Uuid::NAMESPACE_DNS);
				let name = self.name.as_deref().unwrap_or("");
				if self.version == 3 {
					Ok(Uuid::new_v3(&namespace, name.as_bytes()))
				} else {
					Ok(Uuid::new_v5(&namespace, name.as_bytes()))
				}
			}
			4 => Ok(Uuid::new_v4()),
			other => Err(OrmError::Configuration(format!(
				"unsupported uuid version {}",
				other
			))),
		}
	}
}

/// The UUID primary-key scope: fills an unset key on insert.
#[derive(Debug, Clone)]
pub struct UuidPrimaryKeyScope {
	pub primary_key: String,
	pub config: UuidConfig,
}

impl GlobalScope for UuidPrimaryKeyScope {
	fn name(&self) -> &str {
		"uuid_primary_key"
	}

	fn apply(&self, _builder: &mut Builder) {}

	fn apply_to_insert(&self, row: &mut BTreeMap<String, Value>) -> Result<()> {
		let unset = row.get(&self.primary_key).map_or(true, Value::is_null);
		if unset {
			row.insert(
				self.primary_key.clone(),
				Value::Uuid(self.config.generate()?),
			);
		}
		Ok(())
	}
}
