//! Model metadata.
//!
//! One [`ModelMeta`] exists per model type, built once through
//! [`MetaBuilder`] and stored in a `OnceLock` static by the model's `meta()`.
//! Everything queries need to know about a model — table, keys, casts,
//! scopes, relationships, accessors — lives here, so the query and eager
//! loading machinery can work on plain data without generics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};

use crate::casts::CastType;
use crate::data::ModelData;
use crate::inflect;
use crate::relations::{PivotConfig, RelationKind, Relationship, ThroughConfig};
use crate::scope::{GlobalScope, LocalScope, SoftDeletingScope, UuidConfig, UuidPrimaryKeyScope};
use mortar_query::Value;

/// A registered accessor: derives the read value from the instance and the
/// raw attribute.
pub type Accessor = fn(&ModelData, Value) -> Value;

/// A registered mutator: shapes a written value before storage.
pub type Mutator = fn(&ModelData, Value) -> Value;

pub struct ModelMeta {
	pub name: &'static str,
	pub table: String,
	pub primary_key: String,
	pub connection: Option<String>,
	pub timestamps: bool,
	pub created_at_column: String,
	pub updated_at_column: String,
	/// Offset applied when formatting date attributes for serialization.
	pub timezone: FixedOffset,
	pub date_columns: Vec<String>,
	/// Empty means "not declared" (allow everything not guarded);
	/// a single `*` disables filtering entirely.
	pub fillable: Vec<String>,
	pub guarded: Vec<String>,
	/// Raise instead of silently dropping guarded assignments.
	pub strict_mass_assignment: bool,
	pub hidden: Vec<String>,
	pub visible: Vec<String>,
	pub appends: Vec<String>,
	pub casts: HashMap<String, CastType>,
	/// Select-list override applied to every query.
	pub selects: Vec<String>,
	/// Relationships eager-loaded by default.
	pub eager_loads: Vec<String>,
	pub force_update: bool,
	/// Typed handle to the soft-delete scope record; the same `Arc` also
	/// sits in `global_scopes`, which is what queries iterate. The handle
	/// exists so trash-mode inversion and `restore` can reach the column.
	pub soft_delete: Option<Arc<SoftDeletingScope>>,
	/// Typed handle to the UUID key scope record, mirrored in
	/// `global_scopes` the same way.
	pub uuid: Option<Arc<UuidPrimaryKeyScope>>,
	pub accessors: HashMap<String, Accessor>,
	pub mutators: HashMap<String, Mutator>,
	pub local_scopes: HashMap<String, LocalScope>,
	pub global_scopes: Vec<Arc<dyn GlobalScope>>,
	pub relationships: HashMap<String, Relationship>,
}

impl std::fmt::Debug for ModelMeta {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModelMeta")
			.field("name", &self.name)
			.field("table", &self.table)
			.field("primary_key", &self.primary_key)
			.finish()
	}
}

impl ModelMeta {
	pub fn builder(name: &'static str) -> MetaBuilder {
		MetaBuilder::new(name)
	}

	pub fn cast_for(&self, attribute: &str) -> Option<CastType> {
		self.casts.get(attribute).copied()
	}

	pub fn relationship(&self, name: &str) -> Option<&Relationship> {
		self.relationships.get(name)
	}

	pub fn is_date_column(&self, attribute: &str) -> bool {
		attribute == self.created_at_column
			|| attribute == self.updated_at_column
			|| self.date_columns.iter().any(|c| c == attribute)
			|| self
				.soft_delete
				.as_ref()
				.is_some_and(|sd| sd.column == attribute)
	}

	/// Whether `attribute` may be mass-assigned.
	pub fn is_fillable(&self, attribute: &str) -> bool {
		if self.guarded.iter().any(|g| g == attribute) {
			return false;
		}
		if self.fillable.is_empty() || self.fillable.iter().any(|f| f == "*") {
			return true;
		}
		self.fillable.iter().any(|f| f == attribute)
	}
}

pub struct MetaBuilder {
	meta: ModelMeta,
	/// Staged soft-delete column; the scope record is built in `build()`.
	soft_delete_column: Option<String>,
	/// Staged UUID config; the scope is built in `build()` once the
	/// primary key is final.
	uuid: Option<UuidConfig>,
}

impl MetaBuilder {
	pub fn new(name: &'static str) -> Self {
		Self {
			soft_delete_column: None,
			uuid: None,
			meta: ModelMeta {
				name,
				table: inflect::table_name(name),
				primary_key: "id".to_string(),
				connection: None,
				timestamps: true,
				created_at_column: "created_at".to_string(),
				updated_at_column: "updated_at".to_string(),
				timezone: Utc.fix(),
				date_columns: Vec::new(),
				fillable: Vec::new(),
				guarded: Vec::new(),
				strict_mass_assignment: false,
				hidden: Vec::new(),
				visible: Vec::new(),
				appends: Vec::new(),
				casts: HashMap::new(),
				selects: Vec::new(),
				eager_loads: Vec::new(),
				force_update: false,
				soft_delete: None,
				uuid: None,
				accessors: HashMap::new(),
				mutators: HashMap::new(),
				local_scopes: HashMap::new(),
				global_scopes: Vec::new(),
				relationships: HashMap::new(),
			},
		}
	}

	pub fn table(mut self, table: impl Into<String>) -> Self {
		self.meta.table = table.into();
		self
	}

	pub fn primary_key(mut self, key: impl Into<String>) -> Self {
		self.meta.primary_key = key.into();
		self
	}

	pub fn connection(mut self, name: impl Into<String>) -> Self {
		self.meta.connection = Some(name.into());
		self
	}

	pub fn timestamps(mut self, enabled: bool) -> Self {
		self.meta.timestamps = enabled;
		self
	}

	pub fn timezone(mut self, offset: FixedOffset) -> Self {
		self.meta.timezone = offset;
		self
	}

	pub fn date_column(mut self, column: impl Into<String>) -> Self {
		self.meta.date_columns.push(column.into());
		self
	}

	pub fn fillable<I, S>(mut self, columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.meta.fillable = columns.into_iter().map(Into::into).collect();
		self
	}

	pub fn guarded<I, S>(mut self, columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.meta.guarded = columns.into_iter().map(Into::into).collect();
		self
	}

	pub fn strict_mass_assignment(mut self) -> Self {
		self.meta.strict_mass_assignment = true;
		self
	}

	pub fn hidden<I, S>(mut self, columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.meta.hidden = columns.into_iter().map(Into::into).collect();
		self
	}

	pub fn visible<I, S>(mut self, columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.meta.visible = columns.into_iter().map(Into::into).collect();
		self
	}

	pub fn appends<I, S>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.meta.appends = attributes.into_iter().map(Into::into).collect();
		self
	}

	pub fn cast(mut self, column: impl Into<String>, cast: CastType) -> Self {
		self.meta.casts.insert(column.into(), cast);
		self
	}

	pub fn selects<I, S>(mut self, columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.meta.selects = columns.into_iter().map(Into::into).collect();
		self
	}

	pub fn eager_load<I, S>(mut self, relations: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.meta.eager_loads = relations.into_iter().map(Into::into).collect();
		self
	}

	pub fn force_update(mut self) -> Self {
		self.meta.force_update = true;
		self
	}

	/// Mix in the soft-delete scope with the default `deleted_at` column.
	pub fn soft_deletes(mut self) -> Self {
		self.soft_delete_column = Some("deleted_at".to_string());
		self
	}

	pub fn soft_deletes_column(mut self, column: impl Into<String>) -> Self {
		self.soft_delete_column = Some(column.into());
		self
	}

	/// Mix in the UUID primary-key scope.
	pub fn uuid_primary_key(mut self, config: UuidConfig) -> Self {
		self.uuid = Some(config);
		self
	}

	pub fn accessor(mut self, attribute: impl Into<String>, accessor: Accessor) -> Self {
		self.meta.accessors.insert(attribute.into(), accessor);
		self
	}

	pub fn mutator(mut self, attribute: impl Into<String>, mutator: Mutator) -> Self {
		self.meta.mutators.insert(attribute.into(), mutator);
		self
	}

	pub fn local_scope(mut self, name: impl Into<String>, scope: LocalScope) -> Self {
		self.meta.local_scopes.insert(name.into(), scope);
		self
	}

	pub fn global_scope(mut self, scope: Arc<dyn GlobalScope>) -> Self {
		self.meta.global_scopes.push(scope);
		self
	}

	// ---- relationships -----------------------------------------------

	fn relationship(mut self, name: impl Into<String>, kind: RelationKind, related: crate::relations::MetaThunk) -> Self {
		let name = name.into();
		self.meta.relationships.insert(
			name.clone(),
			Relationship {
				name,
				kind,
				related,
			},
		);
		self
	}

	pub fn belongs_to(self, name: impl Into<String>, related: crate::relations::MetaThunk) -> Self {
		self.relationship(
			name,
			RelationKind::BelongsTo {
				foreign_key: None,
				owner_key: None,
			},
			related,
		)
	}

	pub fn belongs_to_keys(
		self,
		name: impl Into<String>,
		related: crate::relations::MetaThunk,
		foreign_key: impl Into<String>,
		owner_key: impl Into<String>,
	) -> Self {
		self.relationship(
			name,
			RelationKind::BelongsTo {
				foreign_key: Some(foreign_key.into()),
				owner_key: Some(owner_key.into()),
			},
			related,
		)
	}

	pub fn has_one(self, name: impl Into<String>, related: crate::relations::MetaThunk) -> Self {
		self.relationship(
			name,
			RelationKind::HasOne {
				foreign_key: None,
				local_key: None,
			},
			related,
		)
	}

	pub fn has_one_keys(
		self,
		name: impl Into<String>,
		related: crate::relations::MetaThunk,
		foreign_key: impl Into<String>,
		local_key: impl Into<String>,
	) -> Self {
		self.relationship(
			name,
			RelationKind::HasOne {
				foreign_key: Some(foreign_key.into()),
				local_key: Some(local_key.into()),
			},
			related,
		)
	}

	pub fn has_many(self, name: impl Into<String>, related: crate::relations::MetaThunk) -> Self {
		self.relationship(
			name,
			RelationKind::HasMany {
				foreign_key: None,
				local_key: None,
			},
			related,
		)
	}

	pub fn has_many_keys(
		self,
		name: impl Into<String>,
		related: crate::relations::MetaThunk,
		foreign_key: impl Into<String>,
		local_key: impl Into<String>,
	) -> Self {
		self.relationship(
			name,
			RelationKind::HasMany {
				foreign_key: Some(foreign_key.into()),
				local_key: Some(local_key.into()),
			},
			related,
		)
	}

	pub fn belongs_to_many(
		self,
		name: impl Into<String>,
		related: crate::relations::MetaThunk,
		config: PivotConfig,
	) -> Self {
		self.relationship(name, RelationKind::BelongsToMany(config), related)
	}

	pub fn has_one_through(
		self,
		name: impl Into<String>,
		related: crate::relations::MetaThunk,
		config: ThroughConfig,
	) -> Self {
		self.relationship(name, RelationKind::HasOneThrough(config), related)
	}

	pub fn has_many_through(
		self,
		name: impl Into<String>,
		related: crate::relations::MetaThunk,
		config: ThroughConfig,
	) -> Self {
		self.relationship(name, RelationKind::HasManyThrough(config), related)
	}

	/// Finalize the metadata. The mixin behaviors become scope records in
	/// `global_scopes` here, once table and key names are settled.
	pub fn build(mut self) -> ModelMeta {
		if let Some(column) = self.soft_delete_column {
			let scope = Arc::new(SoftDeletingScope { column });
			self.meta.soft_delete = Some(scope.clone());
			self.meta.global_scopes.push(scope);
		}
		if let Some(config) = self.uuid {
			let scope = Arc::new(UuidPrimaryKeyScope {
				primary_key: self.meta.primary_key.clone(),
				config,
			});
			self.meta.uuid = Some(scope.clone());
			self.meta.global_scopes.push(scope);
		}
		self.meta
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn test_default_table_derivation() {
		let meta = ModelMeta::builder("UserProfile").build();
		assert_eq!(meta.table, "user_profiles");
		assert_eq!(meta.primary_key, "id");
		assert!(meta.timestamps);
	}

	#[test]
	fn test_guarded_wins_over_fillable() {
		let meta = ModelMeta::builder("User")
			.fillable(["name", "email"])
			.guarded(["email"])
			.build();
		assert!(meta.is_fillable("name"));
		assert!(!meta.is_fillable("email"));
		assert!(!meta.is_fillable("admin"));
	}

	#[test]
	fn test_fillable_star_disables_filtering() {
		let meta = ModelMeta::builder("User").fillable(["*"]).build();
		assert!(meta.is_fillable("anything"));
	}

	#[test]
	fn test_soft_delete_column_is_a_date() {
		let meta = ModelMeta::builder("User").soft_deletes().build();
		assert!(meta.is_date_column("deleted_at"));
		assert!(meta.is_date_column("created_at"));
		assert!(!meta.is_date_column("name"));
	}
}
