//! The active-record model trait.
//!
//! A model type owns a [`ModelData`] and points at a `'static`
//! [`ModelMeta`]; everything else — attribute access through accessors and
//! casts, mass assignment, persistence, serialization, relationship access —
//! comes as provided methods. The [`model!`] macro generates the small
//! required surface for the common case.

use std::sync::Arc;

use mortar_connection::Row;
use mortar_query::Value;

use crate::builder::ModelQuery;
use crate::collection::Collection;
use crate::data::{LoadedRelation, ModelData, RelationValue};
use crate::eager::EagerLoader;
use crate::error::{OrmError, Result};
use crate::events::{self, ModelEvent, Observer};
use crate::meta::ModelMeta;
use crate::serialize::serialize_data;

pub trait Model: Clone + Default + Sized {
	/// The per-type metadata, built once.
	fn meta() -> &'static ModelMeta;

	fn data(&self) -> &ModelData;

	fn data_mut(&mut self) -> &mut ModelData;

	fn from_data(data: ModelData) -> Self;

	// ---- construction ------------------------------------------------

	fn new() -> Self {
		Self::default()
	}

	/// Materialize an instance from a database row, firing the hydration
	/// events.
	fn hydrate(row: Row) -> Self {
		let meta = Self::meta();
		let mut data = ModelData::from_row(row);
		events::fire(meta.name, ModelEvent::Hydrating, &mut data);
		events::fire(meta.name, ModelEvent::Hydrated, &mut data);
		Self::from_data(data)
	}

	// ---- attribute access --------------------------------------------

	/// Read an attribute: a registered accessor wins, then the cast, then
	/// the raw stored value.
	fn get(&self, attribute: &str) -> Value {
		let meta = Self::meta();
		let raw = self.data().get_raw(attribute);
		if let Some(accessor) = meta.accessors.get(attribute) {
			return accessor(self.data(), raw);
		}
		match meta.cast_for(attribute) {
			Some(cast) => cast.get(raw),
			None => raw,
		}
	}

	/// Write an attribute: a registered mutator wins, then the cast's
	/// write-side coercion. Marks the model dirty.
	fn set(&mut self, attribute: &str, value: impl Into<Value>) {
		let meta = Self::meta();
		let mut value = value.into();
		if let Some(mutator) = meta.mutators.get(attribute) {
			value = mutator(self.data(), value);
		} else if let Some(cast) = meta.cast_for(attribute) {
			value = cast.set(value);
		}
		self.data_mut().set_raw(attribute, value);
	}

	/// Mass-assign through fillable/guarded filtering.
	fn fill<I, S>(&mut self, pairs: I) -> Result<()>
	where
		I: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		Self::query().fill_model(self, pairs)
	}

	fn primary_key_value(&self) -> Value {
		self.data().get_raw(&Self::meta().primary_key)
	}

	fn exists(&self) -> bool {
		self.data().exists
	}

	fn is_dirty(&self) -> bool {
		self.data().is_dirty()
	}

	fn get_original(&self, attribute: &str) -> Value {
		self.data().get_original(attribute)
	}

	/// Force the next update through the dirty check.
	fn force_update(&mut self) -> &mut Self {
		self.data_mut().force_update = true;
		self
	}

	// ---- querying ----------------------------------------------------

	fn query() -> ModelQuery<Self> {
		ModelQuery::new()
	}

	fn all() -> Result<Collection<Self>> {
		Self::query().all()
	}

	fn find(id: impl Into<Value>) -> Result<Option<Self>> {
		Self::query().find(id)
	}

	fn find_or_fail(id: impl Into<Value>) -> Result<Self> {
		Self::query().find_or_fail(id)
	}

	fn first() -> Result<Option<Self>> {
		Self::query().first()
	}

	/// Start a query with eager-load paths registered.
	fn with<I, S>(paths: I) -> ModelQuery<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut query = Self::query();
		query.with(paths);
		query
	}

	fn create<I, S>(pairs: I) -> Result<Self>
	where
		I: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		Self::query().create(pairs)
	}

	// ---- persistence -------------------------------------------------

	/// Insert or update depending on `exists`. Returns `false` when the
	/// write was vetoed or skipped clean.
	fn save(&mut self) -> Result<bool> {
		Self::query().save_model(self)
	}

	/// Merge values then save, skipping the statement when nothing is
	/// dirty (unless forced).
	fn update<I, S>(&mut self, pairs: I) -> Result<bool>
	where
		I: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		self.fill(pairs)?;
		self.save()
	}

	/// Delete this instance; a soft-deleting model is stamped instead.
	fn delete(&mut self) -> Result<bool> {
		Self::query().delete_model(self)
	}

	/// Delete for real, bypassing soft deletes.
	fn force_delete(&mut self) -> Result<bool> {
		let meta = Self::meta();
		let mut query = Self::query();
		query.without_global_scope(crate::scope::SOFT_DELETE_SCOPE);
		query.where_eq(meta.primary_key.clone(), self.primary_key_value());
		query.force_delete()?;
		self.data_mut().exists = false;
		Ok(true)
	}

	/// Un-delete a soft-deleted instance.
	fn restore(&mut self) -> Result<bool> {
		let meta = Self::meta();
		let soft_delete = meta.soft_delete.as_ref().ok_or_else(|| {
			OrmError::Configuration(format!("{} does not use soft deletes", meta.name))
		})?;
		let mut query = Self::query();
		query.with_trashed();
		query.where_eq(meta.primary_key.clone(), self.primary_key_value());
		query.restore()?;
		self.data_mut().set_raw(soft_delete.column.clone(), Value::Null);
		self.data_mut().sync_original();
		Ok(true)
	}

	/// Reload this row from the database.
	fn fresh(&self) -> Result<Self> {
		let key = self.primary_key_value();
		let display = key.key_string();
		Self::query()
			.find(key)?
			.ok_or_else(|| OrmError::ModelNotFound {
				model: Self::meta().name.to_string(),
				key: display,
			})
	}

	/// Bump `updated_at` without other changes.
	fn touch(&mut self) -> Result<bool> {
		let meta = Self::meta();
		if !meta.timestamps {
			return Ok(false);
		}
		let column = meta.updated_at_column.clone();
		self.set(&column, Value::DateTime(chrono::Utc::now()));
		self.save()
	}

	// ---- relationships -----------------------------------------------

	/// The cached relation, loading it on first access.
	fn related(&mut self, name: &str) -> Result<&LoadedRelation> {
		let meta = Self::meta();
		if !self.data().relation_loaded(name) {
			let loader_resolver = mortar_connection::resolver();
			let connection = meta.connection.as_deref();
			let data = self.data_mut();
			let mut parents = vec![data];
			EagerLoader::new(loader_resolver, connection).load(
				&mut parents,
				meta,
				&[name.to_string()],
			)?;
		}
		self.data()
			.relation(name)
			.ok_or_else(|| OrmError::RelationshipNotLoaded(name.to_string()))
	}

	/// A to-many relation as a typed collection, loading if needed.
	fn related_many<R: Model>(&mut self, name: &str) -> Result<Collection<R>> {
		let relation = self.related(name)?;
		match &relation.value {
			RelationValue::Many(datas) => Ok(Collection::new(
				datas.iter().cloned().map(R::from_data).collect(),
			)),
			RelationValue::One(data) => {
				Ok(Collection::new(vec![R::from_data((**data).clone())]))
			}
			RelationValue::Null => Ok(Collection::empty()),
		}
	}

	/// A to-one relation as a typed model, loading if needed.
	fn related_one<R: Model>(&mut self, name: &str) -> Result<Option<R>> {
		let relation = self.related(name)?;
		match &relation.value {
			RelationValue::One(data) => Ok(Some(R::from_data((**data).clone()))),
			RelationValue::Many(datas) => {
				Ok(datas.first().cloned().map(R::from_data))
			}
			RelationValue::Null => Ok(None),
		}
	}

	/// The pivot record attached by a `belongs_to_many` load.
	fn pivot(&self) -> Option<ModelData> {
		self.data().relation("pivot").and_then(|r| match &r.value {
			RelationValue::One(data) => Some((**data).clone()),
			_ => None,
		})
	}

	// ---- serialization -----------------------------------------------

	fn serialize(&self) -> Result<serde_json::Value> {
		serialize_data(self.data(), Self::meta())
	}

	fn to_json(&self) -> Result<String> {
		serde_json::to_string(&self.serialize()?)
			.map_err(|e| OrmError::Configuration(e.to_string()))
	}

	// ---- observers ---------------------------------------------------

	fn observe(observer: Arc<dyn Observer>) {
		events::observe(Self::meta().name, observer);
	}
}

/// Define a model struct and its trait plumbing in one shot.
///
/// ```
/// use mortar_orm::{model, Model, ModelMeta};
///
/// model!(Company, {
/// 	ModelMeta::builder("Company").fillable(["name"]).build()
/// });
///
/// assert_eq!(Company::meta().table, "companies");
/// ```
#[macro_export]
macro_rules! model {
	($name:ident, $meta:block) => {
		#[derive(Debug, Clone, Default)]
		pub struct $name {
			data: $crate::ModelData,
		}

		impl $crate::Model for $name {
			fn meta() -> &'static $crate::ModelMeta {
				static META: std::sync::OnceLock<$crate::ModelMeta> = std::sync::OnceLock::new();
				META.get_or_init(|| $meta)
			}

			fn data(&self) -> &$crate::ModelData {
				&self.data
			}

			fn data_mut(&mut self) -> &mut $crate::ModelData {
				&mut self.data
			}

			fn from_data(data: $crate::ModelData) -> Self {
				Self { data }
			}
		}
	};
}
