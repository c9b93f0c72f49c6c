//! Model instance state.
//!
//! [`ModelData`] is the untyped heart of every model: the attribute map as
//! last loaded, the original snapshot it is diffed against, loaded relations,
//! and the `exists` flag that decides between insert and update on save.
//! Keeping it free of generics lets hydration, eager loading and
//! serialization work uniformly across model types.

use std::collections::BTreeMap;

use mortar_connection::Row;
use mortar_query::Value;

use crate::meta::ModelMeta;

/// A loaded relationship value.
#[derive(Debug, Clone)]
pub enum RelationValue {
	Null,
	One(Box<ModelData>),
	Many(Vec<ModelData>),
}

/// A loaded relation plus the metadata of the related side, kept so
/// serialization can recurse without the compile-time type.
#[derive(Clone)]
pub struct LoadedRelation {
	pub meta: &'static ModelMeta,
	pub value: RelationValue,
}

impl std::fmt::Debug for LoadedRelation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LoadedRelation")
			.field("meta", &self.meta.name)
			.field("value", &self.value)
			.finish()
	}
}

#[derive(Debug, Clone, Default)]
pub struct ModelData {
	pub attributes: BTreeMap<String, Value>,
	/// Snapshot at hydrate or last save.
	pub original: BTreeMap<String, Value>,
	pub relations: BTreeMap<String, LoadedRelation>,
	/// True once the row is known to exist in the database.
	pub exists: bool,
	/// Per-instance override forcing updates through the dirty check.
	pub force_update: bool,
}

impl ModelData {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build instance state from a database row. The original snapshot is
	/// taken immediately, so a freshly hydrated model is never dirty.
	pub fn from_row(row: Row) -> Self {
		let attributes = row.into_columns();
		Self {
			original: attributes.clone(),
			attributes,
			relations: BTreeMap::new(),
			exists: true,
			force_update: false,
		}
	}

	pub fn get_raw(&self, attribute: &str) -> Value {
		self.attributes
			.get(attribute)
			.cloned()
			.unwrap_or(Value::Null)
	}

	pub fn set_raw(&mut self, attribute: impl Into<String>, value: Value) {
		self.attributes.insert(attribute.into(), value);
	}

	pub fn get_original(&self, attribute: &str) -> Value {
		self.original.get(attribute).cloned().unwrap_or(Value::Null)
	}

	pub fn has_attribute(&self, attribute: &str) -> bool {
		self.attributes.contains_key(attribute)
	}

	/// Columns whose value differs from the original snapshot.
	pub fn dirty_columns(&self) -> Vec<String> {
		self.attributes
			.iter()
			.filter(|(column, value)| self.original.get(*column) != Some(value))
			.map(|(column, _)| column.clone())
			.collect()
	}

	pub fn is_dirty(&self) -> bool {
		!self.dirty_columns().is_empty()
	}

	/// Re-snapshot after a successful save.
	pub fn sync_original(&mut self) {
		self.original = self.attributes.clone();
	}

	pub fn set_relation(&mut self, name: impl Into<String>, relation: LoadedRelation) {
		self.relations.insert(name.into(), relation);
	}

	pub fn relation(&self, name: &str) -> Option<&LoadedRelation> {
		self.relations.get(name)
	}

	pub fn relation_loaded(&self, name: &str) -> bool {
		self.relations.contains_key(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn test_hydrated_data_is_clean() {
		let data = ModelData::from_row(Row::from_pairs([
			("id", Value::Int(1)),
			("name", Value::String("Joe".to_string())),
		]));
		assert!(data.exists);
		assert!(!data.is_dirty());
	}

	#[test]
	fn test_dirty_after_change_clean_after_sync() {
		let mut data = ModelData::from_row(Row::from_pairs([("name", Value::String("a".into()))]));
		data.set_raw("name", Value::String("b".to_string()));
		assert!(data.is_dirty());
		assert_eq!(data.dirty_columns(), vec!["name".to_string()]);
		assert_eq!(data.get_original("name"), Value::String("a".to_string()));

		data.sync_original();
		assert!(!data.is_dirty());
		assert_eq!(data.get_original("name"), Value::String("b".to_string()));
	}

	#[test]
	fn test_new_attribute_marks_dirty() {
		let mut data = ModelData::from_row(Row::from_pairs([("id", Value::Int(1))]));
		data.set_raw("nickname", Value::String("J".to_string()));
		assert!(data.is_dirty());
	}
}
