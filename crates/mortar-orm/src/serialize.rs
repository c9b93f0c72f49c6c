//! Model serialization.
//!
//! `serialize_data` turns instance state into a `serde_json::Value`:
//! attributes filtered by hidden/visible, casts applied, date columns
//! formatted ISO-8601 in the model's timezone, loaded relations recursed,
//! and appended computed attributes evaluated last.

use serde_json::{json, Map};

use mortar_query::Value;

use crate::data::{ModelData, RelationValue};
use crate::error::{OrmError, Result};
use crate::meta::ModelMeta;

/// Convert one attribute value to JSON, honoring casts and date formatting.
pub fn attribute_to_json(meta: &ModelMeta, attribute: &str, value: Value) -> serde_json::Value {
	let value = match meta.cast_for(attribute) {
		Some(cast) => cast.get(value),
		None => value,
	};
	match value {
		Value::DateTime(dt) => json!(dt.with_timezone(&meta.timezone).to_rfc3339()),
		other if meta.is_date_column(attribute) => match other {
			Value::String(s) => match crate::casts::parse_datetime(&s) {
				Some(dt) => json!(dt.with_timezone(&meta.timezone).to_rfc3339()),
				None => json!(s),
			},
			other => value_to_json(other),
		},
		other => value_to_json(other),
	}
}

pub fn value_to_json(value: Value) -> serde_json::Value {
	match value {
		Value::Null => serde_json::Value::Null,
		Value::Bool(b) => json!(b),
		Value::Int(i) => json!(i),
		Value::Float(f) => json!(f),
		Value::String(s) => json!(s),
		Value::Bytes(b) => json!(b),
		Value::DateTime(dt) => json!(dt.to_rfc3339()),
		Value::Date(d) => json!(d.to_string()),
		Value::Uuid(u) => json!(u.to_string()),
		Value::Json(j) => j,
	}
}

fn attribute_visible(meta: &ModelMeta, attribute: &str) -> bool {
	if !meta.visible.is_empty() {
		return meta.visible.iter().any(|v| v == attribute);
	}
	!meta.hidden.iter().any(|h| h == attribute)
}

/// Serialize instance state against its metadata.
///
/// Declaring both `hidden` and `visible` is a configuration error.
pub fn serialize_data(data: &ModelData, meta: &ModelMeta) -> Result<serde_json::Value> {
	if !meta.hidden.is_empty() && !meta.visible.is_empty() {
		return Err(OrmError::Configuration(format!(
			"{} declares both hidden and visible attribute sets",
			meta.name
		)));
	}

	let mut out = Map::new();
	for (attribute, value) in &data.attributes {
		if attribute_visible(meta, attribute) {
			out.insert(
				attribute.clone(),
				attribute_to_json(meta, attribute, value.clone()),
			);
		}
	}

	for (name, relation) in &data.relations {
		let serialized = match &relation.value {
			RelationValue::Null => serde_json::Value::Null,
			RelationValue::One(related) => serialize_data(related, relation.meta)?,
			RelationValue::Many(related) => serde_json::Value::Array(
				related
					.iter()
					.map(|r| serialize_data(r, relation.meta))
					.collect::<Result<Vec<_>>>()?,
			),
		};
		out.insert(name.clone(), serialized);
	}

	for appended in &meta.appends {
		if let Some(accessor) = meta.accessors.get(appended) {
			let raw = data.get_raw(appended);
			out.insert(
				appended.clone(),
				attribute_to_json(meta, appended, accessor(data, raw)),
			);
		}
	}

	Ok(serde_json::Value::Object(out))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use pretty_assertions::assert_eq;

	fn meta() -> ModelMeta {
		ModelMeta::builder("SerializeUser")
			.table("users")
			.hidden(["password"])
			.build()
	}

	#[test]
	fn test_hidden_attributes_are_omitted() {
		let meta = meta();
		let mut data = ModelData::new();
		data.set_raw("name", Value::String("Joe".to_string()));
		data.set_raw("password", Value::String("secret".to_string()));
		let out = serialize_data(&data, &meta).unwrap();
		assert_eq!(out, serde_json::json!({"name": "Joe"}));
	}

	#[test]
	fn test_hidden_and_visible_is_an_error() {
		let meta = ModelMeta::builder("Broken")
			.hidden(["a"])
			.visible(["b"])
			.build();
		let data = ModelData::new();
		assert!(matches!(
			serialize_data(&data, &meta),
			Err(OrmError::Configuration(_))
		));
	}

	#[test]
	fn test_dates_format_iso8601_with_offset() {
		let meta = meta();
		let mut data = ModelData::new();
		let dt = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
		data.set_raw("created_at", Value::DateTime(dt));
		let out = serialize_data(&data, &meta).unwrap();
		assert_eq!(
			out,
			serde_json::json!({"created_at": "2024-05-01T09:30:00+00:00"})
		);
	}

	#[test]
	fn test_date_strings_are_normalized() {
		let meta = meta();
		let mut data = ModelData::new();
		data.set_raw(
			"created_at",
			Value::String("2024-05-01 09:30:00".to_string()),
		);
		let out = serialize_data(&data, &meta).unwrap();
		assert_eq!(
			out,
			serde_json::json!({"created_at": "2024-05-01T09:30:00+00:00"})
		);
	}
}
