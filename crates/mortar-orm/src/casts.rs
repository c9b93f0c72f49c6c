//! Attribute casts.
//!
//! A cast shapes a column's value in both directions: `get` applies when the
//! attribute is read or serialized, `set` coerces what callers write before
//! it lands in the attribute map.

use chrono::{DateTime, NaiveDateTime, Utc};
use mortar_query::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
	Int,
	Float,
	Bool,
	Json,
	DateTime,
	String,
}

impl CastType {
	pub fn parse(name: &str) -> Option<Self> {
		match name {
			"int" | "integer" => Some(CastType::Int),
			"float" | "double" => Some(CastType::Float),
			"bool" | "boolean" => Some(CastType::Bool),
			"json" => Some(CastType::Json),
			"datetime" | "timestamp" => Some(CastType::DateTime),
			"str" | "string" => Some(CastType::String),
			_ => None,
		}
	}

	/// Apply the cast on read.
	pub fn get(&self, value: Value) -> Value {
		if value.is_null() {
			return Value::Null;
		}
		match self {
			CastType::Int => match value {
				Value::Int(i) => Value::Int(i),
				Value::Float(f) => Value::Int(f as i64),
				Value::Bool(b) => Value::Int(i64::from(b)),
				Value::String(s) => s.parse::<i64>().map(Value::Int).unwrap_or(Value::Null),
				other => other,
			},
			CastType::Float => match value {
				Value::Float(f) => Value::Float(f),
				Value::Int(i) => Value::Float(i as f64),
				Value::String(s) => s.parse::<f64>().map(Value::Float).unwrap_or(Value::Null),
				other => other,
			},
			CastType::Bool => Value::Bool(truthy(&value)),
			CastType::Json => match value {
				Value::Json(j) => Value::Json(j),
				Value::String(s) => serde_json::from_str(&s)
					.map(Value::Json)
					.unwrap_or(Value::Null),
				other => other,
			},
			CastType::DateTime => match value {
				Value::DateTime(dt) => Value::DateTime(dt),
				Value::String(s) => parse_datetime(&s).map(Value::DateTime).unwrap_or(Value::Null),
				other => other,
			},
			CastType::String => match value {
				Value::String(s) => Value::String(s),
				other => Value::String(other.key_string()),
			},
		}
	}

	/// Coerce the value on write.
	pub fn set(&self, value: Value) -> Value {
		match self {
			// JSON encodes to text on write so any driver can store it.
			CastType::Json => match value {
				Value::Json(j) => Value::String(j.to_string()),
				other => other,
			},
			_ => self.get(value),
		}
	}
}

/// Falsy values: `0`, `"0"`, `""`, `"false"`, `"False"` and null.
fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Int(i) => *i != 0,
		Value::Float(f) => *f != 0.0,
		Value::String(s) => !matches!(s.as_str(), "" | "0" | "false" | "False"),
		_ => true,
	}
}

pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
	if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
		return Some(dt.with_timezone(&Utc));
	}
	if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
		return Some(naive.and_utc());
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case(Value::Int(0), false)]
	#[case(Value::String("0".to_string()), false)]
	#[case(Value::String(String::new()), false)]
	#[case(Value::String("false".to_string()), false)]
	#[case(Value::String("False".to_string()), false)]
	#[case(Value::Null, false)]
	#[case(Value::Int(2), true)]
	#[case(Value::String("yes".to_string()), true)]
	fn test_bool_cast(#[case] input: Value, #[case] expected: bool) {
		assert_eq!(CastType::Bool.get(input), Value::Bool(expected));
	}

	#[test]
	fn test_int_cast_from_string() {
		assert_eq!(
			CastType::Int.get(Value::String("42".to_string())),
			Value::Int(42)
		);
	}

	#[test]
	fn test_json_cast_roundtrip() {
		let decoded = CastType::Json.get(Value::String("{\"a\":1}".to_string()));
		assert_eq!(decoded, Value::Json(serde_json::json!({"a": 1})));

		let encoded = CastType::Json.set(Value::Json(serde_json::json!({"a": 1})));
		assert_eq!(encoded, Value::String("{\"a\":1}".to_string()));
	}

	#[test]
	fn test_datetime_cast_parses_sql_format() {
		let value = CastType::DateTime.get(Value::String("2024-05-01 12:30:00".to_string()));
		match value {
			Value::DateTime(dt) => assert_eq!(dt.to_rfc3339(), "2024-05-01T12:30:00+00:00"),
			other => panic!("expected datetime, got {:?}", other),
		}
	}
}
