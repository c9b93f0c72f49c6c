//! SQL value types.
//!
//! [`Value`] is the single representation for everything that flows into a
//! bindings vector. Builders accept anything implementing `Into<Value>` and
//! grammars emit placeholders while collecting the values in clause order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value bound into a compiled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	Bytes(Vec<u8>),
	DateTime(DateTime<Utc>),
	Date(NaiveDate),
	Uuid(Uuid),
	Json(serde_json::Value),
}

impl Value {
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Render the value as an inline SQL literal.
	///
	/// Strings are single-quoted with embedded quotes doubled. This form is
	/// only used by `to_sql()` debugging output; executed queries always go
	/// through placeholders.
	pub fn quoted(&self) -> String {
		match self {
			Value::Null => "NULL".to_string(),
			Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
			Value::Int(i) => i.to_string(),
			Value::Float(f) => f.to_string(),
			Value::String(s) => format!("'{}'", s.replace('\'', "''")),
			Value::Bytes(b) => format!("X'{}'", hex_upper(b)),
			Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
			Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
			Value::Uuid(u) => format!("'{}'", u),
			Value::Json(j) => format!("'{}'", j.to_string().replace('\'', "''")),
		}
	}

	/// A canonical text form used to group rows by key value.
	///
	/// Equal keys coming back from a driver may differ in variant (an `id`
	/// may hydrate as `Int` on one row and `String` on another connection),
	/// so grouping normalizes through text.
	pub fn key_string(&self) -> String {
		match self {
			Value::Null => String::new(),
			Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
			Value::Int(i) => i.to_string(),
			Value::Float(f) => f.to_string(),
			Value::String(s) => s.clone(),
			Value::Bytes(b) => hex_upper(b),
			Value::DateTime(dt) => dt.to_rfc3339(),
			Value::Date(d) => d.to_string(),
			Value::Uuid(u) => u.to_string(),
			Value::Json(j) => j.to_string(),
		}
	}
}

fn hex_upper(bytes: &[u8]) -> String {
	bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<i8> for Value {
	fn from(i: i8) -> Self {
		Value::Int(i64::from(i))
	}
}

impl From<i16> for Value {
	fn from(i: i16) -> Self {
		Value::Int(i64::from(i))
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Value::Int(i64::from(i))
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Value::Int(i)
	}
}

impl From<u32> for Value {
	fn from(i: u32) -> Self {
		Value::Int(i64::from(i))
	}
}

impl From<u64> for Value {
	fn from(i: u64) -> Self {
		Value::Int(i as i64)
	}
}

impl From<f32> for Value {
	fn from(f: f32) -> Self {
		Value::Float(f64::from(f))
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Value::Float(f)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::String(s)
	}
}

impl From<Vec<u8>> for Value {
	fn from(b: Vec<u8>) -> Self {
		Value::Bytes(b)
	}
}

impl From<DateTime<Utc>> for Value {
	fn from(dt: DateTime<Utc>) -> Self {
		Value::DateTime(dt)
	}
}

impl From<NaiveDate> for Value {
	fn from(d: NaiveDate) -> Self {
		Value::Date(d)
	}
}

impl From<Uuid> for Value {
	fn from(u: Uuid) -> Self {
		Value::Uuid(u)
	}
}

impl From<serde_json::Value> for Value {
	fn from(j: serde_json::Value) -> Self {
		Value::Json(j)
	}
}

impl<T> From<Option<T>> for Value
where
	T: Into<Value>,
{
	fn from(opt: Option<T>) -> Self {
		match opt {
			Some(v) => v.into(),
			None => Value::Null,
		}
	}
}

/// The bindings vector produced alongside compiled SQL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Values(pub Vec<Value>);

impl Values {
	pub fn new() -> Self {
		Self(Vec::new())
	}

	pub fn push(&mut self, value: Value) {
		self.0.push(value);
	}

	pub fn extend(&mut self, other: Values) {
		self.0.extend(other.0);
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Value> {
		self.0.iter()
	}

	pub fn into_inner(self) -> Vec<Value> {
		self.0
	}
}

impl From<Vec<Value>> for Values {
	fn from(values: Vec<Value>) -> Self {
		Self(values)
	}
}

impl IntoIterator for Values {
	type Item = Value;
	type IntoIter = std::vec::IntoIter<Value>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl std::ops::Index<usize> for Values {
	type Output = Value;

	fn index(&self, index: usize) -> &Value {
		&self.0[index]
	}
}
