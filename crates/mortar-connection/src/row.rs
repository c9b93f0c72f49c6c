//! Result rows.

use std::collections::BTreeMap;

use mortar_query::Value;

/// One row from a driver, as a column → value map.
///
/// A `BTreeMap` keeps column iteration deterministic, which matters for
/// hydration snapshots and test assertions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
	columns: BTreeMap<String, Value>,
}

impl Row {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_pairs<I, S>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		Self {
			columns: pairs
				.into_iter()
				.map(|(name, value)| (name.into(), value))
				.collect(),
		}
	}

	pub fn insert(&mut self, column: impl Into<String>, value: Value) {
		self.columns.insert(column.into(), value);
	}

	pub fn get(&self, column: &str) -> Option<&Value> {
		self.columns.get(column)
	}

	pub fn remove(&mut self, column: &str) -> Option<Value> {
		self.columns.remove(column)
	}

	pub fn contains(&self, column: &str) -> bool {
		self.columns.contains_key(column)
	}

	pub fn columns(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.columns.iter()
	}

	pub fn into_columns(self) -> BTreeMap<String, Value> {
		self.columns
	}

	pub fn len(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	pub fn get_i64(&self, column: &str) -> Option<i64> {
		match self.columns.get(column)? {
			Value::Int(i) => Some(*i),
			Value::String(s) => s.parse().ok(),
			Value::Float(f) => Some(*f as i64),
			_ => None,
		}
	}

	pub fn get_f64(&self, column: &str) -> Option<f64> {
		match self.columns.get(column)? {
			Value::Float(f) => Some(*f),
			Value::Int(i) => Some(*i as f64),
			Value::String(s) => s.parse().ok(),
			_ => None,
		}
	}

	pub fn get_str(&self, column: &str) -> Option<&str> {
		match self.columns.get(column)? {
			Value::String(s) => Some(s),
			_ => None,
		}
	}
}

/// What a driver reports back for a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteResult {
	pub rows_affected: u64,
	pub last_insert_id: Option<i64>,
}

/// The result of `statement()`: rows for reads, a count for writes.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
	Rows(Vec<Row>),
	Affected(u64),
}

impl QueryResult {
	pub fn rows(self) -> Vec<Row> {
		match self {
			QueryResult::Rows(rows) => rows,
			QueryResult::Affected(_) => Vec::new(),
		}
	}

	pub fn affected(&self) -> u64 {
		match self {
			QueryResult::Rows(rows) => rows.len() as u64,
			QueryResult::Affected(count) => *count,
		}
	}
}
