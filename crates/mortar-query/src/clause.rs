//! Clause value objects.
//!
//! Every node here is plain data: builders accumulate clauses, grammars walk
//! them. Nothing in this module produces SQL on its own, and clause lists are
//! never shared between emitted queries.

use crate::builder::Builder;
use crate::types::{AggregateFunction, Boolean, JoinKind, Operator, OrderDirection};
use crate::value::{Value, Values};

/// A verbatim SQL fragment with optional bindings.
#[derive(Debug, Clone, Default)]
pub struct Raw {
	pub sql: String,
	pub bindings: Values,
}

impl Raw {
	pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
		Self {
			sql: sql.into(),
			bindings: Values::from(bindings),
		}
	}
}

/// One entry in the select list.
#[derive(Debug, Clone)]
pub enum SelectColumn {
	/// A plain column, possibly `table.column`, possibly aliased.
	Column { name: String, alias: Option<String> },
	/// A correlated subquery projected under an alias.
	Subquery { query: Box<Builder>, alias: String },
	Raw(Raw),
}

impl SelectColumn {
	/// Parse `"name as alias"` select syntax, splitting once on a
	/// case-insensitive ` as `.
	pub fn parse(input: &str) -> Self {
		let lower = input.to_ascii_lowercase();
		if let Some(pos) = lower.find(" as ") {
			let name = input[..pos].trim().to_string();
			let alias = input[pos + 4..].trim().to_string();
			SelectColumn::Column {
				name,
				alias: Some(alias),
			}
		} else {
			SelectColumn::Column {
				name: input.trim().to_string(),
				alias: None,
			}
		}
	}
}

/// The shapes a WHERE predicate can take.
#[derive(Debug, Clone)]
pub enum WhereCondition {
	Basic {
		column: String,
		operator: Operator,
		value: Value,
	},
	/// `column IS [NOT] NULL`
	Null { column: String, negated: bool },
	/// `column [NOT] IN (v, v, ...)`; an empty list short-circuits.
	In {
		column: String,
		values: Vec<Value>,
		negated: bool,
	},
	/// `column [NOT] IN (select ...)`
	InSub {
		column: String,
		query: Box<Builder>,
		negated: bool,
	},
	/// `column [NOT] BETWEEN low AND high`
	Between {
		column: String,
		low: Value,
		high: Value,
		negated: bool,
	},
	/// `first op second` comparing two columns.
	Column {
		first: String,
		operator: Operator,
		second: String,
	},
	/// `[NOT] EXISTS (select ...)`
	Exists { query: Box<Builder>, negated: bool },
	/// `column op (select ...)`
	Sub {
		column: String,
		operator: Operator,
		query: Box<Builder>,
	},
	/// A parenthesized group built by a closure.
	Nested { wheres: Vec<WhereClause> },
	Raw(Raw),
}

/// A WHERE predicate plus its connector to the previous one.
///
/// The first clause in a list drops its connector at compile time.
#[derive(Debug, Clone)]
pub struct WhereClause {
	pub boolean: Boolean,
	pub condition: WhereCondition,
}

/// A HAVING predicate.
#[derive(Debug, Clone)]
pub enum HavingClause {
	Basic {
		boolean: Boolean,
		column: String,
		operator: Operator,
		value: Value,
	},
	Raw { boolean: Boolean, raw: Raw },
}

/// One ORDER BY entry.
#[derive(Debug, Clone)]
pub enum OrderClause {
	Column {
		column: String,
		direction: OrderDirection,
	},
	Raw(Raw),
}

/// One GROUP BY entry.
#[derive(Debug, Clone)]
pub enum GroupClause {
	Column(String),
	Raw(Raw),
}

/// An ON predicate inside a join.
#[derive(Debug, Clone)]
pub struct OnCondition {
	pub boolean: Boolean,
	pub first: String,
	pub operator: Operator,
	pub second: String,
}

/// A JOIN clause; extra `wheres` compile as additional ON predicates.
#[derive(Debug, Clone)]
pub struct JoinClause {
	pub kind: JoinKind,
	pub table: String,
	pub alias: Option<String>,
	pub on: Vec<OnCondition>,
	pub wheres: Vec<WhereClause>,
}

impl JoinClause {
	pub fn new(kind: JoinKind, table: impl Into<String>) -> Self {
		Self {
			kind,
			table: table.into(),
			alias: None,
			on: Vec::new(),
			wheres: Vec::new(),
		}
	}

	pub fn on(
		mut self,
		first: impl Into<String>,
		operator: Operator,
		second: impl Into<String>,
	) -> Self {
		self.on.push(OnCondition {
			boolean: Boolean::And,
			first: first.into(),
			operator,
			second: second.into(),
		});
		self
	}

	pub fn or_on(
		mut self,
		first: impl Into<String>,
		operator: Operator,
		second: impl Into<String>,
	) -> Self {
		self.on.push(OnCondition {
			boolean: Boolean::Or,
			first: first.into(),
			operator,
			second: second.into(),
		});
		self
	}

	/// Add a constant predicate, appended to the ON clause with AND.
	pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
		self.wheres.push(WhereClause {
			boolean: Boolean::And,
			condition: WhereCondition::Basic {
				column: column.into(),
				operator: Operator::Eq,
				value: value.into(),
			},
		});
		self
	}

	pub fn where_null(mut self, column: impl Into<String>) -> Self {
		self.wheres.push(WhereClause {
			boolean: Boolean::And,
			condition: WhereCondition::Null {
				column: column.into(),
				negated: false,
			},
		});
		self
	}
}

/// The aggregate head of a SELECT. When set, it replaces the column list.
#[derive(Debug, Clone)]
pub struct AggregateClause {
	pub function: AggregateFunction,
	pub column: String,
	pub alias: Option<String>,
}

/// A column=value assignment in an UPDATE.
#[derive(Debug, Clone)]
pub enum UpdateExpr {
	Value(Value),
	/// Verbatim right-hand side, e.g. `` `votes` + 1 `` for increments.
	Raw(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_select_column_parses_alias() {
		match SelectColumn::parse("email AS contact") {
			SelectColumn::Column { name, alias } => {
				assert_eq!(name, "email");
				assert_eq!(alias.as_deref(), Some("contact"));
			}
			other => panic!("unexpected column: {:?}", other),
		}
	}

	#[test]
	fn test_select_column_without_alias() {
		match SelectColumn::parse("users.email") {
			SelectColumn::Column { name, alias } => {
				assert_eq!(name, "users.email");
				assert!(alias.is_none());
			}
			other => panic!("unexpected column: {:?}", other),
		}
	}

	#[test]
	fn test_join_clause_accumulates_on_conditions() {
		let join = JoinClause::new(JoinKind::Left, "profiles")
			.on("users.id", Operator::Eq, "profiles.user_id")
			.where_eq("profiles.active", 1);
		assert_eq!(join.on.len(), 1);
		assert_eq!(join.wheres.len(), 1);
	}
}
