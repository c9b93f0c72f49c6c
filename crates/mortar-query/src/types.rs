//! Operator and keyword types shared by clauses and grammars.

use crate::error::QueryError;

/// Comparison operators accepted by `where` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Eq,
	NotEq,
	Lt,
	Gt,
	Lte,
	Gte,
	Like,
	NotLike,
	Regexp,
	NotRegexp,
}

impl Operator {
	/// Parse the operator strings the fluent API accepts.
	pub fn parse(op: &str) -> Result<Self, QueryError> {
		match op.to_ascii_lowercase().as_str() {
			"=" | "==" => Ok(Operator::Eq),
			"!=" | "<>" => Ok(Operator::NotEq),
			"<" => Ok(Operator::Lt),
			">" => Ok(Operator::Gt),
			"<=" => Ok(Operator::Lte),
			">=" => Ok(Operator::Gte),
			"like" => Ok(Operator::Like),
			"not like" => Ok(Operator::NotLike),
			"regexp" => Ok(Operator::Regexp),
			"not regexp" => Ok(Operator::NotRegexp),
			other => Err(QueryError::InvalidOperator(other.to_string())),
		}
	}

	/// The ANSI spelling. `Regexp`/`NotRegexp` are dialect-specific and
	/// resolved by the grammar instead.
	pub fn as_sql(&self) -> &'static str {
		match self {
			Operator::Eq => "=",
			Operator::NotEq => "!=",
			Operator::Lt => "<",
			Operator::Gt => ">",
			Operator::Lte => "<=",
			Operator::Gte => ">=",
			Operator::Like => "LIKE",
			Operator::NotLike => "NOT LIKE",
			Operator::Regexp => "REGEXP",
			Operator::NotRegexp => "NOT REGEXP",
		}
	}

	pub fn is_regexp(&self) -> bool {
		matches!(self, Operator::Regexp | Operator::NotRegexp)
	}
}

/// The boolean connector between chained conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
	#[default]
	And,
	Or,
}

impl Boolean {
	pub fn as_sql(&self) -> &'static str {
		match self {
			Boolean::And => "AND",
			Boolean::Or => "OR",
		}
	}
}

/// JOIN flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
	Inner,
	Left,
	Right,
}

impl JoinKind {
	pub fn as_sql(&self) -> &'static str {
		match self {
			JoinKind::Inner => "INNER JOIN",
			JoinKind::Left => "LEFT JOIN",
			JoinKind::Right => "RIGHT JOIN",
		}
	}
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
	#[default]
	Asc,
	Desc,
}

impl OrderDirection {
	pub fn parse(direction: &str) -> Self {
		if direction.eq_ignore_ascii_case("desc") {
			OrderDirection::Desc
		} else {
			OrderDirection::Asc
		}
	}

	pub fn as_sql(&self) -> &'static str {
		match self {
			OrderDirection::Asc => "ASC",
			OrderDirection::Desc => "DESC",
		}
	}
}

/// Aggregate functions usable as the select head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
	Sum,
	Avg,
	Count,
	Max,
	Min,
}

impl AggregateFunction {
	pub fn as_sql(&self) -> &'static str {
		match self {
			AggregateFunction::Sum => "SUM",
			AggregateFunction::Avg => "AVG",
			AggregateFunction::Count => "COUNT",
			AggregateFunction::Max => "MAX",
			AggregateFunction::Min => "MIN",
		}
	}
}

/// Row locking requested on a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
	#[default]
	None,
	Shared,
	Update,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("=", Operator::Eq)]
	#[case("!=", Operator::NotEq)]
	#[case("<>", Operator::NotEq)]
	#[case("LIKE", Operator::Like)]
	#[case("not like", Operator::NotLike)]
	#[case("regexp", Operator::Regexp)]
	fn test_operator_parse(#[case] input: &str, #[case] expected: Operator) {
		assert_eq!(Operator::parse(input).unwrap(), expected);
	}

	#[test]
	fn test_operator_parse_rejects_unknown() {
		assert!(matches!(
			Operator::parse("~="),
			Err(QueryError::InvalidOperator(_))
		));
	}

	#[test]
	fn test_order_direction_parse_defaults_to_asc() {
		assert_eq!(OrderDirection::parse("desc"), OrderDirection::Desc);
		assert_eq!(OrderDirection::parse("anything"), OrderDirection::Asc);
	}
}
