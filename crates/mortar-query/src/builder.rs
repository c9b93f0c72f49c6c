//! The fluent query builder.
//!
//! [`Builder`] accumulates clause nodes and knows nothing about connections;
//! compiling happens through a [`Grammar`](crate::grammar::Grammar) and
//! execution lives a crate up. Every mutator returns `&mut Self` so calls
//! chain off a single `let mut` binding.
//!
//! # Examples
//!
//! ```
//! use mortar_query::{Builder, MysqlGrammar};
//!
//! let mut query = Builder::table("users");
//! query.where_eq("active", 1).where_op("age", ">", 18).unwrap();
//!
//! let (sql, bindings) = query.to_qmark(&MysqlGrammar).unwrap();
//! assert_eq!(
//! 	sql,
//! 	"SELECT * FROM `users` WHERE `users`.`active` = ? AND `users`.`age` > ?"
//! );
//! assert_eq!(bindings.len(), 2);
//! ```

use crate::clause::{
	AggregateClause, GroupClause, HavingClause, JoinClause, OrderClause, Raw, SelectColumn,
	WhereClause, WhereCondition,
};
use crate::error::{QueryError, Result};
use crate::grammar::Grammar;
use crate::types::{AggregateFunction, Boolean, JoinKind, LockMode, Operator, OrderDirection};
use crate::value::{Value, Values};

#[derive(Debug, Clone, Default)]
pub struct Builder {
	pub table: Option<String>,
	pub alias: Option<String>,
	pub columns: Vec<SelectColumn>,
	pub distinct: bool,
	pub wheres: Vec<WhereClause>,
	pub joins: Vec<JoinClause>,
	pub groups: Vec<GroupClause>,
	pub havings: Vec<HavingClause>,
	pub orders: Vec<OrderClause>,
	pub limit: Option<u64>,
	pub offset: Option<u64>,
	pub aggregate: Option<AggregateClause>,
	pub lock: LockMode,
}

impl Builder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn table(table: impl Into<String>) -> Self {
		let mut builder = Self::default();
		builder.table = Some(table.into());
		builder
	}

	pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
		self.table = Some(table.into());
		self
	}

	pub fn table_as(&mut self, alias: impl Into<String>) -> &mut Self {
		self.alias = Some(alias.into());
		self
	}

	/// The identifier WHERE columns are qualified with.
	pub fn qualifier(&self) -> Option<&str> {
		self.alias.as_deref().or(self.table.as_deref())
	}

	// ---- select list -------------------------------------------------

	/// Add select columns; each accepts `"col"`, `"table.col"` or
	/// `"col as alias"`.
	pub fn select<I, S>(&mut self, columns: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for column in columns {
			self.columns.push(SelectColumn::parse(column.as_ref()));
		}
		self
	}

	pub fn select_raw(&mut self, sql: impl Into<String>) -> &mut Self {
		self.columns.push(SelectColumn::Raw(Raw::new(sql, vec![])));
		self
	}

	/// Project a correlated subquery under `alias`.
	pub fn add_select<F>(&mut self, alias: impl Into<String>, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		let mut sub = Builder::new();
		f(&mut sub);
		self.columns.push(SelectColumn::Subquery {
			query: Box::new(sub),
			alias: alias.into(),
		});
		self
	}

	pub fn distinct(&mut self) -> &mut Self {
		self.distinct = true;
		self
	}

	// ---- where family ------------------------------------------------

	fn push_where(&mut self, boolean: Boolean, condition: WhereCondition) -> &mut Self {
		self.wheres.push(WhereClause { boolean, condition });
		self
	}

	pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Basic {
				column: column.into(),
				operator: Operator::Eq,
				value: value.into(),
			},
		)
	}

	pub fn or_where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.push_where(
			Boolean::Or,
			WhereCondition::Basic {
				column: column.into(),
				operator: Operator::Eq,
				value: value.into(),
			},
		)
	}

	/// Three-argument `where` with an operator string.
	pub fn where_op(
		&mut self,
		column: impl Into<String>,
		operator: &str,
		value: impl Into<Value>,
	) -> Result<&mut Self> {
		let operator = Operator::parse(operator)?;
		Ok(self.push_where(
			Boolean::And,
			WhereCondition::Basic {
				column: column.into(),
				operator,
				value: value.into(),
			},
		))
	}

	pub fn or_where_op(
		&mut self,
		column: impl Into<String>,
		operator: &str,
		value: impl Into<Value>,
	) -> Result<&mut Self> {
		let operator = Operator::parse(operator)?;
		Ok(self.push_where(
			Boolean::Or,
			WhereCondition::Basic {
				column: column.into(),
				operator,
				value: value.into(),
			},
		))
	}

	/// Mapping form: AND-joined equalities, in iteration order.
	pub fn where_map<I, S>(&mut self, pairs: I) -> &mut Self
	where
		I: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		for (column, value) in pairs {
			self.where_eq(column, value);
		}
		self
	}

	/// Closure form: predicates added inside compile as one
	/// parenthesized group.
	pub fn where_nested<F>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		let mut sub = Builder::new();
		sub.table = self.table.clone();
		sub.alias = self.alias.clone();
		f(&mut sub);
		let wheres = sub.wheres;
		self.push_where(Boolean::And, WhereCondition::Nested { wheres })
	}

	pub fn or_where_nested<F>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		let mut sub = Builder::new();
		sub.table = self.table.clone();
		sub.alias = self.alias.clone();
		f(&mut sub);
		let wheres = sub.wheres;
		self.push_where(Boolean::Or, WhereCondition::Nested { wheres })
	}

	pub fn where_like(&mut self, column: impl Into<String>, pattern: impl Into<Value>) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Basic {
				column: column.into(),
				operator: Operator::Like,
				value: pattern.into(),
			},
		)
	}

	pub fn where_not_like(
		&mut self,
		column: impl Into<String>,
		pattern: impl Into<Value>,
	) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Basic {
				column: column.into(),
				operator: Operator::NotLike,
				value: pattern.into(),
			},
		)
	}

	pub fn where_null(&mut self, column: impl Into<String>) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Null {
				column: column.into(),
				negated: false,
			},
		)
	}

	pub fn where_not_null(&mut self, column: impl Into<String>) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Null {
				column: column.into(),
				negated: true,
			},
		)
	}

	pub fn where_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		self.push_where(
			Boolean::And,
			WhereCondition::In {
				column: column.into(),
				values: values.into_iter().map(Into::into).collect(),
				negated: false,
			},
		)
	}

	pub fn where_not_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		self.push_where(
			Boolean::And,
			WhereCondition::In {
				column: column.into(),
				values: values.into_iter().map(Into::into).collect(),
				negated: true,
			},
		)
	}

	/// `column IN (select ...)` built by a closure.
	pub fn where_in_query<F>(&mut self, column: impl Into<String>, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		let mut sub = Builder::new();
		f(&mut sub);
		self.push_where(
			Boolean::And,
			WhereCondition::InSub {
				column: column.into(),
				query: Box::new(sub),
				negated: false,
			},
		)
	}

	pub fn where_not_in_query<F>(&mut self, column: impl Into<String>, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		let mut sub = Builder::new();
		f(&mut sub);
		self.push_where(
			Boolean::And,
			WhereCondition::InSub {
				column: column.into(),
				query: Box::new(sub),
				negated: true,
			},
		)
	}

	pub fn where_between(
		&mut self,
		column: impl Into<String>,
		low: impl Into<Value>,
		high: impl Into<Value>,
	) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Between {
				column: column.into(),
				low: low.into(),
				high: high.into(),
				negated: false,
			},
		)
	}

	pub fn where_not_between(
		&mut self,
		column: impl Into<String>,
		low: impl Into<Value>,
		high: impl Into<Value>,
	) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Between {
				column: column.into(),
				low: low.into(),
				high: high.into(),
				negated: true,
			},
		)
	}

	/// Compare two columns. `where_column("a", "b")` defaults to equality;
	/// pass an operator string for anything else.
	pub fn where_column(
		&mut self,
		first: impl Into<String>,
		second: impl Into<String>,
	) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Column {
				first: first.into(),
				operator: Operator::Eq,
				second: second.into(),
			},
		)
	}

	pub fn where_column_op(
		&mut self,
		first: impl Into<String>,
		operator: &str,
		second: impl Into<String>,
	) -> Result<&mut Self> {
		let operator = Operator::parse(operator)?;
		Ok(self.push_where(
			Boolean::And,
			WhereCondition::Column {
				first: first.into(),
				operator,
				second: second.into(),
			},
		))
	}

	pub fn where_exists<F>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		let mut sub = Builder::new();
		f(&mut sub);
		self.push_where(
			Boolean::And,
			WhereCondition::Exists {
				query: Box::new(sub),
				negated: false,
			},
		)
	}

	pub fn where_not_exists<F>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		let mut sub = Builder::new();
		f(&mut sub);
		self.push_where(
			Boolean::And,
			WhereCondition::Exists {
				query: Box::new(sub),
				negated: true,
			},
		)
	}

	/// `column op (select ...)`.
	pub fn where_sub<F>(
		&mut self,
		column: impl Into<String>,
		operator: &str,
		f: F,
	) -> Result<&mut Self>
	where
		F: FnOnce(&mut Builder),
	{
		let operator = Operator::parse(operator)?;
		let mut sub = Builder::new();
		f(&mut sub);
		Ok(self.push_where(
			Boolean::And,
			WhereCondition::Sub {
				column: column.into(),
				operator,
				query: Box::new(sub),
			},
		))
	}

	pub fn where_raw(&mut self, sql: impl Into<String>, bindings: Vec<Value>) -> &mut Self {
		self.push_where(
			Boolean::And,
			WhereCondition::Raw(Raw::new(sql, bindings)),
		)
	}

	/// Apply `f` only when `condition` holds.
	pub fn when<F>(&mut self, condition: bool, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		if condition {
			f(self);
		}
		self
	}

	// ---- joins -------------------------------------------------------

	pub fn join_clause(&mut self, join: JoinClause) -> &mut Self {
		self.joins.push(join);
		self
	}

	pub fn join(
		&mut self,
		table: impl Into<String>,
		first: impl Into<String>,
		second: impl Into<String>,
	) -> &mut Self {
		self.joins
			.push(JoinClause::new(JoinKind::Inner, table).on(first, Operator::Eq, second));
		self
	}

	pub fn left_join(
		&mut self,
		table: impl Into<String>,
		first: impl Into<String>,
		second: impl Into<String>,
	) -> &mut Self {
		self.joins
			.push(JoinClause::new(JoinKind::Left, table).on(first, Operator::Eq, second));
		self
	}

	pub fn right_join(
		&mut self,
		table: impl Into<String>,
		first: impl Into<String>,
		second: impl Into<String>,
	) -> &mut Self {
		self.joins
			.push(JoinClause::new(JoinKind::Right, table).on(first, Operator::Eq, second));
		self
	}

	// ---- group / having / order -------------------------------------

	pub fn group_by(&mut self, column: impl Into<String>) -> &mut Self {
		self.groups.push(GroupClause::Column(column.into()));
		self
	}

	pub fn group_by_raw(&mut self, sql: impl Into<String>) -> &mut Self {
		self.groups.push(GroupClause::Raw(Raw::new(sql, vec![])));
		self
	}

	pub fn having(&mut self, column: impl Into<String>) -> &mut Self {
		// Bare `having(col)` compiles as `HAVING col IS NOT NULL`-style
		// presence check via raw; the common operator form is below.
		self.havings.push(HavingClause::Raw {
			boolean: Boolean::And,
			raw: Raw::new(column.into(), vec![]),
		});
		self
	}

	pub fn having_op(
		&mut self,
		column: impl Into<String>,
		operator: &str,
		value: impl Into<Value>,
	) -> Result<&mut Self> {
		let operator = Operator::parse(operator)?;
		self.havings.push(HavingClause::Basic {
			boolean: Boolean::And,
			column: column.into(),
			operator,
			value: value.into(),
		});
		Ok(self)
	}

	pub fn having_raw(&mut self, sql: impl Into<String>, bindings: Vec<Value>) -> &mut Self {
		self.havings.push(HavingClause::Raw {
			boolean: Boolean::And,
			raw: Raw::new(sql, bindings),
		});
		self
	}

	pub fn order_by(&mut self, column: impl Into<String>, direction: &str) -> &mut Self {
		self.orders.push(OrderClause::Column {
			column: column.into(),
			direction: OrderDirection::parse(direction),
		});
		self
	}

	pub fn order_by_raw(&mut self, sql: impl Into<String>) -> &mut Self {
		self.orders.push(OrderClause::Raw(Raw::new(sql, vec![])));
		self
	}

	pub fn limit(&mut self, limit: u64) -> &mut Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(&mut self, offset: u64) -> &mut Self {
		self.offset = Some(offset);
		self
	}

	// ---- aggregates / locks -----------------------------------------

	pub fn set_aggregate(
		&mut self,
		function: AggregateFunction,
		column: impl Into<String>,
	) -> &mut Self {
		self.aggregate = Some(AggregateClause {
			function,
			column: column.into(),
			alias: Some("aggregate".to_string()),
		});
		self
	}

	pub fn lock_for_update(&mut self) -> &mut Self {
		self.lock = LockMode::Update;
		self
	}

	pub fn lock_in_share_mode(&mut self) -> &mut Self {
		self.lock = LockMode::Shared;
		self
	}

	// ---- compilation -------------------------------------------------

	/// Compile with bindings interpolated as quoted literals. Debug only.
	pub fn to_sql(&self, grammar: &dyn Grammar) -> Result<String> {
		let (sql, bindings) = grammar.compile_select(self)?;
		Ok(interpolate(&sql, &bindings))
	}

	/// Compile to placeholder SQL plus the bindings vector.
	///
	/// Resets the accumulated clause state afterwards; the table name and
	/// alias survive so the builder can be reused for a follow-up query.
	pub fn to_qmark(&mut self, grammar: &dyn Grammar) -> Result<(String, Values)> {
		let compiled = grammar.compile_select(self)?;
		self.reset();
		Ok(compiled)
	}

	/// Drop all accumulated clauses, keeping the table and alias.
	pub fn reset(&mut self) {
		let table = self.table.take();
		let alias = self.alias.take();
		*self = Builder::default();
		self.table = table;
		self.alias = alias;
	}

	/// A sibling builder on the same table with no accumulated state.
	pub fn fresh(&self) -> Builder {
		let mut builder = Builder::default();
		builder.table = self.table.clone();
		builder.alias = self.alias.clone();
		builder
	}
}

/// Replace `?` placeholders with quoted literals, for `to_sql` output.
fn interpolate(sql: &str, bindings: &Values) -> String {
	let mut out = String::with_capacity(sql.len());
	let mut values = bindings.iter();
	let mut in_string = false;
	for ch in sql.chars() {
		match ch {
			'\'' => {
				in_string = !in_string;
				out.push(ch);
			}
			'?' if !in_string => match values.next() {
				Some(value) => out.push_str(&value.quoted()),
				None => out.push(ch),
			},
			_ => out.push(ch),
		}
	}
	out
}
