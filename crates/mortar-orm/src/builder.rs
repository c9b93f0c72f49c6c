//! The executing query builder for models.
//!
//! [`ModelQuery`] wraps the pure [`Builder`] with everything the model layer
//! adds: global scopes (soft deletes, user scopes), default selects and eager
//! loads, mass-assignment filtering, lifecycle events, timestamps, and the
//! terminal operations that actually hit a connection and hydrate models.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use mortar_connection::{resolver as global_resolver, ConnectionResolver};
use mortar_query::{
	AggregateFunction, Builder, JoinClause, JoinKind, Operator, UpdateExpr, Value, Values,
};

use crate::collection::Collection;
use crate::eager::{apply_related_scopes, EagerLoader};
use crate::error::{OrmError, Result};
use crate::events::{self, EventResult, ModelEvent};
use crate::model::Model;
use crate::pagination::{Paginator, SimplePaginator};
use crate::relations::RelationKind;
use crate::scope::{TrashMode, SOFT_DELETE_SCOPE};

/// Handle to either the process-wide resolver or an injected one.
#[derive(Clone, Default)]
pub enum ResolverHandle {
	#[default]
	Global,
	Injected(Arc<ConnectionResolver>),
}

impl ResolverHandle {
	pub fn get(&self) -> &ConnectionResolver {
		match self {
			ResolverHandle::Global => global_resolver(),
			ResolverHandle::Injected(resolver) => resolver,
		}
	}
}

#[derive(Clone)]
pub struct ModelQuery<M: Model> {
	builder: Builder,
	resolver: ResolverHandle,
	connection: Option<String>,
	eager: Vec<String>,
	removed_scopes: HashSet<String>,
	trash_mode: TrashMode,
	timestamps_enabled: bool,
	force: bool,
	_model: PhantomData<M>,
}

impl<M: Model> Default for ModelQuery<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M: Model> ModelQuery<M> {
	pub fn new() -> Self {
		let meta = M::meta();
		events::boot_once(meta.name);
		Self {
			builder: Builder::table(meta.table.clone()),
			resolver: ResolverHandle::Global,
			connection: meta.connection.clone(),
			eager: meta.eager_loads.clone(),
			removed_scopes: HashSet::new(),
			trash_mode: TrashMode::default(),
			timestamps_enabled: true,
			force: false,
			_model: PhantomData,
		}
	}

	/// Use an explicit resolver instead of the process-wide one.
	pub fn on_resolver(mut self, resolver: Arc<ConnectionResolver>) -> Self {
		self.resolver = ResolverHandle::Injected(resolver);
		self
	}

	pub fn on_connection(&mut self, name: impl Into<String>) -> &mut Self {
		self.connection = Some(name.into());
		self
	}

	/// Direct access to the underlying clause builder.
	pub fn builder(&mut self) -> &mut Builder {
		&mut self.builder
	}

	fn connection_name(&self) -> Option<&str> {
		self.connection.as_deref()
	}

	fn grammar(&self) -> Result<&'static dyn mortar_query::Grammar> {
		Ok(self.resolver.get().grammar(self.connection_name())?)
	}

	// ---- fluent passthroughs -----------------------------------------

	pub fn select<I, S>(&mut self, columns: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.builder.select(columns);
		self
	}

	pub fn distinct(&mut self) -> &mut Self {
		self.builder.distinct();
		self
	}

	pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.builder.where_eq(column, value);
		self
	}

	pub fn or_where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.builder.or_where_eq(column, value);
		self
	}

	pub fn where_op(
		&mut self,
		column: impl Into<String>,
		operator: &str,
		value: impl Into<Value>,
	) -> Result<&mut Self> {
		self.builder.where_op(column, operator, value)?;
		Ok(self)
	}

	pub fn where_like(&mut self, column: impl Into<String>, pattern: impl Into<Value>) -> &mut Self {
		self.builder.where_like(column, pattern);
		self
	}

	pub fn where_not_like(
		&mut self,
		column: impl Into<String>,
		pattern: impl Into<Value>,
	) -> &mut Self {
		self.builder.where_not_like(column, pattern);
		self
	}

	pub fn where_column(
		&mut self,
		first: impl Into<String>,
		second: impl Into<String>,
	) -> &mut Self {
		self.builder.where_column(first, second);
		self
	}

	pub fn where_exists<F>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		self.builder.where_exists(f);
		self
	}

	pub fn where_null(&mut self, column: impl Into<String>) -> &mut Self {
		self.builder.where_null(column);
		self
	}

	pub fn where_not_null(&mut self, column: impl Into<String>) -> &mut Self {
		self.builder.where_not_null(column);
		self
	}

	pub fn where_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		self.builder.where_in(column, values);
		self
	}

	pub fn where_not_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		self.builder.where_not_in(column, values);
		self
	}

	pub fn where_between(
		&mut self,
		column: impl Into<String>,
		low: impl Into<Value>,
		high: impl Into<Value>,
	) -> &mut Self {
		self.builder.where_between(column, low, high);
		self
	}

	pub fn where_nested<F>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		self.builder.where_nested(f);
		self
	}

	pub fn where_raw(&mut self, sql: impl Into<String>, bindings: Vec<Value>) -> &mut Self {
		self.builder.where_raw(sql, bindings);
		self
	}

	pub fn when<F>(&mut self, condition: bool, f: F) -> &mut Self
	where
		F: FnOnce(&mut Builder),
	{
		self.builder.when(condition, f);
		self
	}

	pub fn order_by(&mut self, column: impl Into<String>, direction: &str) -> &mut Self {
		self.builder.order_by(column, direction);
		self
	}

	pub fn order_by_raw(&mut self, sql: impl Into<String>) -> &mut Self {
		self.builder.order_by_raw(sql);
		self
	}

	pub fn select_raw(&mut self, sql: impl Into<String>) -> &mut Self {
		self.builder.select_raw(sql);
		self
	}

	pub fn group_by_raw(&mut self, sql: impl Into<String>) -> &mut Self {
		self.builder.group_by_raw(sql);
		self
	}

	pub fn having_raw(&mut self, sql: impl Into<String>, bindings: Vec<Value>) -> &mut Self {
		self.builder.having_raw(sql, bindings);
		self
	}

	pub fn group_by(&mut self, column: impl Into<String>) -> &mut Self {
		self.builder.group_by(column);
		self
	}

	pub fn having_op(
		&mut self,
		column: impl Into<String>,
		operator: &str,
		value: impl Into<Value>,
	) -> Result<&mut Self> {
		self.builder.having_op(column, operator, value)?;
		Ok(self)
	}

	pub fn limit(&mut self, limit: u64) -> &mut Self {
		self.builder.limit(limit);
		self
	}

	pub fn offset(&mut self, offset: u64) -> &mut Self {
		self.builder.offset(offset);
		self
	}

	pub fn lock_for_update(&mut self) -> &mut Self {
		self.builder.lock_for_update();
		self
	}

	pub fn lock_in_share_mode(&mut self) -> &mut Self {
		self.builder.lock_in_share_mode();
		self
	}

	// ---- scopes & eager specs ----------------------------------------

	/// Register eager-load paths (`"phone"`, `"phone.contacts"`).
	pub fn with<I, S>(&mut self, paths: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for path in paths {
			let path = path.into();
			if !self.eager.contains(&path) {
				self.eager.push(path);
			}
		}
		self
	}

	/// Project a correlated `COUNT` of a relationship as `<name>_count`.
	pub fn with_count(&mut self, name: &str) -> Result<&mut Self> {
		self.with_count_where(name, |_| {})
	}

	/// `with_count` with extra predicates applied inside the subquery.
	pub fn with_count_where<F>(&mut self, name: &str, filter: F) -> Result<&mut Self>
	where
		F: FnOnce(&mut Builder),
	{
		let meta = M::meta();
		let relationship =
			meta.relationship(name)
				.ok_or_else(|| OrmError::UnknownRelationship {
					model: meta.name.to_string(),
					relation: name.to_string(),
				})?;
		let related_meta = relationship.related_meta();
		let keys = relationship.resolve_keys(meta);
		let parent_table = meta.table.clone();
		let related_table = related_meta.table.clone();
		self.builder.add_select(format!("{}_count", name), |sub| {
			sub.from(related_table.clone());
			sub.set_aggregate(AggregateFunction::Count, "*");
			sub.where_column(
				format!("{}.{}", related_table, keys.foreign),
				format!("{}.{}", parent_table, keys.local),
			);
			apply_related_scopes(sub, related_meta);
			filter(sub);
		});
		Ok(self)
	}

	/// Disable a named global scope for this query.
	pub fn without_global_scope(&mut self, name: &str) -> &mut Self {
		self.removed_scopes.insert(name.to_string());
		if name == SOFT_DELETE_SCOPE {
			self.trash_mode = TrashMode::WithTrashed;
		}
		self
	}

	pub fn with_trashed(&mut self) -> &mut Self {
		self.trash_mode = TrashMode::WithTrashed;
		self
	}

	pub fn only_trashed(&mut self) -> &mut Self {
		self.trash_mode = TrashMode::OnlyTrashed;
		self
	}

	/// Invoke a registered local scope by name.
	pub fn scope(&mut self, name: &str, args: &[Value]) -> Result<&mut Self> {
		let meta = M::meta();
		let scope = meta.local_scopes.get(name).ok_or_else(|| {
			OrmError::Configuration(format!("{} has no scope named `{}`", meta.name, name))
		})?;
		scope(&mut self.builder, args);
		Ok(self)
	}

	/// Toggle `updated_at` maintenance for this query. An explicit call
	/// here wins over the model's force-update flag.
	pub fn activate_timestamps(&mut self, enabled: bool) -> &mut Self {
		self.timestamps_enabled = enabled;
		self
	}

	/// Force writes through the dirty check.
	pub fn force(&mut self) -> &mut Self {
		self.force = true;
		self
	}

	/// Join a named relationship using its key pair.
	pub fn joins(&mut self, name: &str, kind: JoinKind) -> Result<&mut Self> {
		let meta = M::meta();
		let relationship =
			meta.relationship(name)
				.ok_or_else(|| OrmError::UnknownRelationship {
					model: meta.name.to_string(),
					relation: name.to_string(),
				})?;
		let related_meta = relationship.related_meta();
		match &relationship.kind {
			RelationKind::BelongsToMany(config) => {
				let pivot = config.resolve(meta, related_meta);
				self.builder.join_clause(
					JoinClause::new(kind, pivot.pivot_table.clone()).on(
						format!("{}.{}", meta.table, pivot.parent_key),
						Operator::Eq,
						format!("{}.{}", pivot.pivot_table, pivot.foreign_pivot_key),
					),
				);
				let mut join = JoinClause::new(kind, related_meta.table.clone()).on(
					format!("{}.{}", pivot.pivot_table, pivot.related_pivot_key),
					Operator::Eq,
					format!("{}.{}", related_meta.table, pivot.related_key),
				);
				if let Some(soft_delete) = &related_meta.soft_delete {
					join = join.where_null(soft_delete.column.clone());
				}
				self.builder.join_clause(join);
			}
			RelationKind::HasOneThrough(config) | RelationKind::HasManyThrough(config) => {
				let through = config.resolve(meta);
				self.builder.join_clause(
					JoinClause::new(kind, through.intermediate.table.clone()).on(
						format!("{}.{}", meta.table, through.local_key_on_parent),
						Operator::Eq,
						format!(
							"{}.{}",
							through.intermediate.table, through.foreign_key_on_intermediate
						),
					),
				);
				let mut join = JoinClause::new(kind, related_meta.table.clone()).on(
					format!(
						"{}.{}",
						through.intermediate.table, through.local_key_on_intermediate
					),
					Operator::Eq,
					format!("{}.{}", related_meta.table, through.foreign_key_on_far),
				);
				if let Some(soft_delete) = &related_meta.soft_delete {
					join = join.where_null(soft_delete.column.clone());
				}
				self.builder.join_clause(join);
			}
			_ => {
				let keys = relationship.resolve_keys(meta);
				let mut join = JoinClause::new(kind, related_meta.table.clone()).on(
					format!("{}.{}", meta.table, keys.local),
					Operator::Eq,
					format!("{}.{}", related_meta.table, keys.foreign),
				);
				if let Some(soft_delete) = &related_meta.soft_delete {
					join = join.where_null(soft_delete.column.clone());
				}
				self.builder.join_clause(join);
			}
		}
		Ok(self)
	}

	// ---- compilation --------------------------------------------------

	/// The builder with every applicable scope folded in. The soft-delete
	/// scope additionally answers to the query's trash mode: disabled for
	/// `with_trashed`, inverted for `only_trashed`.
	fn scoped_builder(&self) -> Builder {
		let meta = M::meta();
		let mut builder = self.builder.clone();
		if builder.columns.is_empty() && !meta.selects.is_empty() {
			builder.select(meta.selects.clone());
		}
		for scope in &meta.global_scopes {
			if self.removed_scopes.contains(scope.name()) {
				continue;
			}
			if scope.name() == SOFT_DELETE_SCOPE {
				match self.trash_mode {
					TrashMode::WithoutTrashed => scope.apply(&mut builder),
					TrashMode::WithTrashed => {}
					TrashMode::OnlyTrashed => {
						if let Some(soft_delete) = &meta.soft_delete {
							builder.where_not_null(soft_delete.column.clone());
						}
					}
				}
				continue;
			}
			scope.apply(&mut builder);
		}
		builder
	}

	/// Compile the scoped SELECT with bindings interpolated, for debugging.
	pub fn to_sql(&self) -> Result<String> {
		Ok(self.scoped_builder().to_sql(self.grammar()?)?)
	}

	/// Compile the scoped SELECT to placeholder SQL plus bindings, resetting
	/// the accumulated clauses.
	pub fn to_qmark(&mut self) -> Result<(String, Values)> {
		let grammar = self.grammar()?;
		let compiled = grammar.compile_select(&self.scoped_builder())?;
		self.builder.reset();
		Ok(compiled)
	}

	// ---- terminal reads ----------------------------------------------

	/// Execute and hydrate, running eager loads.
	pub fn get(&self) -> Result<Collection<M>> {
		let meta = M::meta();
		let grammar = self.grammar()?;
		let builder = self.scoped_builder();
		let (sql, bindings) = grammar.compile_select(&builder)?;
		let rows = self
			.resolver
			.get()
			.select(&sql, &bindings, self.connection_name())?;
		let mut models: Vec<M> = rows.into_iter().map(M::hydrate).collect();

		if !self.eager.is_empty() {
			let mut datas: Vec<&mut crate::data::ModelData> =
				models.iter_mut().map(|m| m.data_mut()).collect();
			EagerLoader::new(self.resolver.get(), self.connection_name()).load(
				&mut datas,
				meta,
				&self.eager,
			)?;
		}
		Ok(Collection::new(models))
	}

	/// Everything the scopes allow.
	pub fn all(&self) -> Result<Collection<M>> {
		self.get()
	}

	pub fn first(&self) -> Result<Option<M>> {
		let mut limited = self.clone();
		limited.builder.limit(1);
		Ok(limited.get()?.into_inner().into_iter().next())
	}

	pub fn first_or_fail(&self) -> Result<M> {
		self.first()?.ok_or_else(|| OrmError::ModelNotFound {
			model: M::meta().name.to_string(),
			key: "<first>".to_string(),
		})
	}

	pub fn find(&self, id: impl Into<Value>) -> Result<Option<M>> {
		let id = id.into();
		let mut query = self.clone();
		query
			.builder
			.where_eq(M::meta().primary_key.clone(), id);
		query.first()
	}

	pub fn find_many<I, V>(&self, ids: I) -> Result<Collection<M>>
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		let mut query = self.clone();
		query.builder.where_in(M::meta().primary_key.clone(), ids);
		query.get()
	}

	pub fn find_or_fail(&self, id: impl Into<Value>) -> Result<M> {
		let id = id.into();
		let key = id.key_string();
		self.find(id)?.ok_or_else(|| OrmError::ModelNotFound {
			model: M::meta().name.to_string(),
			key,
		})
	}

	// ---- aggregates --------------------------------------------------

	fn aggregate(&self, function: AggregateFunction, column: &str) -> Result<Value> {
		let grammar = self.grammar()?;
		let mut builder = self.scoped_builder();
		builder.columns.clear();
		builder.orders.clear();
		builder.limit = None;
		builder.offset = None;
		builder.set_aggregate(function, column);
		let (sql, bindings) = grammar.compile_select(&builder)?;
		let rows = self
			.resolver
			.get()
			.select(&sql, &bindings, self.connection_name())?;
		Ok(rows
			.first()
			.and_then(|row| row.get("aggregate").cloned())
			.unwrap_or(Value::Null))
	}

	pub fn count(&self) -> Result<u64> {
		match self.aggregate(AggregateFunction::Count, "*")? {
			Value::Int(n) => Ok(n.max(0) as u64),
			Value::String(s) => Ok(s.parse().unwrap_or(0)),
			_ => Ok(0),
		}
	}

	pub fn sum(&self, column: &str) -> Result<Value> {
		self.aggregate(AggregateFunction::Sum, column)
	}

	pub fn avg(&self, column: &str) -> Result<Value> {
		self.aggregate(AggregateFunction::Avg, column)
	}

	pub fn min(&self, column: &str) -> Result<Value> {
		self.aggregate(AggregateFunction::Min, column)
	}

	pub fn max(&self, column: &str) -> Result<Value> {
		self.aggregate(AggregateFunction::Max, column)
	}

	// ---- pagination --------------------------------------------------

	pub fn paginate(&self, per_page: u64, page: u64) -> Result<Paginator<M>> {
		let page = page.max(1);
		let total = self.count()?;
		let mut window = self.clone();
		window.builder.limit(per_page);
		window.builder.offset(per_page * (page - 1));
		let data = window.get()?;
		Ok(Paginator::new(data, total, per_page, page))
	}

	/// Fetch `per_page + 1` rows; the extra row only signals another page.
	pub fn simple_paginate(&self, per_page: u64, page: u64) -> Result<SimplePaginator<M>> {
		let page = page.max(1);
		let mut window = self.clone();
		window.builder.limit(per_page + 1);
		window.builder.offset(per_page * (page - 1));
		let mut data = window.get()?;
		let has_more = data.len() as u64 > per_page;
		if has_more {
			data.pop();
		}
		Ok(SimplePaginator {
			data,
			per_page,
			current_page: page,
			has_more,
		})
	}

	/// Lazily yield collections of at most `size` rows. The caller must not
	/// mutate the source query between yields.
	pub fn chunk(&self, size: u64) -> Chunked<M> {
		Chunked {
			query: self.clone(),
			size,
			page: 0,
			done: size == 0,
		}
	}

	// ---- terminal writes ---------------------------------------------

	/// Insert one row built from mass-assignable pairs.
	pub fn create<I, S>(&self, pairs: I) -> Result<M>
	where
		I: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		let mut model = M::new();
		self.fill_model(&mut model, pairs)?;
		self.save_model(&mut model)?;
		Ok(model)
	}

	/// Insert many rows in one statement. Timestamps and UUID keys apply to
	/// every row; lifecycle events do not fire per row.
	pub fn bulk_create<I, P, S>(&self, rows: I) -> Result<Collection<M>>
	where
		I: IntoIterator<Item = P>,
		P: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		let mut models: Vec<M> = Vec::new();
		for pairs in rows {
			let mut model = M::new();
			self.fill_model(&mut model, pairs)?;
			self.prepare_insert_data(model.data_mut())?;
			models.push(model);
		}
		if models.is_empty() {
			return Ok(Collection::empty());
		}

		// The union of every row's columns, in deterministic order.
		let mut columns: Vec<String> = Vec::new();
		for model in &models {
			for column in model.data().attributes.keys() {
				if !columns.contains(column) {
					columns.push(column.clone());
				}
			}
		}
		columns.sort();
		let value_rows: Vec<Vec<Value>> = models
			.iter()
			.map(|m| {
				columns
					.iter()
					.map(|c| m.data().get_raw(c))
					.collect::<Vec<_>>()
			})
			.collect();

		let grammar = self.grammar()?;
		let (sql, bindings) =
			grammar.compile_bulk_insert(&self.builder, &columns, &value_rows)?;
		self.resolver
			.get()
			.execute(&sql, &bindings, self.connection_name())?;

		for model in &mut models {
			let data = model.data_mut();
			data.exists = true;
			data.sync_original();
		}
		Ok(Collection::new(models))
	}

	/// Bulk update every matched row. Returns the affected count.
	pub fn update<I, S>(&self, pairs: I) -> Result<u64>
	where
		I: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		let meta = M::meta();
		let mut sets: Vec<(String, UpdateExpr)> = Vec::new();
		for (column, value) in pairs {
			let column = column.into();
			if !meta.is_fillable(&column) {
				if meta.strict_mass_assignment {
					return Err(OrmError::MassAssignment(column));
				}
				continue;
			}
			let value = match meta.cast_for(&column) {
				Some(cast) => cast.set(value),
				None => value,
			};
			sets.push((column, UpdateExpr::Value(value)));
		}
		if meta.timestamps && self.timestamps_enabled {
			sets.push((
				meta.updated_at_column.clone(),
				UpdateExpr::Value(Value::DateTime(Utc::now())),
			));
		}
		if sets.is_empty() {
			return Ok(0);
		}
		self.run_update(sets)
	}

	fn run_update(&self, sets: Vec<(String, UpdateExpr)>) -> Result<u64> {
		let grammar = self.grammar()?;
		let builder = self.scoped_builder();
		let (sql, bindings) = grammar.compile_update(&builder, &sets)?;
		Ok(self
			.resolver
			.get()
			.execute(&sql, &bindings, self.connection_name())?
			.rows_affected)
	}

	/// Delete matched rows. A scope may rewrite the delete into an update
	/// (soft deletes stamp their column instead of removing the row).
	pub fn delete(&self) -> Result<u64> {
		let meta = M::meta();
		for scope in &meta.global_scopes {
			if self.removed_scopes.contains(scope.name()) {
				continue;
			}
			if let Some(sets) = scope.apply_to_delete() {
				return self.run_update(sets);
			}
		}
		self.hard_delete()
	}

	/// Delete for real, bypassing the soft-delete scope for this query.
	pub fn force_delete(&self) -> Result<u64> {
		let mut query = self.clone();
		query.removed_scopes.insert(SOFT_DELETE_SCOPE.to_string());
		query.trash_mode = TrashMode::WithTrashed;
		query.hard_delete()
	}

	fn hard_delete(&self) -> Result<u64> {
		let grammar = self.grammar()?;
		let builder = self.scoped_builder();
		let (sql, bindings) = grammar.compile_delete(&builder)?;
		Ok(self
			.resolver
			.get()
			.execute(&sql, &bindings, self.connection_name())?
			.rows_affected)
	}

	/// Un-delete matched soft-deleted rows.
	pub fn restore(&self) -> Result<u64> {
		let meta = M::meta();
		let Some(soft_delete) = &meta.soft_delete else {
			return Err(OrmError::Configuration(format!(
				"{} does not use soft deletes",
				meta.name
			)));
		};
		let mut query = self.clone();
		query.trash_mode = TrashMode::WithTrashed;
		query.run_update(vec![(
			soft_delete.column.clone(),
			UpdateExpr::Value(Value::Null),
		)])
	}

	pub fn increment(&self, column: &str, by: i64) -> Result<u64> {
		let grammar = self.grammar()?;
		let quoted = grammar.quote_path(column);
		self.run_update(vec![(
			column.to_string(),
			UpdateExpr::Raw(format!("{} + {}", quoted, by)),
		)])
	}

	pub fn decrement(&self, column: &str, by: i64) -> Result<u64> {
		let grammar = self.grammar()?;
		let quoted = grammar.quote_path(column);
		self.run_update(vec![(
			column.to_string(),
			UpdateExpr::Raw(format!("{} - {}", quoted, by)),
		)])
	}

	/// Empty the table.
	pub fn truncate(&self, disable_foreign_keys: bool) -> Result<()> {
		let meta = M::meta();
		let grammar = self.grammar()?;
		for sql in grammar.compile_truncate(&meta.table, disable_foreign_keys)? {
			self.resolver
				.get()
				.execute(&sql, &Values::new(), self.connection_name())?;
		}
		Ok(())
	}

	// ---- persistence -------------------------------------------------

	/// Mass-assign pairs through the model's fillable/guarded rules.
	pub fn fill_model<I, S>(&self, model: &mut M, pairs: I) -> Result<()>
	where
		I: IntoIterator<Item = (S, Value)>,
		S: Into<String>,
	{
		let meta = M::meta();
		for (column, value) in pairs {
			let column = column.into();
			if meta.is_fillable(&column) {
				model.set(&column, value);
			} else if meta.strict_mass_assignment {
				return Err(OrmError::MassAssignment(column));
			}
		}
		Ok(())
	}

	/// Stamp timestamps and run every scope's insert hook (UUID keys are
	/// generated there) on data about to be inserted.
	fn prepare_insert_data(&self, data: &mut crate::data::ModelData) -> Result<()> {
		let meta = M::meta();
		if meta.timestamps && self.timestamps_enabled {
			let now = Value::DateTime(Utc::now());
			if data.get_raw(&meta.created_at_column).is_null() {
				data.set_raw(meta.created_at_column.clone(), now.clone());
			}
			data.set_raw(meta.updated_at_column.clone(), now);
		}
		for scope in &meta.global_scopes {
			if !self.removed_scopes.contains(scope.name()) {
				scope.apply_to_insert(&mut data.attributes)?;
			}
		}
		Ok(())
	}

	/// Insert-or-update a model instance, firing lifecycle events.
	///
	/// Returns `false` when a `*ing` handler vetoed the write or when a
	/// clean update was skipped.
	pub fn save_model(&self, model: &mut M) -> Result<bool> {
		let meta = M::meta();
		if events::fire(meta.name, ModelEvent::Saving, model.data_mut()) == EventResult::Veto {
			return Ok(false);
		}
		let saved = if model.data().exists {
			self.perform_update(model)?
		} else {
			self.perform_insert(model)?
		};
		if saved {
			events::fire(meta.name, ModelEvent::Saved, model.data_mut());
		}
		Ok(saved)
	}

	fn perform_insert(&self, model: &mut M) -> Result<bool> {
		let meta = M::meta();
		if events::fire(meta.name, ModelEvent::Creating, model.data_mut())
			== EventResult::Veto
		{
			return Ok(false);
		}
		self.prepare_insert_data(model.data_mut())?;

		let row: Vec<(String, Value)> = model
			.data()
			.attributes
			.iter()
			.map(|(column, value)| (column.clone(), value.clone()))
			.collect();
		let grammar = self.grammar()?;
		let (sql, bindings) = grammar.compile_insert(&self.builder, &row)?;
		let result = self
			.resolver
			.get()
			.execute(&sql, &bindings, self.connection_name())?;

		let data = model.data_mut();
		if data.get_raw(&meta.primary_key).is_null() {
			if let Some(id) = result.last_insert_id {
				data.set_raw(meta.primary_key.clone(), Value::Int(id));
			}
		}
		data.exists = true;
		data.sync_original();
		events::fire(meta.name, ModelEvent::Created, model.data_mut());
		debug!(model = meta.name, "inserted");
		Ok(true)
	}

	fn perform_update(&self, model: &mut M) -> Result<bool> {
		let meta = M::meta();
		if events::fire(meta.name, ModelEvent::Updating, model.data_mut())
			== EventResult::Veto
		{
			return Ok(false);
		}

		let force = self.force || model.data().force_update || meta.force_update;
		if model.data().dirty_columns().is_empty() && !force {
			// Nothing changed; skip the statement entirely.
			return Ok(false);
		}
		if meta.timestamps && self.timestamps_enabled {
			model.data_mut().set_raw(
				meta.updated_at_column.clone(),
				Value::DateTime(Utc::now()),
			);
		}

		let data = model.data();
		let mut columns = data.dirty_columns();
		if columns.is_empty() && force {
			columns = data.attributes.keys().cloned().collect();
		}
		let sets: Vec<(String, UpdateExpr)> = columns
			.iter()
			.map(|column| (column.clone(), UpdateExpr::Value(data.get_raw(column))))
			.collect();

		let mut builder = Builder::table(meta.table.clone());
		builder.where_eq(meta.primary_key.clone(), data.get_raw(&meta.primary_key));
		let grammar = self.grammar()?;
		let (sql, bindings) = grammar.compile_update(&builder, &sets)?;
		self.resolver
			.get()
			.execute(&sql, &bindings, self.connection_name())?;

		let data = model.data_mut();
		data.sync_original();
		events::fire(meta.name, ModelEvent::Updated, data);
		Ok(true)
	}

	/// Delete one model instance, firing events and honoring soft deletes.
	pub fn delete_model(&self, model: &mut M) -> Result<bool> {
		let meta = M::meta();
		if events::fire(meta.name, ModelEvent::Deleting, model.data_mut())
			== EventResult::Veto
		{
			return Ok(false);
		}
		let mut query = self.clone();
		query.builder.where_eq(
			meta.primary_key.clone(),
			model.data().get_raw(&meta.primary_key),
		);
		query.delete()?;
		if let Some(soft_delete) = &meta.soft_delete {
			if !self.removed_scopes.contains(SOFT_DELETE_SCOPE) {
				model
					.data_mut()
					.set_raw(soft_delete.column.clone(), Value::DateTime(Utc::now()));
			} else {
				model.data_mut().exists = false;
			}
		} else {
			model.data_mut().exists = false;
		}
		model.data_mut().sync_original();
		events::fire(meta.name, ModelEvent::Deleted, model.data_mut());
		Ok(true)
	}
}

/// Lazy chunk iterator: each step runs one `LIMIT size OFFSET page·size`
/// query and stops after the first short page.
pub struct Chunked<M: Model> {
	query: ModelQuery<M>,
	size: u64,
	page: u64,
	done: bool,
}

impl<M: Model> Iterator for Chunked<M> {
	type Item = Result<Collection<M>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}
		let mut window = self.query.clone();
		window.builder.limit(self.size);
		window.builder.offset(self.size * self.page);
		self.page += 1;
		match window.get() {
			Ok(chunk) => {
				if (chunk.len() as u64) < self.size {
					self.done = true;
				}
				if chunk.is_empty() {
					None
				} else {
					Some(Ok(chunk))
				}
			}
			Err(error) => {
				self.done = true;
				Some(Err(error))
			}
		}
	}
}
