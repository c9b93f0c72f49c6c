//! Batched relationship loading.
//!
//! Given a set of parent instances and dot-separated relation paths, the
//! loader issues one query per head segment — `WHERE key IN (…)` over the
//! collected parent keys — groups the results, attaches them, and recurses
//! into the tails on the freshly loaded models. Loading N parents across K
//! path segments costs `1 + K` SELECTs, never `1 + N`.

use std::collections::HashMap;
use std::sync::OnceLock;

use mortar_connection::ConnectionResolver;
use mortar_query::{Builder, Value};

use crate::data::{LoadedRelation, ModelData, RelationValue};
use crate::error::{OrmError, Result};
use crate::meta::ModelMeta;
use crate::relations::{RelationKind, Relationship};

/// Prefix used to alias pivot columns into the related select.
const PIVOT_PREFIX: &str = "pivot__";
/// Alias carrying the grouping key in through-relationship selects.
const THROUGH_KEY: &str = "through_key";

/// Metadata attached to hydrated pivot records.
pub fn pivot_meta() -> &'static ModelMeta {
	static META: OnceLock<ModelMeta> = OnceLock::new();
	META.get_or_init(|| {
		ModelMeta::builder("Pivot")
			.table("pivot")
			.timestamps(false)
			.build()
	})
}

pub struct EagerLoader<'a> {
	resolver: &'a ConnectionResolver,
	connection: Option<&'a str>,
}

impl<'a> EagerLoader<'a> {
	pub fn new(resolver: &'a ConnectionResolver, connection: Option<&'a str>) -> Self {
		Self {
			resolver,
			connection,
		}
	}

	/// Load `paths` onto `parents`.
	pub fn load(
		&self,
		parents: &mut [&mut ModelData],
		meta: &'static ModelMeta,
		paths: &[String],
	) -> Result<()> {
		// Group `a.b.c` paths by head segment, collecting the tails.
		let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
		for path in paths {
			match path.split_once('.') {
				Some((head, tail)) => grouped
					.entry(head.to_string())
					.or_default()
					.push(tail.to_string()),
				None => {
					grouped.entry(path.clone()).or_default();
				}
			}
		}

		let mut heads: Vec<_> = grouped.into_iter().collect();
		heads.sort_by(|(a, _), (b, _)| a.cmp(b));

		for (head, tails) in heads {
			let relationship = meta.relationship(&head).ok_or_else(|| {
				OrmError::UnknownRelationship {
					model: meta.name.to_string(),
					relation: head.clone(),
				}
			})?;
			self.load_relation(parents, meta, relationship)?;

			if !tails.is_empty() {
				let related_meta = relationship.related_meta();
				let mut related: Vec<&mut ModelData> = Vec::new();
				for parent in parents.iter_mut() {
					if let Some(loaded) = parent.relations.get_mut(&head) {
						match &mut loaded.value {
							RelationValue::Null => {}
							RelationValue::One(one) => related.push(one.as_mut()),
							RelationValue::Many(many) => related.extend(many.iter_mut()),
						}
					}
				}
				self.load(&mut related, related_meta, &tails)?;
			}
		}
		Ok(())
	}

	fn load_relation(
		&self,
		parents: &mut [&mut ModelData],
		meta: &'static ModelMeta,
		relationship: &Relationship,
	) -> Result<()> {
		match &relationship.kind {
			RelationKind::BelongsTo { .. }
			| RelationKind::HasOne { .. }
			| RelationKind::HasMany { .. } => self.load_keyed(parents, meta, relationship),
			RelationKind::BelongsToMany(config) => {
				self.load_pivot(parents, meta, relationship, config)
			}
			RelationKind::HasOneThrough(config) | RelationKind::HasManyThrough(config) => {
				self.load_through(parents, meta, relationship, config)
			}
		}
	}

	/// The plain shapes: one query on the related table keyed by a single
	/// column pair.
	fn load_keyed(
		&self,
		parents: &mut [&mut ModelData],
		meta: &ModelMeta,
		relationship: &Relationship,
	) -> Result<()> {
		let related_meta = relationship.related_meta();
		let keys = relationship.resolve_keys(meta);

		let parent_keys = collect_keys(parents, &keys.local);
		if parent_keys.is_empty() {
			attach_empty(parents, relationship);
			return Ok(());
		}

		let mut query = Builder::table(related_meta.table.clone());
		query.where_in(keys.foreign.clone(), parent_keys);
		apply_related_scopes(&mut query, related_meta);

		let rows = self.run(&mut query)?;
		let mut groups: HashMap<String, Vec<ModelData>> = HashMap::new();
		for row in rows {
			let data = ModelData::from_row(row);
			let key = data.get_raw(&keys.foreign).key_string();
			groups.entry(key).or_default().push(data);
		}

		for parent in parents.iter_mut() {
			let key = parent.get_raw(&keys.local).key_string();
			let value = build_relation_value(
				groups.get(&key).cloned().unwrap_or_default(),
				relationship.is_many(),
			);
			parent.set_relation(
				relationship.name.clone(),
				LoadedRelation {
					meta: related_meta,
					value,
				},
			);
		}
		Ok(())
	}

	/// `belongs_to_many`: join through the pivot table, select the pivot's
	/// columns under an alias prefix, and hydrate them onto each related
	/// record.
	fn load_pivot(
		&self,
		parents: &mut [&mut ModelData],
		meta: &ModelMeta,
		relationship: &Relationship,
		config: &crate::relations::PivotConfig,
	) -> Result<()> {
		let related_meta = relationship.related_meta();
		let pivot = config.resolve(meta, related_meta);

		let parent_keys = collect_keys(parents, &pivot.parent_key);
		if parent_keys.is_empty() {
			attach_empty(parents, relationship);
			return Ok(());
		}

		let mut pivot_columns = vec![
			pivot.foreign_pivot_key.clone(),
			pivot.related_pivot_key.clone(),
		];
		if let Some(id_column) = &config.pivot_id {
			pivot_columns.push(id_column.clone());
		}
		if config.with_timestamps {
			pivot_columns.push("created_at".to_string());
			pivot_columns.push("updated_at".to_string());
		}
		pivot_columns.extend(config.with_fields.iter().cloned());

		let mut query = Builder::table(related_meta.table.clone());
		query.select([format!("{}.*", related_meta.table)]);
		for column in &pivot_columns {
			query.select([format!(
				"{}.{} as {}{}",
				pivot.pivot_table, column, PIVOT_PREFIX, column
			)]);
		}
		query.join(
			pivot.pivot_table.clone(),
			format!("{}.{}", related_meta.table, pivot.related_key),
			format!("{}.{}", pivot.pivot_table, pivot.related_pivot_key),
		);
		query.where_in(
			format!("{}.{}", pivot.pivot_table, pivot.foreign_pivot_key),
			parent_keys,
		);
		apply_related_scopes(&mut query, related_meta);

		let rows = self.run(&mut query)?;
		let mut groups: HashMap<String, Vec<ModelData>> = HashMap::new();
		for row in rows {
			let mut data = ModelData::from_row(row);
			let mut pivot_data = ModelData::new();
			let pivot_keys: Vec<String> = data
				.attributes
				.keys()
				.filter(|k| k.starts_with(PIVOT_PREFIX))
				.cloned()
				.collect();
			for key in pivot_keys {
				if let Some(value) = data.attributes.remove(&key) {
					data.original.remove(&key);
					pivot_data.set_raw(key[PIVOT_PREFIX.len()..].to_string(), value);
				}
			}
			pivot_data.exists = true;
			pivot_data.sync_original();

			let group_key = pivot_data.get_raw(&pivot.foreign_pivot_key).key_string();
			data.set_relation(
				pivot.attribute_name.clone(),
				LoadedRelation {
					meta: pivot_meta(),
					value: RelationValue::One(Box::new(pivot_data)),
				},
			);
			groups.entry(group_key).or_default().push(data);
		}

		for parent in parents.iter_mut() {
			let key = parent.get_raw(&pivot.parent_key).key_string();
			let value =
				build_relation_value(groups.get(&key).cloned().unwrap_or_default(), true);
			parent.set_relation(
				relationship.name.clone(),
				LoadedRelation {
					meta: related_meta,
					value,
				},
			);
		}
		Ok(())
	}

	/// `has_one_through` / `has_many_through`: a two-hop join selecting far
	/// columns plus the intermediate's parent key for grouping.
	fn load_through(
		&self,
		parents: &mut [&mut ModelData],
		meta: &ModelMeta,
		relationship: &Relationship,
		config: &crate::relations::ThroughConfig,
	) -> Result<()> {
		let far_meta = relationship.related_meta();
		let through = config.resolve(meta);

		let parent_keys = collect_keys(parents, &through.local_key_on_parent);
		if parent_keys.is_empty() {
			attach_empty(parents, relationship);
			return Ok(());
		}

		let mut query = Builder::table(far_meta.table.clone());
		query.select([
			format!("{}.*", far_meta.table),
			format!(
				"{}.{} as {}",
				through.intermediate.table, through.foreign_key_on_intermediate, THROUGH_KEY
			),
		]);
		query.join(
			through.intermediate.table.clone(),
			format!(
				"{}.{}",
				through.intermediate.table, through.local_key_on_intermediate
			),
			format!("{}.{}", far_meta.table, through.foreign_key_on_far),
		);
		query.where_in(
			format!(
				"{}.{}",
				through.intermediate.table, through.foreign_key_on_intermediate
			),
			parent_keys,
		);
		apply_related_scopes(&mut query, far_meta);

		let rows = self.run(&mut query)?;
		let mut groups: HashMap<String, Vec<ModelData>> = HashMap::new();
		for row in rows {
			let mut data = ModelData::from_row(row);
			let key = data
				.attributes
				.remove(THROUGH_KEY)
				.map(|v| v.key_string())
				.unwrap_or_default();
			data.original.remove(THROUGH_KEY);
			groups.entry(key).or_default().push(data);
		}

		for parent in parents.iter_mut() {
			let key = parent.get_raw(&through.local_key_on_parent).key_string();
			let value = build_relation_value(
				groups.get(&key).cloned().unwrap_or_default(),
				relationship.is_many(),
			);
			parent.set_relation(
				relationship.name.clone(),
				LoadedRelation {
					meta: far_meta,
					value,
				},
			);
		}
		Ok(())
	}

	fn run(&self, query: &mut Builder) -> Result<Vec<mortar_connection::Row>> {
		let grammar = self.resolver.grammar(self.connection)?;
		let (sql, bindings) = grammar.compile_select(query)?;
		Ok(self.resolver.select(&sql, &bindings, self.connection)?)
	}
}

/// Distinct non-null key values across the parents, in first-seen order.
fn collect_keys(parents: &[&mut ModelData], column: &str) -> Vec<Value> {
	let mut seen = std::collections::HashSet::new();
	let mut keys = Vec::new();
	for parent in parents {
		let value = parent.get_raw(column);
		if value.is_null() {
			continue;
		}
		if seen.insert(value.key_string()) {
			keys.push(value);
		}
	}
	keys
}

fn attach_empty(parents: &mut [&mut ModelData], relationship: &Relationship) {
	let related_meta = relationship.related_meta();
	for parent in parents.iter_mut() {
		let value = if relationship.is_many() {
			RelationValue::Many(Vec::new())
		} else {
			RelationValue::Null
		};
		parent.set_relation(
			relationship.name.clone(),
			LoadedRelation {
				meta: related_meta,
				value,
			},
		);
	}
}

fn build_relation_value(mut group: Vec<ModelData>, many: bool) -> RelationValue {
	if many {
		RelationValue::Many(group)
	} else if group.is_empty() {
		RelationValue::Null
	} else {
		RelationValue::One(Box::new(group.remove(0)))
	}
}

/// The related model's own global scoping applied to an eager query. The
/// soft-delete scope sits in the list like any other.
pub fn apply_related_scopes(query: &mut Builder, related: &ModelMeta) {
	for scope in &related.global_scopes {
		scope.apply(query);
	}
}
