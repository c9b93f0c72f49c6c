//! Relationship descriptors.
//!
//! A [`Relationship`] is registered on a model's metadata under its accessor
//! name. The related side is reached through a thunk returning its metadata,
//! which breaks declaration-order cycles between mutually related models.
//! Key names are optional at registration and resolved lazily against both
//! sides' metadata, so conventions apply without eager evaluation.

use crate::inflect;
use crate::meta::ModelMeta;

/// Lazily resolves the related model's metadata.
pub type MetaThunk = fn() -> &'static ModelMeta;

#[derive(Clone)]
pub struct Relationship {
	pub name: String,
	pub kind: RelationKind,
	pub related: MetaThunk,
}

impl std::fmt::Debug for Relationship {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Relationship")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.finish()
	}
}

#[derive(Debug, Clone)]
pub enum RelationKind {
	BelongsTo {
		foreign_key: Option<String>,
		owner_key: Option<String>,
	},
	HasOne {
		foreign_key: Option<String>,
		local_key: Option<String>,
	},
	HasMany {
		foreign_key: Option<String>,
		local_key: Option<String>,
	},
	BelongsToMany(PivotConfig),
	HasOneThrough(ThroughConfig),
	HasManyThrough(ThroughConfig),
}

/// Keys and options for a many-to-many relationship.
#[derive(Debug, Clone)]
pub struct PivotConfig {
	pub pivot_table: Option<String>,
	pub foreign_pivot_key: Option<String>,
	pub related_pivot_key: Option<String>,
	pub parent_key: Option<String>,
	pub related_key: Option<String>,
	/// The pivot's own primary key, aliased into results. `None` means the
	/// pivot table has no usable key and its records cannot be individually
	/// updated.
	pub pivot_id: Option<String>,
	pub with_timestamps: bool,
	/// Extra pivot columns selected alongside the keys.
	pub with_fields: Vec<String>,
	/// Attribute the pivot record hydrates onto. Defaults to `pivot`.
	pub attribute_name: Option<String>,
}

impl Default for PivotConfig {
	fn default() -> Self {
		Self {
			pivot_table: None,
			foreign_pivot_key: None,
			related_pivot_key: None,
			parent_key: None,
			related_key: None,
			pivot_id: Some("id".to_string()),
			with_timestamps: false,
			with_fields: Vec::new(),
			attribute_name: None,
		}
	}
}

/// Keys for `has_one_through` / `has_many_through`.
#[derive(Debug, Clone)]
pub struct ThroughConfig {
	pub through: MetaThunk,
	pub foreign_key_on_intermediate: Option<String>,
	pub foreign_key_on_far: Option<String>,
	pub local_key_on_parent: Option<String>,
	pub local_key_on_intermediate: Option<String>,
}

impl Relationship {
	pub fn related_meta(&self) -> &'static ModelMeta {
		(self.related)()
	}

	/// True when loading produces a collection rather than a single model.
	pub fn is_many(&self) -> bool {
		matches!(
			self.kind,
			RelationKind::HasMany { .. }
				| RelationKind::BelongsToMany(_)
				| RelationKind::HasManyThrough(_)
		)
	}
}

/// Resolved key pair for the plain relationship shapes: `(parent side,
/// related side)` column names.
pub struct ResolvedKeys {
	/// Column read from the parent model.
	pub local: String,
	/// Column on the related table matched against it.
	pub foreign: String,
}

impl Relationship {
	/// Resolve the parent/related key columns for the non-pivot shapes.
	pub fn resolve_keys(&self, parent: &ModelMeta) -> ResolvedKeys {
		let related = self.related_meta();
		match &self.kind {
			RelationKind::BelongsTo {
				foreign_key,
				owner_key,
			} => ResolvedKeys {
				local: foreign_key
					.clone()
					.unwrap_or_else(|| inflect::foreign_key(&related.table)),
				foreign: owner_key
					.clone()
					.unwrap_or_else(|| related.primary_key.clone()),
			},
			RelationKind::HasOne {
				foreign_key,
				local_key,
			}
			| RelationKind::HasMany {
				foreign_key,
				local_key,
			} => ResolvedKeys {
				local: local_key
					.clone()
					.unwrap_or_else(|| parent.primary_key.clone()),
				foreign: foreign_key
					.clone()
					.unwrap_or_else(|| inflect::foreign_key(&parent.table)),
			},
			_ => ResolvedKeys {
				local: parent.primary_key.clone(),
				foreign: related.primary_key.clone(),
			},
		}
	}
}

/// Fully resolved pivot keys.
pub struct ResolvedPivot {
	pub pivot_table: String,
	pub foreign_pivot_key: String,
	pub related_pivot_key: String,
	pub parent_key: String,
	pub related_key: String,
	pub attribute_name: String,
}

impl PivotConfig {
	pub fn resolve(&self, parent: &ModelMeta, related: &ModelMeta) -> ResolvedPivot {
		ResolvedPivot {
			pivot_table: self
				.pivot_table
				.clone()
				.unwrap_or_else(|| inflect::pivot_table(&parent.table, &related.table)),
			foreign_pivot_key: self
				.foreign_pivot_key
				.clone()
				.unwrap_or_else(|| inflect::foreign_key(&parent.table)),
			related_pivot_key: self
				.related_pivot_key
				.clone()
				.unwrap_or_else(|| inflect::foreign_key(&related.table)),
			parent_key: self
				.parent_key
				.clone()
				.unwrap_or_else(|| parent.primary_key.clone()),
			related_key: self
				.related_key
				.clone()
				.unwrap_or_else(|| related.primary_key.clone()),
			attribute_name: self
				.attribute_name
				.clone()
				.unwrap_or_else(|| "pivot".to_string()),
		}
	}
}

/// Resolved key chain for through relationships.
pub struct ResolvedThrough {
	pub intermediate: &'static ModelMeta,
	pub foreign_key_on_intermediate: String,
	pub foreign_key_on_far: String,
	pub local_key_on_parent: String,
	pub local_key_on_intermediate: String,
}

impl ThroughConfig {
	pub fn resolve(&self, parent: &ModelMeta) -> ResolvedThrough {
		let intermediate = (self.through)();
		ResolvedThrough {
			intermediate,
			foreign_key_on_intermediate: self
				.foreign_key_on_intermediate
				.clone()
				.unwrap_or_else(|| inflect::foreign_key(&parent.table)),
			foreign_key_on_far: self
				.foreign_key_on_far
				.clone()
				.unwrap_or_else(|| inflect::foreign_key(&intermediate.table)),
			local_key_on_parent: self
				.local_key_on_parent
				.clone()
				.unwrap_or_else(|| parent.primary_key.clone()),
			local_key_on_intermediate: self
				.local_key_on_intermediate
				.clone()
				.unwrap_or_else(|| intermediate.primary_key.clone()),
		}
	}
}
