//! # mortar-orm
//!
//! The active-record layer of the Mortar toolkit. Models are plain structs
//! carrying a [`ModelData`] attribute store and a once-built [`ModelMeta`]
//! describing table, keys, casts, scopes and relationships; the [`Model`]
//! trait provides attribute access, dirty tracking, persistence with
//! lifecycle events, serialization, and relationship loading on top.
//!
//! ```no_run
//! use mortar_orm::{model, CastType, Model, ModelMeta};
//!
//! model!(User, {
//! 	ModelMeta::builder("User")
//! 		.fillable(["name", "email"])
//! 		.hidden(["password"])
//! 		.cast("admin", CastType::Bool)
//! 		.soft_deletes()
//! 		.build()
//! });
//!
//! # fn main() -> mortar_orm::Result<()> {
//! let users = User::query().where_eq("active", 1).get()?;
//! let mut user = User::create([("name", "Joe".into()), ("email", "joe@ex.io".into())])?;
//! user.set("name", "Joseph");
//! user.save()?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod casts;
pub mod collection;
pub mod data;
pub mod eager;
pub mod error;
pub mod events;
pub mod inflect;
pub mod meta;
pub mod model;
pub mod pagination;
pub mod relations;
pub mod scope;
pub mod serialize;

#[cfg(test)]
mod test_models;

pub use builder::{Chunked, ModelQuery, ResolverHandle};
pub use casts::CastType;
pub use collection::Collection;
pub use data::{LoadedRelation, ModelData, RelationValue};
pub use eager::EagerLoader;
pub use error::{OrmError, Result};
pub use events::{EventResult, ModelEvent, Observer};
pub use meta::{Accessor, MetaBuilder, ModelMeta, Mutator};
pub use model::Model;
pub use pagination::{Paginator, SimplePaginator};
pub use relations::{PivotConfig, RelationKind, Relationship, ThroughConfig};
pub use scope::{
	GlobalScope, LocalScope, SoftDeletingScope, TrashMode, UuidConfig, UuidPrimaryKeyScope,
	SOFT_DELETE_SCOPE,
};
