//! Model-layer errors.

use mortar_connection::ConnectionError;
use mortar_query::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrmError {
	#[error(transparent)]
	Connection(#[from] ConnectionError),

	#[error(transparent)]
	Compile(#[from] QueryError),

	#[error("no {model} found with key {key}")]
	ModelNotFound { model: String, key: String },

	#[error("configuration error: {0}")]
	Configuration(String),

	#[error("mass assignment of guarded attribute `{0}`")]
	MassAssignment(String),

	#[error("relationship `{0}` has not been loaded")]
	RelationshipNotLoaded(String),

	#[error("{model} has no relationship named `{relation}`")]
	UnknownRelationship { model: String, relation: String },
}

pub type Result<T> = std::result::Result<T, OrmError>;
