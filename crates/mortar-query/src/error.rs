//! Query compilation errors.

use thiserror::Error;

/// Errors raised while compiling an expression tree to dialect SQL.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
	#[error("unknown operator `{0}`")]
	InvalidOperator(String),

	#[error("the {dialect} dialect does not support {feature}")]
	Unsupported {
		dialect: &'static str,
		feature: String,
	},

	#[error("query has no table; call `table()` before compiling")]
	MissingTable,
}

pub type Result<T> = std::result::Result<T, QueryError>;
