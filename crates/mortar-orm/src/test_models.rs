//! Shared model fixtures for this crate's unit tests.

use crate::meta::ModelMeta;

crate::model!(PlainUser, {
	ModelMeta::builder("PlainUser")
		.table("users")
		.fillable(["*"])
		.build()
});
