//! Pagination containers.

use serde_json::json;

use crate::collection::Collection;
use crate::error::Result;
use crate::model::Model;

/// Length-aware page: the main query plus a stripped `COUNT(*)`.
#[derive(Debug, Clone)]
pub struct Paginator<M: Model> {
	pub data: Collection<M>,
	pub total: u64,
	pub per_page: u64,
	pub current_page: u64,
	pub last_page: u64,
	/// 1-based index of the first row on this page, 0 when empty.
	pub from: u64,
	pub to: u64,
}

impl<M: Model> Paginator<M> {
	pub fn new(data: Collection<M>, total: u64, per_page: u64, current_page: u64) -> Self {
		let last_page = if per_page == 0 {
			1
		} else {
			total.div_ceil(per_page).max(1)
		};
		let offset = per_page * current_page.saturating_sub(1);
		let (from, to) = if data.is_empty() {
			(0, 0)
		} else {
			(offset + 1, offset + data.len() as u64)
		};
		Self {
			data,
			total,
			per_page,
			current_page,
			last_page,
			from,
			to,
		}
	}

	pub fn serialize(&self) -> Result<serde_json::Value> {
		Ok(json!({
			"data": self.data.serialize()?,
			"total": self.total,
			"per_page": self.per_page,
			"current_page": self.current_page,
			"last_page": self.last_page,
			"from": self.from,
			"to": self.to,
		}))
	}
}

/// Cheap page: fetches one extra row instead of counting.
#[derive(Debug, Clone)]
pub struct SimplePaginator<M: Model> {
	pub data: Collection<M>,
	pub per_page: u64,
	pub current_page: u64,
	pub has_more: bool,
}

impl<M: Model> SimplePaginator<M> {
	pub fn serialize(&self) -> Result<serde_json::Value> {
		Ok(json!({
			"data": self.data.serialize()?,
			"per_page": self.per_page,
			"current_page": self.current_page,
			"has_more": self.has_more,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::Model;
	use crate::test_models::PlainUser;

	#[test]
	fn test_paginator_window_math() {
		let data: Collection<PlainUser> =
			Collection::new(vec![PlainUser::new(), PlainUser::new(), PlainUser::new()]);
		let page = Paginator::new(data, 10, 3, 2);
		assert_eq!(page.last_page, 4);
		assert_eq!(page.from, 4);
		assert_eq!(page.to, 6);
	}

	#[test]
	fn test_empty_page_has_zero_window() {
		let page: Paginator<PlainUser> = Paginator::new(Collection::empty(), 0, 10, 1);
		assert_eq!(page.last_page, 1);
		assert_eq!(page.from, 0);
		assert_eq!(page.to, 0);
	}
}
