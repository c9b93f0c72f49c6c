//! Eager loading: query counts, nested paths, pivot hydration and
//! relationship joins.

use std::sync::Arc;

use mortar_connection::testing::FakeDriver;
use mortar_connection::{ConnectionConfig, ConnectionDetails, ConnectionResolver, Row};
use mortar_orm::{model, Model, ModelMeta, ModelQuery, PivotConfig, ThroughConfig};
use mortar_query::{JoinKind, Value};
use pretty_assertions::assert_eq;

model!(Owner, {
	ModelMeta::builder("Owner")
		.table("users")
		.timestamps(false)
		.has_many("phones", Phone::meta)
		.has_many_through(
			"contact_logs",
			ContactLog::meta,
			ThroughConfig {
				through: Phone::meta,
				foreign_key_on_intermediate: None,
				foreign_key_on_far: None,
				local_key_on_parent: None,
				local_key_on_intermediate: None,
			},
		)
		.build()
});

model!(Phone, {
	ModelMeta::builder("Phone")
		.table("phones")
		.timestamps(false)
		.belongs_to("owner", Owner::meta)
		.has_many("contacts", Contact::meta)
		.build()
});

model!(Contact, {
	ModelMeta::builder("Contact").table("contacts").timestamps(false).build()
});

model!(ContactLog, {
	ModelMeta::builder("ContactLog").table("contact_logs").timestamps(false).build()
});

model!(Store, {
	ModelMeta::builder("Store")
		.table("stores")
		.timestamps(false)
		.belongs_to_many("products", Product::meta, PivotConfig::default())
		.build()
});

model!(Product, {
	ModelMeta::builder("Product").table("products").timestamps(false).build()
});

fn harness() -> (Arc<ConnectionResolver>, FakeDriver) {
	let resolver = Arc::new(ConnectionResolver::new());
	let fake = FakeDriver::new();
	fake.install(&resolver);
	resolver.set_connection_details(ConnectionDetails::single(
		"default",
		ConnectionConfig::sqlite_memory(),
	));
	(resolver, fake)
}

fn user_row(id: i64) -> Row {
	Row::from_pairs([("id", Value::Int(id))])
}

#[test]
fn test_nested_eager_load_issues_one_query_per_segment() {
	let (resolver, fake) = harness();
	fake.queue_rows((1..=4).map(user_row).collect());
	fake.queue_rows(
		(1..=4)
			.map(|i| Row::from_pairs([("id", Value::Int(i)), ("user_id", Value::Int(i))]))
			.collect(),
	);
	fake.queue_rows(
		(1..=4)
			.map(|i| Row::from_pairs([("id", Value::Int(i)), ("phone_id", Value::Int(i))]))
			.collect(),
	);

	let mut query: ModelQuery<Owner> = ModelQuery::new().on_resolver(resolver.clone());
	query.with(["phones.contacts"]);
	let owners = query.get().unwrap();

	// Four parents, two path segments: exactly three SELECTs.
	assert_eq!(fake.query_count(), 3);
	let sql = fake.sql_log();
	assert_eq!(sql[0], "SELECT * FROM \"users\"");
	assert_eq!(
		sql[1],
		"SELECT * FROM \"phones\" WHERE \"phones\".\"user_id\" IN (?, ?, ?, ?)"
	);
	assert_eq!(
		sql[2],
		"SELECT * FROM \"contacts\" WHERE \"contacts\".\"phone_id\" IN (?, ?, ?, ?)"
	);

	assert_eq!(owners.len(), 4);
	let mut first = owners.into_inner().remove(0);
	let phones: mortar_orm::Collection<Phone> = first.related_many("phones").unwrap();
	assert_eq!(phones.len(), 1);
	let mut phone = phones.into_inner().remove(0);
	let contacts: mortar_orm::Collection<Contact> = phone.related_many("contacts").unwrap();
	assert_eq!(contacts.len(), 1);
	// Nested relations were attached by the loader, not lazy queries.
	assert_eq!(fake.query_count(), 3);
}

#[test]
fn test_belongs_to_groups_by_owner_key() {
	let (resolver, fake) = harness();
	fake.queue_rows(vec![
		Row::from_pairs([("id", Value::Int(10)), ("user_id", Value::Int(1))]),
		Row::from_pairs([("id", Value::Int(11)), ("user_id", Value::Int(1))]),
	]);
	fake.queue_rows(vec![user_row(1)]);

	let mut query: ModelQuery<Phone> = ModelQuery::new().on_resolver(resolver.clone());
	query.with(["owner"]);
	let phones = query.get().unwrap();

	let sql = fake.sql_log();
	// Duplicate parent keys collapse into one binding.
	assert_eq!(
		sql[1],
		"SELECT * FROM \"users\" WHERE \"users\".\"id\" IN (?)"
	);
	let mut phone = phones.into_inner().remove(0);
	let owner: Option<Owner> = phone.related_one("owner").unwrap();
	assert_eq!(owner.unwrap().get("id"), Value::Int(1));
}

#[test]
fn test_pivot_join_and_hydration() {
	let (resolver, fake) = harness();
	fake.queue_rows(vec![user_store_row(1)]);
	fake.queue_rows(vec![
		product_row(7, 1, 70),
		product_row(8, 1, 71),
	]);

	let mut query: ModelQuery<Store> = ModelQuery::new().on_resolver(resolver.clone());
	query.with(["products"]);
	let stores = query.find(1).unwrap().unwrap();

	let sql = fake.sql_log();
	assert_eq!(
		sql[1],
		"SELECT \"products\".*, \
		 \"product_store\".\"store_id\" AS \"pivot__store_id\", \
		 \"product_store\".\"product_id\" AS \"pivot__product_id\", \
		 \"product_store\".\"id\" AS \"pivot__id\" \
		 FROM \"products\" \
		 INNER JOIN \"product_store\" ON \"products\".\"id\" = \"product_store\".\"product_id\" \
		 WHERE \"product_store\".\"store_id\" IN (?)"
	);

	let mut store = stores;
	let products: mortar_orm::Collection<Product> = store.related_many("products").unwrap();
	assert_eq!(products.len(), 2);
	let product = products.first().unwrap();
	let pivot = product.pivot().expect("pivot attached");
	assert_eq!(pivot.get_raw("store_id"), Value::Int(1));
	assert_eq!(pivot.get_raw("product_id"), Value::Int(7));
	assert_eq!(pivot.get_raw("id"), Value::Int(70));
	// Pivot columns never leak into the product's own attributes.
	assert_eq!(product.get("pivot__store_id"), Value::Null);
}

fn user_store_row(id: i64) -> Row {
	Row::from_pairs([("id", Value::Int(id))])
}

fn product_row(id: i64, store_id: i64, pivot_id: i64) -> Row {
	Row::from_pairs([
		("id", Value::Int(id)),
		("pivot__store_id", Value::Int(store_id)),
		("pivot__product_id", Value::Int(id)),
		("pivot__id", Value::Int(pivot_id)),
	])
}

#[test]
fn test_has_many_through_two_hop_join() {
	let (resolver, fake) = harness();
	fake.queue_rows(vec![user_row(1), user_row(2)]);
	fake.queue_rows(vec![
		Row::from_pairs([
			("id", Value::Int(100)),
			("phone_id", Value::Int(10)),
			("through_key", Value::Int(1)),
		]),
	]);

	let mut query: ModelQuery<Owner> = ModelQuery::new().on_resolver(resolver.clone());
	query.with(["contact_logs"]);
	let owners = query.get().unwrap();

	let sql = fake.sql_log();
	assert_eq!(
		sql[1],
		"SELECT \"contact_logs\".*, \"phones\".\"user_id\" AS \"through_key\" \
		 FROM \"contact_logs\" \
		 INNER JOIN \"phones\" ON \"phones\".\"id\" = \"contact_logs\".\"phone_id\" \
		 WHERE \"phones\".\"user_id\" IN (?, ?)"
	);

	let mut first = owners.into_inner().remove(0);
	let logs: mortar_orm::Collection<ContactLog> = first.related_many("contact_logs").unwrap();
	assert_eq!(logs.len(), 1);
	// The grouping alias is stripped from hydrated attributes.
	assert_eq!(logs.first().unwrap().get("through_key"), Value::Null);
}

#[test]
fn test_with_count_projects_a_correlated_subquery() {
	let (resolver, _fake) = harness();
	let mut query: ModelQuery<Owner> = ModelQuery::new().on_resolver(resolver.clone());
	query.with_count("phones").unwrap();
	let sql = query.to_sql().unwrap();
	assert_eq!(
		sql,
		"SELECT (SELECT COUNT(*) AS \"aggregate\" FROM \"phones\" \
		 WHERE \"phones\".\"user_id\" = \"users\".\"id\") AS \"phones_count\" \
		 FROM \"users\""
	);
}

#[test]
fn test_joins_compiles_relationship_keys() {
	let (resolver, _fake) = harness();
	let mut query: ModelQuery<Owner> = ModelQuery::new().on_resolver(resolver.clone());
	query.joins("phones", JoinKind::Inner).unwrap();
	let sql = query.to_sql().unwrap();
	assert_eq!(
		sql,
		"SELECT * FROM \"users\" INNER JOIN \"phones\" ON \"users\".\"id\" = \"phones\".\"user_id\""
	);
}

#[test]
fn test_unknown_relationship_is_an_error() {
	let (resolver, _fake) = harness();
	let mut query: ModelQuery<Owner> = ModelQuery::new().on_resolver(resolver.clone());
	query.with(["mystery"]);
	let err = query.get().unwrap_err();
	assert!(matches!(
		err,
		mortar_orm::OrmError::UnknownRelationship { .. }
	));
}
