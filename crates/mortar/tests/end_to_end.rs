//! Whole-surface flows through the process-wide resolver: model statics,
//! transactions, pagination and chunking. Serialized because they share the
//! global connection registry.

use mortar::prelude::*;
use mortar_connection::testing::FakeDriver;
use pretty_assertions::assert_eq;
use serial_test::serial;

model!(Customer, {
	ModelMeta::builder("Customer")
		.fillable(["name", "email"])
		.timestamps(false)
		.build()
});

fn install_fake() -> FakeDriver {
	let fake = FakeDriver::new();
	fake.install(resolver());
	set_connection_details(ConnectionDetails::single(
		"default",
		ConnectionConfig::sqlite_memory(),
	));
	fake
}

#[test]
#[serial]
fn test_model_statics_use_the_global_resolver() {
	let fake = install_fake();
	fake.queue_rows(vec![
		Row::from_pairs([("id", Value::Int(1)), ("name", Value::from("Ada"))]),
		Row::from_pairs([("id", Value::Int(2)), ("name", Value::from("Grace"))]),
	]);

	let customers = Customer::all().unwrap();
	assert_eq!(customers.len(), 2);
	assert_eq!(fake.sql_log(), vec!["SELECT * FROM \"customers\""]);

	let mut first = Customer::create([("name", Value::from("Joe"))]).unwrap();
	assert_eq!(first.get("id"), Value::Int(1));
	first.set("name", "Joseph");
	assert!(first.save().unwrap());
	assert!(!first.is_dirty());
}

#[test]
#[serial]
fn test_find_returns_none_on_no_rows() {
	let fake = install_fake();
	let _ = fake;
	assert!(Customer::find(99).unwrap().is_none());
	assert!(matches!(
		Customer::find_or_fail(99),
		Err(OrmError::ModelNotFound { .. })
	));
}

#[test]
#[serial]
fn test_transaction_rolls_back_every_write_in_scope() {
	let fake = install_fake();
	let result: Result<(), mortar_connection::ConnectionError> =
		resolver().transaction(None, || {
			resolver().execute(
				"INSERT INTO logs (line) VALUES (?)",
				&Values::from(vec![Value::from("a")]),
				None,
			)?;
			resolver().execute(
				"INSERT INTO logs (line) VALUES (?)",
				&Values::from(vec![Value::from("b")]),
				None,
			)?;
			Err(mortar_connection::ConnectionError::Configuration(
				"abort".to_string(),
			))
		});
	assert!(result.is_err());
	assert_eq!(
		fake.sql_log(),
		vec![
			"BEGIN".to_string(),
			"INSERT INTO logs (line) VALUES (?)".to_string(),
			"INSERT INTO logs (line) VALUES (?)".to_string(),
			"ROLLBACK".to_string(),
		]
	);
}

#[test]
#[serial]
fn test_nested_transaction_failure_keeps_outer_scope() {
	let fake = install_fake();
	let result: Result<(), mortar_connection::ConnectionError> =
		resolver().transaction(None, || {
			let inner: Result<(), mortar_connection::ConnectionError> =
				resolver().transaction(None, || {
					Err(mortar_connection::ConnectionError::Configuration(
						"inner".to_string(),
					))
				});
			assert!(inner.is_err());
			Ok(())
		});
	assert!(result.is_ok());
	assert_eq!(
		fake.sql_log(),
		vec![
			"BEGIN".to_string(),
			"SAVEPOINT SP_1".to_string(),
			"ROLLBACK TO SAVEPOINT SP_1".to_string(),
			"COMMIT".to_string(),
		]
	);
}

#[test]
#[serial]
fn test_paginate_counts_then_windows() {
	let fake = install_fake();
	fake.queue_rows(vec![Row::from_pairs([("aggregate", Value::Int(7))])]);
	fake.queue_rows(vec![
		Row::from_pairs([("id", Value::Int(4))]),
		Row::from_pairs([("id", Value::Int(5))]),
		Row::from_pairs([("id", Value::Int(6))]),
	]);

	let page = Customer::query().paginate(3, 2).unwrap();
	assert_eq!(page.total, 7);
	assert_eq!(page.last_page, 3);
	assert_eq!(page.from, 4);
	assert_eq!(page.to, 6);

	let sql = fake.sql_log();
	assert_eq!(
		sql[0],
		"SELECT COUNT(*) AS \"aggregate\" FROM \"customers\""
	);
	assert_eq!(sql[1], "SELECT * FROM \"customers\" LIMIT 3 OFFSET 3");
}

#[test]
#[serial]
fn test_simple_paginate_peeks_one_extra_row() {
	let fake = install_fake();
	fake.queue_rows(vec![
		Row::from_pairs([("id", Value::Int(1))]),
		Row::from_pairs([("id", Value::Int(2))]),
		Row::from_pairs([("id", Value::Int(3))]),
	]);

	let page = Customer::query().simple_paginate(2, 1).unwrap();
	assert!(page.has_more);
	assert_eq!(page.data.len(), 2);
	assert_eq!(
		fake.sql_log(),
		vec!["SELECT * FROM \"customers\" LIMIT 3".to_string()]
	);
}

#[test]
#[serial]
fn test_chunk_stops_after_a_short_page() {
	let fake = install_fake();
	fake.queue_rows(vec![
		Row::from_pairs([("id", Value::Int(1))]),
		Row::from_pairs([("id", Value::Int(2))]),
	]);
	fake.queue_rows(vec![Row::from_pairs([("id", Value::Int(3))])]);

	let chunks: Vec<_> = Customer::query()
		.chunk(2)
		.collect::<mortar::orm::Result<Vec<_>>>()
		.unwrap();
	assert_eq!(chunks.len(), 2);
	assert_eq!(chunks[0].len(), 2);
	assert_eq!(chunks[1].len(), 1);

	let sql = fake.sql_log();
	assert_eq!(sql[0], "SELECT * FROM \"customers\" LIMIT 2 OFFSET 0");
	assert_eq!(sql[1], "SELECT * FROM \"customers\" LIMIT 2 OFFSET 2");
	assert_eq!(sql.len(), 2);
}

#[test]
#[serial]
fn test_increment_compiles_raw_arithmetic() {
	let fake = install_fake();
	let mut query = Customer::query();
	query.where_eq("id", 1);
	query.increment("visits", 1).unwrap();
	let (sql, bindings) = fake.queries().remove(0);
	assert_eq!(
		sql,
		"UPDATE \"customers\" SET \"visits\" = \"visits\" + 1 WHERE \"customers\".\"id\" = ?"
	);
	assert_eq!(bindings, vec![Value::Int(1)]);
}

#[test]
#[serial]
fn test_collection_operations_over_models() {
	let _fake = install_fake();
	let customers: Collection<Customer> = Collection::new(vec![
		Customer::hydrate(Row::from_pairs([
			("id", Value::Int(1)),
			("name", Value::from("Ada")),
			("score", Value::Int(10)),
		])),
		Customer::hydrate(Row::from_pairs([
			("id", Value::Int(2)),
			("name", Value::from("Grace")),
			("score", Value::Int(30)),
		])),
		Customer::hydrate(Row::from_pairs([
			("id", Value::Int(3)),
			("name", Value::from("Ada")),
			("score", Value::Int(20)),
		])),
	]);

	assert_eq!(
		customers.pluck("name"),
		vec![
			Value::from("Ada"),
			Value::from("Grace"),
			Value::from("Ada")
		]
	);
	assert_eq!(customers.where_eq("name", "Ada").len(), 2);
	assert_eq!(customers.unique("name").len(), 2);
	assert_eq!(customers.sum("score"), 60.0);
	assert_eq!(customers.avg("score"), 20.0);
	assert_eq!(customers.max("score"), Some(30.0));
	assert_eq!(customers.implode("name", ", "), "Ada, Grace, Ada");
	assert!(customers.contains("id", 2));

	let serialized = customers.serialize().unwrap();
	assert_eq!(serialized.as_array().unwrap().len(), 3);
}
