//! Soft deletes: scoping, trash modes, restore and force delete, asserted
//! against the MySQL grammar's output.

use std::sync::Arc;

use mortar_connection::testing::FakeDriver;
use mortar_connection::{ConnectionConfig, ConnectionDetails, ConnectionResolver, DatabaseDriver};
use mortar_orm::{model, Model, ModelMeta, ModelQuery};
use mortar_query::Value;
use pretty_assertions::assert_eq;

model!(Member, {
	ModelMeta::builder("Member")
		.table("users")
		.fillable(["*"])
		.timestamps(false)
		.soft_deletes()
		.build()
});

fn harness() -> (Arc<ConnectionResolver>, FakeDriver) {
	let resolver = Arc::new(ConnectionResolver::new());
	let fake = FakeDriver::new();
	fake.install(&resolver);
	resolver.set_connection_details(ConnectionDetails::single(
		"default",
		ConnectionConfig::new(DatabaseDriver::Mysql, "app"),
	));
	(resolver, fake)
}

fn query(resolver: &Arc<ConnectionResolver>) -> ModelQuery<Member> {
	ModelQuery::new().on_resolver(resolver.clone())
}

#[test]
fn test_delete_becomes_an_update() {
	let (resolver, fake) = harness();
	let mut q = query(&resolver);
	q.where_eq("id", 1);
	q.delete().unwrap();

	let (sql, bindings) = fake.queries().remove(0);
	assert_eq!(
		sql,
		"UPDATE `users` SET `deleted_at` = ? WHERE `users`.`id` = ? AND `users`.`deleted_at` IS NULL"
	);
	assert!(matches!(bindings[0], Value::DateTime(_)));
	assert_eq!(bindings[1], Value::Int(1));
}

#[test]
fn test_selects_hide_trashed_rows() {
	let (resolver, fake) = harness();
	query(&resolver).get().unwrap();
	assert_eq!(
		fake.sql_log()[0],
		"SELECT * FROM `users` WHERE `users`.`deleted_at` IS NULL"
	);
}

#[test]
fn test_with_trashed_drops_the_scope() {
	let (resolver, fake) = harness();
	let mut q = query(&resolver);
	q.with_trashed();
	q.get().unwrap();
	assert_eq!(fake.sql_log()[0], "SELECT * FROM `users`");
}

#[test]
fn test_only_trashed_inverts_the_scope() {
	let (resolver, fake) = harness();
	let mut q = query(&resolver);
	q.only_trashed();
	q.get().unwrap();
	assert_eq!(
		fake.sql_log()[0],
		"SELECT * FROM `users` WHERE `users`.`deleted_at` IS NOT NULL"
	);
}

#[test]
fn test_without_global_scope_by_name() {
	let (resolver, fake) = harness();
	let mut q = query(&resolver);
	q.without_global_scope(mortar_orm::SOFT_DELETE_SCOPE);
	q.get().unwrap();
	assert_eq!(fake.sql_log()[0], "SELECT * FROM `users`");
}

#[test]
fn test_force_delete_really_deletes() {
	let (resolver, fake) = harness();
	let mut q = query(&resolver);
	q.where_eq("admin", 1);
	q.force_delete().unwrap();

	let (sql, bindings) = fake.queries().remove(0);
	assert_eq!(sql, "DELETE FROM `users` WHERE `users`.`admin` = ?");
	assert_eq!(bindings, vec![Value::Int(1)]);
}

#[test]
fn test_restore_clears_the_stamp() {
	let (resolver, fake) = harness();
	let mut q = query(&resolver);
	q.where_eq("id", 9);
	q.restore().unwrap();

	let (sql, bindings) = fake.queries().remove(0);
	assert_eq!(
		sql,
		"UPDATE `users` SET `deleted_at` = ? WHERE `users`.`id` = ?"
	);
	assert_eq!(bindings[0], Value::Null);
	assert_eq!(bindings[1], Value::Int(9));
}

#[test]
fn test_model_delete_stamps_the_instance() {
	let (resolver, fake) = harness();
	let mut member = Member::hydrate(mortar_connection::Row::from_pairs([(
		"id",
		Value::Int(3),
	)]));
	let deleted = query(&resolver).delete_model(&mut member).unwrap();

	assert!(deleted);
	assert!(matches!(member.get("deleted_at"), Value::DateTime(_)));
	let (sql, _) = fake.queries().remove(0);
	assert!(sql.starts_with("UPDATE `users` SET `deleted_at` = ?"));
}
