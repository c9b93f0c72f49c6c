//! Persistence lifecycle: hydration, dirty tracking, events, mass
//! assignment, casts and key generation, all against the recording fake
//! driver.

use std::sync::Arc;

use mortar_connection::testing::FakeDriver;
use mortar_connection::{ConnectionConfig, ConnectionDetails, ConnectionResolver, Row};
use mortar_orm::{
	model, CastType, EventResult, Model, ModelData, ModelMeta, ModelQuery, Observer, OrmError,
	UuidConfig,
};
use mortar_query::Value;
use pretty_assertions::assert_eq;

model!(User, {
	ModelMeta::builder("User")
		.fillable(["name", "email", "active"])
		.cast("active", CastType::Bool)
		.build()
});

model!(Document, {
	ModelMeta::builder("Document")
		.fillable(["*"])
		.timestamps(false)
		.uuid_primary_key(UuidConfig::default())
		.build()
});

model!(Account, {
	ModelMeta::builder("Account")
		.fillable(["name"])
		.strict_mass_assignment()
		.timestamps(false)
		.build()
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

fn query<M: Model>(resolver: &Arc<ConnectionResolver>) -> ModelQuery<M> {
	ModelQuery::new().on_resolver(resolver.clone())
}

#[test]
fn test_create_inserts_and_backfills_the_key() {
	let (resolver, fake) = harness();
	let user = query::<User>(&resolver)
		.create([
			("name", Value::from("Joe")),
			("email", Value::from("joe@ex.io")),
		])
		.unwrap();

	assert!(user.exists());
	assert_eq!(user.get("id"), Value::Int(1));
	assert!(!user.is_dirty());

	let (sql, bindings) = fake.queries().remove(0);
	assert!(sql.starts_with("INSERT INTO \"users\""));
	assert!(sql.contains("\"name\""));
	assert!(sql.contains("\"email\""));
	// Timestamps are stamped on insert by default.
	assert!(sql.contains("\"created_at\""));
	assert!(sql.contains("\"updated_at\""));
	assert!(bindings.len() >= 4);
}

#[test]
fn test_clean_update_skips_the_statement() {
	let (resolver, fake) = harness();
	let mut user = User::hydrate(Row::from_pairs([
		("id", Value::Int(5)),
		("name", Value::String("Joe".to_string())),
	]));

	let saved = query::<User>(&resolver).save_model(&mut user).unwrap();
	assert!(!saved);
	assert_eq!(fake.query_count(), 0);
}

#[test]
fn test_dirty_update_writes_only_changed_columns() {
	let (resolver, fake) = harness();
	let mut user = User::hydrate(Row::from_pairs([
		("id", Value::Int(5)),
		("name", Value::String("Joe".to_string())),
		("email", Value::String("joe@ex.io".to_string())),
	]));
	user.set("name", "Joseph");
	assert!(user.is_dirty());
	assert_eq!(user.get_original("name"), Value::String("Joe".to_string()));

	let saved = query::<User>(&resolver)
		.activate_timestamps(false)
		.save_model(&mut user)
		.unwrap();
	assert!(saved);
	assert!(!user.is_dirty());
	assert_eq!(user.get("name"), user.get_original("name"));

	let (sql, bindings) = fake.queries().remove(0);
	assert_eq!(
		sql,
		"UPDATE \"users\" SET \"name\" = ? WHERE \"users\".\"id\" = ?"
	);
	assert_eq!(
		bindings,
		vec![Value::String("Joseph".to_string()), Value::Int(5)]
	);
}

#[test]
fn test_force_update_bypasses_the_dirty_check() {
	let (resolver, fake) = harness();
	let mut user = User::hydrate(Row::from_pairs([("id", Value::Int(5))]));

	let saved = query::<User>(&resolver)
		.activate_timestamps(false)
		.force()
		.save_model(&mut user)
		.unwrap();
	assert!(saved);
	assert_eq!(fake.query_count(), 1);
}

#[test]
fn test_mass_assignment_silently_filters_unfillable() {
	let (resolver, fake) = harness();
	query::<User>(&resolver)
		.create([
			("name", Value::from("Joe")),
			("admin", Value::from(true)),
		])
		.unwrap();

	let (sql, _) = fake.queries().remove(0);
	assert!(sql.contains("\"name\""));
	assert!(!sql.contains("\"admin\""));
}

#[test]
fn test_strict_mass_assignment_errors() {
	let (resolver, _fake) = harness();
	let result = query::<Account>(&resolver).create([
		("name", Value::from("Ops")),
		("balance", Value::from(100)),
	]);
	assert!(matches!(result, Err(OrmError::MassAssignment(column)) if column == "balance"));
}

#[test]
fn test_bool_cast_applies_on_read_and_write() {
	let (resolver, _fake) = harness();
	let user = query::<User>(&resolver)
		.create([("name", Value::from("Joe")), ("active", Value::from("1"))])
		.unwrap();
	assert_eq!(user.get("active"), Value::Bool(true));

	let hydrated = User::hydrate(Row::from_pairs([("active", Value::Int(0))]));
	assert_eq!(hydrated.get("active"), Value::Bool(false));
}

#[test]
fn test_uuid_primary_key_is_generated_on_insert() {
	let (resolver, fake) = harness();
	let document = query::<Document>(&resolver)
		.create([("title", Value::from("Spec"))])
		.unwrap();

	match document.get("id") {
		Value::Uuid(_) => {}
		other => panic!("expected a uuid key, got {:?}", other),
	}
	let (sql, _) = fake.queries().remove(0);
	assert!(sql.contains("\"id\""));
}

#[test]
fn test_serialization_round_trips_attributes() {
	let (_resolver, _fake) = harness();
	let user = User::hydrate(Row::from_pairs([
		("id", Value::Int(1)),
		("name", Value::String("Joe".to_string())),
		("active", Value::Int(1)),
	]));
	let serialized = user.serialize().unwrap();
	assert_eq!(serialized["id"], serde_json::json!(1));
	assert_eq!(serialized["name"], serde_json::json!("Joe"));
	// The cast shapes serialized output too.
	assert_eq!(serialized["active"], serde_json::json!(true));

	let reparsed: serde_json::Value =
		serde_json::from_str(&user.to_json().unwrap()).unwrap();
	assert_eq!(reparsed, serialized);
}

struct VetoCreates;

impl Observer for VetoCreates {
	fn creating(&self, _data: &mut ModelData) -> EventResult {
		EventResult::Veto
	}
}

struct SlugObserver;

impl Observer for SlugObserver {
	fn creating(&self, data: &mut ModelData) -> EventResult {
		data.set_raw("slug", Value::String("from-observer".to_string()));
		EventResult::Continue
	}
}

model!(Post, {
	ModelMeta::builder("Post").fillable(["*"]).timestamps(false).build()
});

model!(Draft, {
	ModelMeta::builder("Draft").fillable(["*"]).timestamps(false).build()
});

#[test]
fn test_vetoed_create_runs_no_sql() {
	let (resolver, fake) = harness();
	Draft::observe(Arc::new(VetoCreates));

	let mut draft = Draft::new();
	draft.set("title", "hidden");
	let saved = query::<Draft>(&resolver).save_model(&mut draft).unwrap();

	assert!(!saved);
	assert!(!draft.exists());
	assert_eq!(fake.query_count(), 0);
	mortar_orm::events::forget_observers("Draft");
}

#[test]
fn test_observer_can_mutate_before_insert() {
	let (resolver, fake) = harness();
	Post::observe(Arc::new(SlugObserver));

	let post = query::<Post>(&resolver)
		.create([("title", Value::from("Hello"))])
		.unwrap();
	assert_eq!(post.get("slug"), Value::String("from-observer".to_string()));

	let (sql, _) = fake.queries().remove(0);
	assert!(sql.contains("\"slug\""));
	mortar_orm::events::forget_observers("Post");
}
