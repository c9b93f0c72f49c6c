//! Migration batches: ledger creation, ordering, rollback and status.

use std::sync::Arc;

use mortar::prelude::*;
use mortar_connection::testing::FakeDriver;
use pretty_assertions::assert_eq;

struct CreateUsers;

impl Migration for CreateUsers {
	fn name(&self) -> &str {
		"2024_01_01_000000_create_users"
	}

	fn up(&self, schema: &mut Schema) -> mortar::migrations::Result<()> {
		schema.create("users", |table| {
			table.increments("id");
			table.string("email").unique();
			table.timestamps();
		})?;
		Ok(())
	}

	fn down(&self, schema: &mut Schema) -> mortar::migrations::Result<()> {
		schema.drop_if_exists("users")?;
		Ok(())
	}
}

struct CreatePosts;

impl Migration for CreatePosts {
	fn name(&self) -> &str {
		"2024_02_01_000000_create_posts"
	}

	fn up(&self, schema: &mut Schema) -> mortar::migrations::Result<()> {
		schema.create("posts", |table| {
			table.increments("id");
			table.integer("user_id");
			table
				.foreign("user_id")
				.references("id")
				.on("users")
				.on_delete(mortar::query::ForeignAction::Cascade);
		})?;
		Ok(())
	}

	fn down(&self, schema: &mut Schema) -> mortar::migrations::Result<()> {
		schema.drop_if_exists("posts")?;
		Ok(())
	}
}

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

fn migrator(resolver: &Arc<ConnectionResolver>) -> Migrator {
	let mut migrator = Migrator::new().on_resolver(resolver.clone());
	// Registration order is irrelevant; application is lexicographic.
	migrator.register(Box::new(CreatePosts));
	migrator.register(Box::new(CreateUsers));
	migrator
}

#[test]
fn test_migrate_applies_in_name_order_within_one_batch() {
	let (resolver, fake) = harness();
	let applied = migrator(&resolver).migrate().unwrap();
	assert_eq!(
		applied,
		vec![
			"2024_01_01_000000_create_users".to_string(),
			"2024_02_01_000000_create_posts".to_string(),
		]
	);

	let sql = fake.sql_log();
	// Ledger probe, ledger create, ledger read, then per file:
	// BEGIN / DDL / ledger insert / COMMIT.
	assert!(sql[0].contains("sqlite_master"));
	assert!(sql[1].starts_with("CREATE TABLE \"migrations\""));
	assert!(sql
		.iter()
		.any(|s| s.starts_with("CREATE TABLE \"users\"")));
	assert!(sql
		.iter()
		.any(|s| s.starts_with("CREATE TABLE \"posts\"")));
	let users_at = sql
		.iter()
		.position(|s| s.starts_with("CREATE TABLE \"users\""))
		.unwrap();
	let posts_at = sql
		.iter()
		.position(|s| s.starts_with("CREATE TABLE \"posts\""))
		.unwrap();
	assert!(users_at < posts_at);
	assert_eq!(sql.iter().filter(|s| *s == "BEGIN").count(), 2);
	assert_eq!(sql.iter().filter(|s| *s == "COMMIT").count(), 2);
}

#[test]
fn test_status_reports_applied_and_pending() {
	let (resolver, fake) = harness();
	let migrator = migrator(&resolver);

	// Ledger exists and holds one applied file.
	fake.queue_rows(vec![Row::from_pairs([(
		"name",
		Value::String("migrations".to_string()),
	)])]);
	fake.queue_rows(vec![Row::from_pairs([
		(
			"migration",
			Value::String("2024_01_01_000000_create_users".to_string()),
		),
		("batch", Value::Int(1)),
	])]);

	let status = migrator.status().unwrap();
	assert_eq!(status.len(), 2);
	assert_eq!(status[0].name, "2024_01_01_000000_create_users");
	assert!(status[0].applied);
	assert_eq!(status[0].batch, Some(1));
	assert_eq!(status[1].name, "2024_02_01_000000_create_posts");
	assert!(!status[1].applied);
}

#[test]
fn test_rollback_reverts_only_the_last_batch_in_reverse() {
	let (resolver, fake) = harness();
	let migrator = migrator(&resolver);

	fake.queue_rows(vec![Row::from_pairs([(
		"name",
		Value::String("migrations".to_string()),
	)])]);
	fake.queue_rows(vec![
		Row::from_pairs([
			(
				"migration",
				Value::String("2024_01_01_000000_create_users".to_string()),
			),
			("batch", Value::Int(1)),
		]),
		Row::from_pairs([
			(
				"migration",
				Value::String("2024_02_01_000000_create_posts".to_string()),
			),
			("batch", Value::Int(2)),
		]),
	]);

	let reverted = migrator.rollback().unwrap();
	assert_eq!(reverted, vec!["2024_02_01_000000_create_posts".to_string()]);

	let sql = fake.sql_log();
	assert!(sql.iter().any(|s| s == "DROP TABLE IF EXISTS \"posts\""));
	assert!(!sql.iter().any(|s| s == "DROP TABLE IF EXISTS \"users\""));
}

#[test]
fn test_show_pending_compiles_without_executing() {
	let (resolver, fake) = harness();
	let migrator = migrator(&resolver);

	fake.queue_rows(vec![Row::from_pairs([(
		"name",
		Value::String("migrations".to_string()),
	)])]);
	// Empty ledger: everything pending.
	let pending = migrator.show_pending().unwrap();
	assert_eq!(pending.len(), 2);
	assert!(pending[0].1[0].starts_with("CREATE TABLE \"users\""));

	let sql = fake.sql_log();
	assert!(!sql.iter().any(|s| s.starts_with("CREATE TABLE \"users\"")));
}

#[test]
fn test_failed_migration_rolls_back_its_transaction() {
	struct Exploding;

	impl Migration for Exploding {
		fn name(&self) -> &str {
			"2024_03_01_000000_explode"
		}

		fn up(&self, _schema: &mut Schema) -> mortar::migrations::Result<()> {
			Err(mortar::migrations::MigrationError::Failed {
				name: self.name().to_string(),
				reason: "boom".to_string(),
			})
		}

		fn down(&self, _schema: &mut Schema) -> mortar::migrations::Result<()> {
			Ok(())
		}
	}

	let (resolver, fake) = harness();
	let mut migrator = Migrator::new().on_resolver(resolver.clone());
	migrator.register(Box::new(Exploding));

	let error = migrator.migrate().unwrap_err();
	assert!(matches!(
		error,
		mortar::migrations::MigrationError::Failed { .. }
	));
	let sql = fake.sql_log();
	assert!(sql.iter().any(|s| s == "ROLLBACK"));
	assert!(!sql.iter().any(|s| s == "COMMIT"));
}
