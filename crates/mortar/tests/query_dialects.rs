//! Cross-dialect compilation: quoting, placeholders, empty-IN short
//! circuits, paging and locks.

use mortar::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn grammars() -> Vec<(&'static str, &'static dyn Grammar)> {
	vec![
		("mysql", &MysqlGrammar),
		("postgres", &PostgresGrammar),
		("sqlite", &SqliteGrammar),
		("mssql", &MssqlGrammar),
	]
}

#[test]
fn test_basic_where_chain_on_mysql() {
	let mut query = Builder::table("users");
	query.where_eq("active", 1).where_op("age", ">", 18).unwrap();
	let (sql, bindings) = query.to_qmark(&MysqlGrammar).unwrap();
	assert_eq!(
		sql,
		"SELECT * FROM `users` WHERE `users`.`active` = ? AND `users`.`age` > ?"
	);
	assert_eq!(bindings.into_inner(), vec![Value::Int(1), Value::Int(18)]);
}

#[test]
fn test_like_with_paging_on_postgres() {
	let mut query = Builder::table("users");
	query
		.where_op("email", "like", "a%")
		.unwrap()
		.limit(10)
		.offset(20);
	let (sql, bindings) = query.to_qmark(&PostgresGrammar).unwrap();
	assert_eq!(
		sql,
		"SELECT * FROM \"users\" WHERE \"users\".\"email\" LIKE $1 LIMIT 10 OFFSET 20"
	);
	assert_eq!(
		bindings.into_inner(),
		vec![Value::String("a%".to_string())]
	);
}

#[test]
fn test_empty_in_short_circuits() {
	let mut query = Builder::table("users");
	query.where_in("id", Vec::<i64>::new());
	let (sql, bindings) = query.to_qmark(&MysqlGrammar).unwrap();
	assert_eq!(sql, "SELECT * FROM `users` WHERE 0 = 1");
	assert!(bindings.is_empty());
}

#[test]
fn test_empty_not_in_matches_everything() {
	let mut query = Builder::table("users");
	query.where_eq("active", 1);
	query.where_not_in("id", Vec::<i64>::new());
	let (sql, _) = query.to_qmark(&MysqlGrammar).unwrap();
	assert_eq!(
		sql,
		"SELECT * FROM `users` WHERE `users`.`active` = ? AND 1 = 1"
	);
}

/// Placeholder count always matches the bindings vector, dialect by dialect.
#[rstest]
#[case(0)]
#[case(3)]
fn test_bindings_length_matches_placeholders(#[case] extra_values: usize) {
	for (name, grammar) in grammars() {
		let mut query = Builder::table("orders");
		query.where_eq("status", "open");
		query.where_in("region", vec!["eu", "us"]);
		for i in 0..extra_values {
			query.or_where_eq("priority", i as i64);
		}
		query.where_between("total", 10, 100);
		let (sql, bindings) = query.to_qmark(grammar).unwrap();

		let placeholders = if name == "postgres" {
			(1..=bindings.len())
				.filter(|i| sql.contains(&format!("${}", i)))
				.count()
		} else {
			sql.matches('?').count()
		};
		assert_eq!(
			placeholders,
			bindings.len(),
			"placeholder mismatch on {}: {}",
			name,
			sql
		);
	}
}

#[test]
fn test_mssql_paging_and_lock() {
	let mut query = Builder::table("users");
	query.where_eq("active", 1).limit(10).offset(20).lock_for_update();
	let (sql, _) = query.to_qmark(&MssqlGrammar).unwrap();
	assert_eq!(
		sql,
		"SELECT * FROM [users] WITH (UPDLOCK, ROWLOCK) WHERE [users].[active] = ? \
		 ORDER BY (SELECT NULL) OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
	);
}

#[test]
fn test_nested_where_groups() {
	let mut query = Builder::table("users");
	query.where_eq("verified", 1).where_nested(|group| {
		group.where_eq("role", "admin").or_where_eq("role", "moderator");
	});
	let (sql, bindings) = query.to_qmark(&MysqlGrammar).unwrap();
	assert_eq!(
		sql,
		"SELECT * FROM `users` WHERE `users`.`verified` = ? AND \
		 (`users`.`role` = ? OR `users`.`role` = ?)"
	);
	assert_eq!(bindings.len(), 3);
}

#[test]
fn test_where_exists_subquery() {
	let mut query = Builder::table("users");
	query.where_exists(|sub| {
		sub.from("orders")
			.select(["id"])
			.where_column("orders.user_id", "users.id");
	});
	let (sql, _) = query.to_qmark(&MysqlGrammar).unwrap();
	assert_eq!(
		sql,
		"SELECT * FROM `users` WHERE EXISTS \
		 (SELECT `id` FROM `orders` WHERE `orders`.`user_id` = `users`.`id`)"
	);
}

#[test]
fn test_aggregate_replaces_columns() {
	let mut query = Builder::table("users");
	query.select(["name"]);
	query.set_aggregate(mortar::query::AggregateFunction::Count, "*");
	let (sql, _) = query.to_qmark(&MysqlGrammar).unwrap();
	assert_eq!(sql, "SELECT COUNT(*) AS `aggregate` FROM `users`");
}

#[test]
fn test_group_having_order() {
	let mut query = Builder::table("orders");
	query
		.select_raw("`region`, SUM(`total`) AS `region_total`")
		.group_by("region")
		.having_op("region_total", ">", 1000)
		.unwrap()
		.order_by("region_total", "desc");
	let (sql, bindings) = query.to_qmark(&MysqlGrammar).unwrap();
	assert_eq!(
		sql,
		"SELECT `region`, SUM(`total`) AS `region_total` FROM `orders` \
		 GROUP BY `region` HAVING `region_total` > ? ORDER BY `region_total` DESC"
	);
	assert_eq!(bindings.len(), 1);
}

#[test]
fn test_update_and_delete_compilation() {
	let grammar = &MysqlGrammar;
	let mut query = Builder::table("users");
	query.where_eq("id", 7);
	let (sql, bindings) = grammar
		.compile_update(
			&query,
			&[(
				"name".to_string(),
				mortar::query::UpdateExpr::Value(Value::from("Joe")),
			)],
		)
		.unwrap();
	assert_eq!(
		sql,
		"UPDATE `users` SET `name` = ? WHERE `users`.`id` = ?"
	);
	assert_eq!(bindings.len(), 2);

	let (sql, _) = grammar.compile_delete(&query).unwrap();
	assert_eq!(sql, "DELETE FROM `users` WHERE `users`.`id` = ?");
}

#[test]
fn test_bulk_insert_tuples() {
	let query = Builder::table("users");
	let (sql, bindings) = MysqlGrammar
		.compile_bulk_insert(
			&query,
			&["email".to_string(), "name".to_string()],
			&[
				vec![Value::from("a@ex.io"), Value::from("A")],
				vec![Value::from("b@ex.io"), Value::from("B")],
			],
		)
		.unwrap();
	assert_eq!(
		sql,
		"INSERT INTO `users` (`email`, `name`) VALUES (?, ?), (?, ?)"
	);
	assert_eq!(bindings.len(), 4);
}

#[test]
fn test_select_alias_parsing() {
	let mut query = Builder::table("users");
	query.select(["email AS contact", "users.id"]);
	let (sql, _) = query.to_qmark(&PostgresGrammar).unwrap();
	assert_eq!(
		sql,
		"SELECT \"email\" AS \"contact\", \"users\".\"id\" FROM \"users\""
	);
}
