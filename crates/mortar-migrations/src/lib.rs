//! # mortar-migrations
//!
//! Schema management for the Mortar toolkit: a [`Blueprint`] DSL compiled
//! into per-dialect DDL, a [`Schema`] facade bound to a connection, and a
//! [`Migrator`] that records applied migrations in a batch-numbered ledger
//! table and supports migrate / rollback / reset / refresh / status.
//!
//! ```no_run
//! use mortar_migrations::{Migration, Migrator, Result, Schema};
//!
//! struct CreateUsers;
//!
//! impl Migration for CreateUsers {
//! 	fn name(&self) -> &str {
//! 		"2024_05_01_000000_create_users"
//! 	}
//!
//! 	fn up(&self, schema: &mut Schema) -> Result<()> {
//! 		schema.create("users", |table| {
//! 			table.increments("id");
//! 			table.string("email").unique();
//! 			table.timestamps();
//! 		})?;
//! 		Ok(())
//! 	}
//!
//! 	fn down(&self, schema: &mut Schema) -> Result<()> {
//! 		schema.drop_if_exists("users")?;
//! 		Ok(())
//! 	}
//! }
//!
//! # fn main() -> Result<()> {
//! let mut migrator = Migrator::new();
//! migrator.register(Box::new(CreateUsers));
//! migrator.migrate()?;
//! # Ok(())
//! # }
//! ```

pub mod blueprint;
pub mod error;
pub mod migrator;
pub mod schema;

pub use blueprint::{Blueprint, ColumnHandle, ForeignHandle};
pub use error::{MigrationError, Result};
pub use migrator::{Migration, MigrationStatus, Migrator};
pub use schema::Schema;
