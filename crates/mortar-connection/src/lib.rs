//! # mortar-connection
//!
//! The execution layer of the Mortar toolkit: a named-connection registry
//! with lazily opened driver handles, raw statement dispatch with query
//! logging, and per-connection transaction stacks nested through savepoints.
//!
//! Actual socket drivers live outside the core. A driver crate registers a
//! [`ConnectionFactory`] for its [`DatabaseDriver`]; until then the resolver
//! compiles and routes but cannot dispatch. The bundled [`testing`] module
//! provides a recording fake for tests.
//!
//! ```
//! use mortar_connection::testing::FakeDriver;
//! use mortar_connection::{ConnectionConfig, ConnectionDetails, ConnectionResolver};
//! use mortar_query::Values;
//!
//! let resolver = ConnectionResolver::new();
//! let fake = FakeDriver::new();
//! fake.install(&resolver);
//! resolver.set_connection_details(ConnectionDetails::single(
//! 	"default",
//! 	ConnectionConfig::sqlite_memory(),
//! ));
//!
//! resolver
//! 	.transaction(None, || resolver.execute("DELETE FROM logs", &Values::new(), None))
//! 	.unwrap();
//! assert_eq!(fake.sql_log(), vec!["BEGIN", "DELETE FROM logs", "COMMIT"]);
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod resolver;
pub mod row;
pub mod testing;

pub use config::{db_url, ConnectionConfig, ConnectionDetails, DatabaseDriver};
pub use connection::{Connection, ConnectionFactory};
pub use error::{ConnectionError, DriverError, Result};
pub use resolver::{resolver, set_connection_details, ConnectionResolver, QUERY_LOG_TARGET};
pub use row::{ExecuteResult, QueryResult, Row};
