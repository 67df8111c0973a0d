//! Database layer for Carebell.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Every table is created through versioned
//! migrations owned by this crate; the domain crates only issue queries.
//!
//! Access control is enforced in the queries themselves: every row a user can
//! reach hangs off a `users.id`, and the domain crates always filter on it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
