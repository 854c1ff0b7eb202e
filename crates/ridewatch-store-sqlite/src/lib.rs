//! SQLite backend for the ridewatch store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Natural keys are `UNIQUE` constraints
//! in the schema, so duplicate deliveries are rejected by SQLite itself.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
