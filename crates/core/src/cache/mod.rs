//! Named cache stores.
//!
//! A store maps request identity (the URL) to a cached response. Stores are
//! opened by name, created on first open, and deleted as a whole. Two
//! backends implement the contract:
//!
//! - `SqliteStorage`: persistent, backed by tokio-rusqlite with WAL mode
//!   and versioned migrations
//! - `MemoryStorage`: process-local, for tests and ephemeral hosts

pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod sqlite;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::{MemoryStorage, MemoryStore};
pub use sqlite::{SqliteStorage, SqliteStore};
pub use store::{CacheStorage, CacheStore, add_all, copy_all};
