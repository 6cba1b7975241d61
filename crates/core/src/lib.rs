//! Core types and shared functionality for precache.
//!
//! This crate provides:
//! - Resource manifest and resource key derivation
//! - Cache store contract with SQLite and in-memory backends
//! - The worker lifecycle: install, activation/reconciliation, fetch
//!   interception and offline prefetch
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod manifest;
pub mod network;
pub mod worker;

pub use cache::{CacheDb, CacheStorage, CacheStore, MemoryStorage, SqliteStorage};
pub use error::Error;
pub use http::{CacheMode, Method, Request, Response};
pub use manifest::{Bundle, ResourceManifest};
pub use network::Network;
pub use worker::{FetchDisposition, ServiceWorker, WorkerHandle};
