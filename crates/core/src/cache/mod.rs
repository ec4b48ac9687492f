//! SQLite-backed storage for named response caches and key-value items.
//!
//! This module provides the durable half of the subsystem using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Versioned named caches holding stored responses keyed by URL
//! - Content-addressed entry keys using SHA-256 hashing
//! - A small key-value table for client-side state (search history)
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod hash;
pub mod kv;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
pub use kv::KeyValueStore;
