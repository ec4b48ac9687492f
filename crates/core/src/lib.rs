//! Core types and shared functionality for karuta.
//!
//! This crate provides:
//! - The content index model and merge rules
//! - Client-side search: scoring, excerpts, rendering, history and sessions
//! - The offline cache controller
//! - Response cache and key-value storage with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod search;
pub mod worker;

pub use cache::{CacheDb, KeyValueStore, StoredResponse};
pub use config::AppConfig;
pub use error::Error;
pub use index::{IndexCache, IndexEntry, IndexSource};
pub use search::{SearchHit, SearchOutcome, SearchSession};
pub use worker::{CacheController, Network};
