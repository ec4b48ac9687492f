//! Client code for karuta.
//!
//! This crate provides the reqwest-based HTTP side of the subsystem: the
//! content index fetcher and the origin-bound network used by the cache
//! controller.

pub mod fetch;
pub mod index;

pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use index::IndexFetcher;
