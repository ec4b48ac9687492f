//! Cache controller MCP tools.
//!
//! This module exposes fetch routing through the offline cache controller
//! and a summary of its caches.

pub mod fetch;
pub mod status;

pub use fetch::{CacheFetchParams, fetch_impl};
pub use status::status_impl;
