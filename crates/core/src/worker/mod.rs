//! Offline caching controller modelled on a service worker.
//!
//! This module provides:
//! - Versioned cache names and the shell resource list ([`manifest`])
//! - A pure request classification and strategy table ([`strategy`])
//! - The network seam ([`network`])
//! - Lifecycle states ([`lifecycle`])
//! - Install, activate and fetch routing ([`controller`])
//! - Client messages ([`messages`]), push/sync ([`push`]) and registration
//!   with the update notice ([`registration`])

pub mod controller;
pub mod lifecycle;
pub mod manifest;
pub mod messages;
pub mod network;
pub mod push;
pub mod registration;
pub mod strategy;

pub use controller::{
    ActivateReport, CacheController, CacheSummary, ControllerStatus, FailedAsset, FetchOutcome, InstallReport,
    ResponseSource, ServedResponse,
};
pub use lifecycle::WorkerState;
pub use manifest::{CRITICAL_RESOURCES, CacheKind, CacheNames, OFFLINE_FALLBACK, SHELL_RESOURCES};
pub use messages::{ClientMessage, Clients};
pub use network::{Network, NetworkResponse, ResponseType};
pub use push::Notification;
pub use registration::{Registration, UpdateAction, UpdateNotice};
pub use strategy::{CACHE_BUST_PARAM, Destination, RequestClass, RequestInfo, Strategy};
