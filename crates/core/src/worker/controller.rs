//! The cache controller: install, activate and per-request routing.
//!
//! ### Fetch routing
//! - Documents are network-first. Fresh same-origin 200 responses are stored
//!   in the dynamic cache. Offline, the cached copy is served, then the cached
//!   root document.
//! - Other assets are cache-first. A stylesheet or script hit is refreshed in
//!   the background; a miss is fetched and stored in the static or dynamic
//!   cache depending on its path.
//!
//! Requests are only intercepted once the controller is activated. The
//! controller is itself a [`Network`], so page-side loaders (the content
//! index) can fetch through it.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

use super::lifecycle::WorkerState;
use super::manifest::{CacheKind, CacheNames, OFFLINE_FALLBACK, SHELL_RESOURCES};
use super::messages::{ClientMessage, Clients};
use super::network::{Network, NetworkResponse, ResponseType};
use super::push::{self, Notification};
use super::strategy::{self, Destination, RequestInfo, Strategy};
use crate::Error;
use crate::cache::{CacheDb, StoredResponse};
use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The cached root document standing in for an unavailable page.
    Fallback,
}

/// A response handed back to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedResponse {
    pub source: ResponseSource,
    /// Cache key of the response actually served.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl ServedResponse {
    fn live(key: String, resp: NetworkResponse) -> Self {
        Self {
            source: ResponseSource::Network,
            url: key,
            status: resp.status,
            content_type: resp.content_type,
            body: resp.body,
        }
    }

    fn cached(source: ResponseSource, stored: StoredResponse) -> Self {
        Self {
            source,
            url: stored.url,
            status: stored.status,
            content_type: stored.content_type,
            body: Bytes::from(stored.body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the request goes to the network untouched.
    Passthrough,
    Served(ServedResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FailedAsset {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<FailedAsset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheSummary {
    pub name: String,
    pub entries: usize,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ControllerStatus {
    pub state: WorkerState,
    pub static_cache: String,
    pub dynamic_cache: String,
    pub caches: Vec<CacheSummary>,
    pub clients: usize,
}

/// State reachable from background tasks.
struct Shared {
    db: CacheDb,
    network: Arc<dyn Network>,
    names: CacheNames,
    clients: Clients,
}

impl Shared {
    /// Write `resp` under `key`. Failures are logged, never returned.
    async fn store(&self, kind: CacheKind, key: &str, resp: &NetworkResponse) {
        let cache = self.names.get(kind);
        if let Err(e) = self.db.put_response(cache, &resp.to_stored(key)).await {
            tracing::warn!(cache, url = key, error = %e, "failed to store response");
        }
    }

    async fn revalidate(&self, req: RequestInfo) {
        let key = req.cache_key();
        match self.network.fetch(&req).await {
            Ok(resp) if resp.status == 200 => {
                self.store(strategy::revalidation_cache(&key), &key, &resp).await;
                tracing::debug!(url = %key, "background update");
                self.clients.post(ClientMessage::CacheUpdated { url: req.url.to_string() });
            }
            Ok(resp) => tracing::trace!(url = %key, status = resp.status, "background update skipped"),
            Err(e) => tracing::trace!(url = %key, error = %e, "background update failed"),
        }
    }
}

pub struct CacheController {
    shared: Arc<Shared>,
    origin: Url,
    icon: String,
    state: Mutex<WorkerState>,
    background: Mutex<JoinSet<()>>,
}

impl CacheController {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, origin: Url, names: CacheNames) -> Self {
        Self {
            shared: Arc::new(Shared { db, network, names, clients: Clients::default() }),
            origin,
            icon: crate::config::DEFAULT_COVER.to_string(),
            state: Mutex::new(WorkerState::Parsed),
            background: Mutex::new(JoinSet::new()),
        }
    }

    pub fn from_config(db: CacheDb, network: Arc<dyn Network>, config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.site_url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.site_url)))?;
        let names = CacheNames::new(&config.cache_prefix, &config.cache_version);
        let mut controller = Self::new(db, network, origin, names);
        controller.icon = config.cover_fallback().to_string();
        Ok(controller)
    }

    pub fn names(&self) -> &CacheNames {
        &self.shared.names
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn clients(&self) -> &Clients {
        &self.shared.clients
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.lock().await
    }

    /// A same-origin GET for `path`.
    pub fn request(&self, path: &str) -> Result<RequestInfo, Error> {
        let url = self.origin.join(path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
        Ok(RequestInfo::get(url))
    }

    /// Pre-cache the shell resources into the static cache.
    ///
    /// Each resource is fetched and stored on its own; failures are collected
    /// in the report and do not fail the install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.state.lock().await.advance(WorkerState::Installing)?;

        let cache = &self.shared.names.static_cache;
        self.shared.db.open_cache(cache).await?;
        tracing::info!(cache = %cache, count = SHELL_RESOURCES.len(), "caching static files");

        let mut report = InstallReport::default();
        for path in SHELL_RESOURCES {
            match self.cache_shell_resource(path).await {
                Ok(()) => report.cached.push(path.to_string()),
                Err(e) => {
                    tracing::warn!(url = %path, error = %e, "failed to cache shell resource");
                    report.failed.push(FailedAsset { url: path.to_string(), reason: e.to_string() });
                }
            }
        }

        self.state.lock().await.advance(WorkerState::Installed)?;
        Ok(report)
    }

    async fn cache_shell_resource(&self, path: &str) -> Result<(), Error> {
        let mut req = self.request(path)?;
        if path.ends_with('/') {
            req = req.with_destination(Destination::Document);
        }
        let resp = self.shared.network.fetch(&req).await?;
        if !(200..300).contains(&resp.status) {
            return Err(Error::HttpError(format!("status {}", resp.status)));
        }
        self.shared
            .db
            .put_response(&self.shared.names.static_cache, &resp.to_stored(&req.cache_key()))
            .await
    }

    /// Delete every cache that is not current, then take control of clients.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.state.lock().await.advance(WorkerState::Activating)?;

        let mut report = ActivateReport::default();
        for name in self.shared.db.cache_names().await? {
            if self.shared.names.is_current(&name) {
                continue;
            }
            tracing::info!(cache = %name, "deleting old cache");
            if self.shared.db.delete_cache(&name).await? {
                report.deleted.push(name);
            }
        }

        self.state.lock().await.advance(WorkerState::Activated)?;
        tracing::info!(clients = self.shared.clients.count(), "claimed clients");
        Ok(report)
    }

    /// Route one intercepted request.
    pub async fn handle_fetch(&self, req: RequestInfo) -> Result<FetchOutcome, Error> {
        if self.state().await != WorkerState::Activated {
            return Ok(FetchOutcome::Passthrough);
        }

        match strategy::strategy_for(strategy::classify(&req, &self.origin)) {
            Strategy::Passthrough => Ok(FetchOutcome::Passthrough),
            Strategy::NetworkFirst => self.network_first(&req).await.map(FetchOutcome::Served),
            Strategy::CacheFirstRevalidate => self.cache_first(req).await.map(FetchOutcome::Served),
        }
    }

    async fn network_first(&self, req: &RequestInfo) -> Result<ServedResponse, Error> {
        let key = req.cache_key();
        match self.shared.network.fetch(req).await {
            Ok(resp) => {
                if resp.is_cacheable() {
                    self.shared.store(CacheKind::Dynamic, &key, &resp).await;
                    tracing::debug!(url = %key, "updated HTML cache");
                }
                Ok(ServedResponse::live(key, resp))
            }
            Err(e) => {
                tracing::info!(url = %key, error = %e, "network failed, serving HTML from cache");
                if let Some(hit) = self.shared.db.match_any(&key).await? {
                    return Ok(ServedResponse::cached(ResponseSource::Cache, hit));
                }
                self.offline_fallback(&key).await
            }
        }
    }

    async fn cache_first(&self, req: RequestInfo) -> Result<ServedResponse, Error> {
        let key = req.cache_key();
        if let Some(hit) = self.shared.db.match_any(&key).await? {
            tracing::debug!(url = %key, "serving asset from cache");
            if strategy::should_revalidate(&key) {
                self.spawn_revalidation(req).await;
            }
            return Ok(ServedResponse::cached(ResponseSource::Cache, hit));
        }

        match self.shared.network.fetch(&req).await {
            Ok(resp) => {
                if resp.is_cacheable() {
                    self.shared.store(strategy::miss_cache(&key), &key, &resp).await;
                    if strategy::is_critical(&key) {
                        self.shared.clients.post(ClientMessage::CriticalResourceCached { url: req.url.to_string() });
                    }
                }
                Ok(ServedResponse::live(key, resp))
            }
            Err(e) if req.destination == Destination::Document => {
                tracing::debug!(url = %key, error = %e, "asset fetch failed, serving root document");
                self.offline_fallback(&key).await
            }
            Err(e) => Err(Error::NoResponse(format!("{key}: {e}"))),
        }
    }

    async fn offline_fallback(&self, key: &str) -> Result<ServedResponse, Error> {
        match self.shared.db.match_any(OFFLINE_FALLBACK).await? {
            Some(root) => Ok(ServedResponse::cached(ResponseSource::Fallback, root)),
            None => Err(Error::NoResponse(format!("{key}: offline and no cached document"))),
        }
    }

    async fn spawn_revalidation(&self, req: RequestInfo) {
        let shared = Arc::clone(&self.shared);
        let mut tasks = self.background.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move { shared.revalidate(req).await });
    }

    /// Wait for every background task spawned so far.
    pub async fn settle(&self) {
        let mut tasks = std::mem::take(&mut *self.background.lock().await);
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "background task failed");
            }
        }
    }

    pub fn handle_push(&self, data: Option<&[u8]>) -> Result<Option<Notification>, Error> {
        push::handle_push(data, &self.icon)
    }

    pub fn handle_sync(&self, tag: &str) -> bool {
        push::handle_sync(tag)
    }

    pub async fn status(&self) -> Result<ControllerStatus, Error> {
        let db = &self.shared.db;
        let mut caches = Vec::new();
        for name in db.cache_names().await? {
            let entries = db.cache_keys(&name).await?.len();
            caches.push(CacheSummary { current: self.shared.names.is_current(&name), name, entries });
        }
        Ok(ControllerStatus {
            state: self.state().await,
            static_cache: self.shared.names.static_cache.clone(),
            dynamic_cache: self.shared.names.dynamic_cache.clone(),
            caches,
            clients: self.shared.clients.count(),
        })
    }
}

/// Page-side fetches, routed the way a controlled page's `fetch()` is: through
/// the controller once it is active, straight to the network otherwise.
#[async_trait]
impl Network for CacheController {
    async fn fetch(&self, req: &RequestInfo) -> Result<NetworkResponse, Error> {
        match self.handle_fetch(req.clone()).await? {
            FetchOutcome::Passthrough => self.shared.network.fetch(req).await,
            FetchOutcome::Served(resp) => Ok(NetworkResponse {
                status: resp.status,
                response_type: ResponseType::Basic,
                content_type: resp.content_type,
                body: resp.body,
            }),
        }
    }
}
