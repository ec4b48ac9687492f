//! karuta server entry point.
//!
//! Boots the site search session and the offline cache controller, then
//! serves both as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use karuta_client::fetch::site_origin;
use karuta_client::{FetchClient, FetchConfig, IndexFetcher};
use karuta_core::search::{SearchHistory, SearchSession, SearchSettings};
use karuta_core::worker::{CacheController, Registration, WorkerState};
use karuta_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        site = %config.site_url,
        db = %config.db_path.display(),
        "Starting karuta server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let origin = site_origin(&config.site_url)?;
    let client = Arc::new(FetchClient::new(FetchConfig::from(&config))?);

    let controller = Arc::new(CacheController::from_config(db.clone(), client, &config)?);
    let report = controller.install().await?;
    tracing::info!(cached = report.cached.len(), failed = report.failed.len(), "shell resources installed");
    let report = controller.activate().await?;
    tracing::info!(deleted = ?report.deleted, "cache controller active");

    let history = SearchHistory::load(Arc::new(db), config.history_capacity, config.min_query_len).await;
    let fetcher = IndexFetcher::new(controller.clone(), origin);
    let session = Arc::new(SearchSession::new(SearchSettings::from(&config), Arc::new(fetcher), history));

    let registration = Arc::new(Registration::from_config(&config));
    tracing::info!(scope = registration.scope(), "registered cache controller");
    let checks = registration.spawn_update_checks({
        let session = Arc::clone(&session);
        let registration = Arc::clone(&registration);
        move || {
            let session = Arc::clone(&session);
            let registration = Arc::clone(&registration);
            async move {
                if session.index_has_update().await {
                    registration.on_worker_state(WorkerState::Installed, true).await;
                }
            }
        }
    });

    let handler = handler::KarutaServer::new(session, controller, registration);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    checks.abort();

    Ok(())
}
