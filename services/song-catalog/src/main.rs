//!
//! src/main.rs  Andrew Belles  Oct 19th, 2026
//!
//! Wires configuration, logging, storage, the provider client and the
//! http routes together and runs the catalog until ctrl-c
//!
//!

mod api;
mod config;
mod docs;
mod fetch;
mod listing;
mod lyrics;
mod persistent;
mod resolver;
mod types;
mod logging;

mod errors;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::errors::CatalogError;
use crate::persistent::SongStore;

#[tokio::main]
async fn main() -> Result<(), CatalogError> {
    let cfgs    = config::load_config()?;
    let _logger = logging::init_logging(&cfgs.logging)?;

    tracing::info!(
        service="song-catalog",
        version=%env!("CARGO_PKG_VERSION"),
        "starting"
    );

    let store: Arc<dyn SongStore> = Arc::new(
        persistent::Persistent::init(&cfgs.persistence).await?
    );
    let provider = Arc::new(fetch::ProviderClient::new(&cfgs.http, &cfgs.provider)?);
    let resolver = Arc::new(resolver::Resolver::new(store.clone(), provider));
    let state    = api::AppState { resolver, store };

    let addr     = cfgs.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        provider = %cfgs.provider.base_url,
        timeout_ms = cfgs.http.timeout.as_millis() as u64,
        "server.listening"
    );

    let shutdown = CancellationToken::new();
    let trigger  = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(msg = "shutting catalog down", "server.signal");
            trigger.cancel();
        }
    });

    api::serve(listener, state, shutdown).await?;
    tracing::info!("server.stop");

    Ok(())
}
