//! beacond — Beacon tracker and signaling daemon.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use beacon_core::BeaconConfig;
use beacon_services::{MemoryStore, PeerStateStore, Sweeper};

/// How often lapsed keys are evicted from the in-process store.
const PURGE_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = BeaconConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        BeaconConfig::default()
    });
    tracing::info!(
        config_file = %BeaconConfig::file_path().display(),
        presence_ttl_secs = config.registry.presence_ttl_secs,
        signal_ttl_secs = config.relay.signal_ttl_secs,
        max_peers = config.registry.max_peers,
        turn = config.turn.secret.is_some(),
        "beacond starting"
    );

    let memory = MemoryStore::new();
    let store: Arc<dyn PeerStateStore> = Arc::new(memory.clone());
    let state = beacon_api::ApiState::new(store, &config);

    // ── Shutdown ─────────────────────────────────────────────────────────────

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Background tasks ─────────────────────────────────────────────────────

    let sweeper = Sweeper::new(
        state.registry.clone(),
        config.sweep.interval(),
        config.sweep.max_attempts,
    );
    let sweep_task = tokio::spawn(sweeper.run(shutdown_tx.subscribe()));

    let purge_task = {
        let mut shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PURGE_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown.recv() => return,
                }
                let purged = memory.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "evicted lapsed keys");
                }
            }
        })
    };

    // ── HTTP ─────────────────────────────────────────────────────────────────

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let app = beacon_api::router(state, &config.server.cors_origins);
    let server_task = {
        let mut shutdown = shutdown_tx.subscribe();
        tokio::spawn(beacon_api::serve(listener, app, async move {
            let _ = shutdown.recv().await;
        }))
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = server_task        => tracing::error!("API server exited: {:?}", r),
        r = sweep_task         => tracing::error!("sweep task exited: {:?}", r),
        r = purge_task         => tracing::error!("purge task exited: {:?}", r),
    }

    Ok(())
}
