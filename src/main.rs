// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kube_secret_sync::config::{Config, LogConfig, Role};
use kube_secret_sync::crypto::PayloadCipher;
use kube_secret_sync::driver::{cancel_on_signal, TickDriver};
use kube_secret_sync::kubernetes::{create_client, KubeSecretApi, SecretApi};
use kube_secret_sync::store::PgManifestStore;
use kube_secret_sync::sync::{FollowerTick, LeaderTick, Tick};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&LogConfig::from_env());

    info!("Starting kube-secret-sync");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: role={} tick_interval={:?} in_cluster={}",
        config.role,
        config.tick_interval,
        config.kube_context_path.is_none()
    );

    let cipher = PayloadCipher::new(config.encryption_key.as_bytes())
        .context("ENCRYPTION_KEY is not a valid AES key")?;

    let store = Arc::new(
        PgManifestStore::connect(&config.dsn)
            .await
            .context("Error connecting to DB")?,
    );
    store.migrate().await.context("Error running migrations")?;

    let client = create_client(&config)
        .await
        .context("Error connecting to k8s client")?;
    let secrets: Arc<dyn SecretApi> = Arc::new(KubeSecretApi::new(client));

    let tick: Arc<dyn Tick> = match config.role {
        Role::Leader => Arc::new(LeaderTick::new(secrets, store.clone(), cipher)),
        Role::Follower => Arc::new(FollowerTick::new(secrets, store.clone(), cipher)),
    };
    info!("Running as {}", config.role);

    let driver = TickDriver::new(tick, config.tick_interval).with_timeout(config.tick_timeout);

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone())?;

    if config.local {
        if let Err(e) = driver.run_once(&shutdown).await {
            error!("Tick failed: {}", e);
        }
    } else {
        driver.run_forever(&shutdown).await;
    }

    store.close().await;
    info!("Exiting");
    Ok(())
}

/// JSON lines unless PRETTY=1; `debug` level with DEBUG=1. RUST_LOG wins when set.
fn init_tracing(log: &LogConfig) {
    let default_level = if log.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.pretty {
        builder.init();
    } else {
        builder.json().init();
    }
}

/// Cancel `shutdown` on SIGINT or SIGTERM
fn spawn_signal_handler(shutdown: CancellationToken) -> Result<()> {
    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("Failed to install SIGTERM handler")?;

    let signal = async move {
        #[cfg(unix)]
        let received = tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = terminate.recv() => Ok(()),
        };
        #[cfg(not(unix))]
        let received = tokio::signal::ctrl_c().await;
        received
    };
    tokio::spawn(cancel_on_signal(signal, shutdown));

    Ok(())
}
