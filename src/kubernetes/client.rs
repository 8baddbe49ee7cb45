// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation, in-cluster or from an external kubeconfig

use std::path::Path;

use crate::config::Config;
use crate::error::{Result, SyncError};
use kube::{config::KubeConfigOptions, Client, Config as KConfig};
use tracing::{debug, info, instrument};

/// Create the Kubernetes client for this process.
///
/// Uses the kubeconfig at `KUBE_CONTEXT_PATH` when configured, otherwise the
/// pod's service-account mount.
#[instrument(skip(config))]
pub async fn create_client(config: &Config) -> Result<Client> {
    let client = match &config.kube_context_path {
        Some(path) => {
            debug!("Loading kubeconfig from {}", path.display());
            create_client_from_kubeconfig_path(path).await?
        }
        None => {
            debug!("Loading in-cluster config");
            create_in_cluster_client()?
        }
    };
    info!("Connected to Kubernetes cluster");
    Ok(client)
}

fn create_in_cluster_client() -> Result<Client> {
    let client_config = KConfig::incluster().map_err(|e| {
        SyncError::KubeconfigError(format!("Failed to load in-cluster config: {}", e))
    })?;

    Client::try_from(client_config)
        .map_err(|e| SyncError::KubeconfigError(format!("Failed to create client: {}", e)))
}

async fn create_client_from_kubeconfig_path(path: &Path) -> Result<Client> {
    let kubeconfig = tokio::fs::read_to_string(path).await.map_err(|e| {
        SyncError::KubeconfigError(format!(
            "Failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })?;

    create_client_from_kubeconfig(&kubeconfig).await
}

/// Create a Kubernetes client from a kubeconfig string
async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    use kube::config::Kubeconfig;

    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| SyncError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        KConfig::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| SyncError::KubeconfigError(format!("Failed to create config: {}", e)))?;

    Client::try_from(client_config)
        .map_err(|e| SyncError::KubeconfigError(format!("Failed to create client: {}", e)))
}
