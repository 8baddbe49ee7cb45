// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed access to a cluster's Secret API

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{ListParams, Patch, PatchParams, PostParams},
    Api, Client,
};
use tracing::{debug, instrument};

use crate::error::{Result, SyncError};

/// The secret operations the sync engine needs from a cluster
#[async_trait]
pub trait SecretApi: Send + Sync {
    /// List secrets matching `selector` across all namespaces
    async fn list_by_label(&self, selector: &str) -> Result<Vec<Secret>>;

    /// Fails with [`SyncError::SecretNotFound`] when the secret does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret>;

    /// `secret` must not carry a resource version
    async fn create(&self, namespace: &str, secret: &Secret) -> Result<()>;

    async fn merge_patch(&self, namespace: &str, name: &str, patch: &serde_json::Value)
        -> Result<()>;
}

/// [`SecretApi`] backed by a kube client
#[derive(Clone)]
pub struct KubeSecretApi {
    client: Client,
}

impl KubeSecretApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SecretApi for KubeSecretApi {
    #[instrument(skip(self))]
    async fn list_by_label(&self, selector: &str) -> Result<Vec<Secret>> {
        let secrets: Api<Secret> = Api::all(self.client.clone());
        let secret_list = secrets.list(&ListParams::default().labels(selector)).await?;

        debug!("Listed {} secrets", secret_list.items.len());
        Ok(secret_list.items)
    }

    #[instrument(skip(self))]
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret> {
        match self.namespaced(namespace).get(name).await {
            Ok(secret) => Ok(secret),
            Err(kube::Error::Api(err)) if err.code == 404 => Err(SyncError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, secret))]
    async fn create(&self, namespace: &str, secret: &Secret) -> Result<()> {
        if secret.metadata.resource_version.is_some() {
            return Err(SyncError::InvalidSecret(format!(
                "refusing to create {}/{} with a resource version set",
                namespace,
                secret.metadata.name.as_deref().unwrap_or_default()
            )));
        }

        self.namespaced(namespace)
            .create(&PostParams::default(), secret)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, patch))]
    async fn merge_patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<()> {
        self.namespaced(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await?;
        Ok(())
    }
}
