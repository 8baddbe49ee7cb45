// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Follower pass: materialize or refresh every stored manifest in the local cluster.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::Role;
use crate::crypto::PayloadCipher;
use crate::error::{Result, SyncError};
use crate::kubernetes::SecretApi;
use crate::store::{ManifestStore, SecretRecord};
use crate::sync::manifest::{freshness, patch_document, secret_for_create, Freshness};
use crate::sync::{cancellable, Tick, TickStats};

pub struct FollowerTick {
    secrets: Arc<dyn SecretApi>,
    store: Arc<dyn ManifestStore>,
    cipher: PayloadCipher,
}

impl FollowerTick {
    pub fn new(
        secrets: Arc<dyn SecretApi>,
        store: Arc<dyn ManifestStore>,
        cipher: PayloadCipher,
    ) -> Self {
        Self {
            secrets,
            store,
            cipher,
        }
    }

    async fn create_secret(&self, record: &SecretRecord, cancel: &CancellationToken) -> Result<()> {
        info!(
            "New secret {}/{} found! Creating...",
            record.namespace, record.secret_name
        );
        let secret = secret_for_create(record, &self.cipher)?;
        cancellable(cancel, self.secrets.create(&record.namespace, &secret)).await
    }

    async fn patch_secret(&self, record: &SecretRecord, cancel: &CancellationToken) -> Result<()> {
        let patch = patch_document(record, &self.cipher)?;
        cancellable(
            cancel,
            self.secrets
                .merge_patch(&record.namespace, &record.secret_name, &patch),
        )
        .await?;
        info!("Patched {}/{}", record.namespace, record.secret_name);
        Ok(())
    }
}

#[async_trait]
impl Tick for FollowerTick {
    fn role(&self) -> Role {
        Role::Follower
    }

    /// Any failing record ends the tick; records applied before it stay applied.
    #[instrument(skip_all, fields(role = "follower"))]
    async fn tick(&self, cancel: &CancellationToken) -> Result<TickStats> {
        debug!("Ticking as follower...");
        let mut stats = TickStats::default();

        let records = cancellable(cancel, self.store.list_all()).await?;

        for record in &records {
            stats.examined += 1;
            debug!(
                "Checking if secret {}/{} exists",
                record.namespace, record.secret_name
            );

            let existing = match cancellable(
                cancel,
                self.secrets.get(&record.namespace, &record.secret_name),
            )
            .await
            {
                Ok(existing) => existing,
                Err(SyncError::SecretNotFound { .. }) => {
                    self.create_secret(record, cancel).await?;
                    stats.created += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match freshness(&existing, &record.last_updated()) {
                Freshness::UpToDate => {
                    debug!(
                        "Secret {}/{} up to date with datastore",
                        record.namespace, record.secret_name
                    );
                    stats.unchanged += 1;
                    continue;
                }
                Freshness::Stale => info!(
                    "Found an older version of {}/{}, updating",
                    record.namespace, record.secret_name
                ),
                Freshness::Unannotated => info!(
                    "Did not have annotation for {}/{}, replacing secret",
                    record.namespace, record.secret_name
                ),
            }

            self.patch_secret(record, cancel).await?;
            stats.updated += 1;
        }

        Ok(stats)
    }
}
