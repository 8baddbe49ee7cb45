// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Leader pass: seal every labelled source secret and upsert it into the store.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::Role;
use crate::constants::labels;
use crate::crypto::PayloadCipher;
use crate::error::Result;
use crate::kubernetes::SecretApi;
use crate::store::ManifestStore;
use crate::sync::manifest::seal_secret;
use crate::sync::{cancellable, Tick, TickStats};

pub struct LeaderTick {
    secrets: Arc<dyn SecretApi>,
    store: Arc<dyn ManifestStore>,
    cipher: PayloadCipher,
}

impl LeaderTick {
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
}

#[async_trait]
impl Tick for LeaderTick {
    fn role(&self) -> Role {
        Role::Leader
    }

    /// Secrets are processed sequentially in list order. The first failure ends the
    /// tick; rows already upserted stay committed.
    #[instrument(skip_all, fields(role = "leader"))]
    async fn tick(&self, cancel: &CancellationToken) -> Result<TickStats> {
        debug!("Ticking as leader...");
        let mut stats = TickStats::default();

        let secrets = cancellable(cancel, self.secrets.list_by_label(labels::SELECTOR)).await?;
        if secrets.is_empty() {
            debug!("No secrets found to sync");
            return Ok(stats);
        }

        for secret in secrets {
            stats.examined += 1;

            let sealed = seal_secret(secret, &self.cipher)?;
            debug!("Sealed secret {}/{}", sealed.namespace, sealed.name);

            let rows = cancellable(
                cancel,
                self.store.upsert(
                    &sealed.namespace,
                    &sealed.name,
                    &sealed.manifest,
                    &sealed.manifest_hash,
                ),
            )
            .await?;

            if rows > 0 {
                info!("Stored new version of {}/{}", sealed.namespace, sealed.name);
                stats.updated += 1;
            } else {
                debug!("Secret {}/{} unchanged", sealed.namespace, sealed.name);
                stats.unchanged += 1;
            }
        }

        Ok(stats)
    }
}
