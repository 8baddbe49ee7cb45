// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! PostgreSQL (and CockroachDB) backed manifest store

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use crate::constants::pool;
use crate::error::{Result, SyncError};
use crate::store::{ManifestStore, SecretRecord};

const UPSERT_SECRET: &str = r#"
INSERT INTO kss_secrets (ns, secret_name, manifest, manifest_hash)
VALUES ($1, $2, $3::json, $4)
ON CONFLICT (ns, secret_name)
DO UPDATE
SET manifest = EXCLUDED.manifest,
    updated_at = now(),
    manifest_hash = EXCLUDED.manifest_hash
WHERE kss_secrets.manifest_hash <> EXCLUDED.manifest_hash
"#;

const LIST_ALL_SECRETS: &str = r#"
SELECT ns, secret_name, manifest, manifest_hash, created_at, updated_at
FROM kss_secrets
"#;

const GET_SECRET: &str = r#"
SELECT ns, secret_name, manifest, manifest_hash, created_at, updated_at
FROM kss_secrets
WHERE ns = $1
AND secret_name = $2
"#;

pub struct PgManifestStore {
    pool: PgPool,
}

impl PgManifestStore {
    /// Connect a pool to `dsn`. Connections are acquired per query and returned on every exit path.
    pub async fn connect(dsn: &str) -> Result<Self> {
        debug!("Connecting to datastore...");
        let pool = PgPoolOptions::new()
            .max_connections(pool::MAX_CONNECTIONS)
            .min_connections(pool::MIN_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(pool::ACQUIRE_TIMEOUT_SECS))
            .max_lifetime(Duration::from_secs(pool::MAX_LIFETIME_SECS))
            .idle_timeout(Duration::from_secs(pool::IDLE_TIMEOUT_SECS))
            .connect(dsn)
            .await?;
        debug!("Connected to datastore");

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations, forward only
    pub async fn migrate(&self) -> Result<()> {
        debug!("Migrating up");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Datastore schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ManifestStore for PgManifestStore {
    #[instrument(skip(self, manifest, manifest_hash))]
    async fn upsert(
        &self,
        namespace: &str,
        name: &str,
        manifest: &serde_json::Value,
        manifest_hash: &str,
    ) -> Result<u64> {
        let started = Instant::now();
        let rows = sqlx::query(UPSERT_SECRET)
            .bind(namespace)
            .bind(name)
            .bind(manifest.to_string())
            .bind(manifest_hash)
            .execute(&self.pool)
            .await?
            .rows_affected();

        debug!(
            "Upsert secret {}/{} affected {} rows in {:?}",
            namespace,
            name,
            rows,
            started.elapsed()
        );
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<SecretRecord>> {
        let started = Instant::now();
        let records = sqlx::query_as::<_, SecretRecord>(LIST_ALL_SECRETS)
            .fetch_all(&self.pool)
            .await?;

        debug!("Listed {} secrets in {:?}", records.len(), started.elapsed());
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get(&self, namespace: &str, name: &str) -> Result<SecretRecord> {
        sqlx::query_as::<_, SecretRecord>(GET_SECRET)
            .bind(namespace)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| SyncError::RecordNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}
